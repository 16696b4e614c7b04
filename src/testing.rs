//! Throwaway stand-in for the text-generation service, used by tests.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
  extract::State,
  http::StatusCode,
  response::{IntoResponse, Response},
  routing::{get, post},
  Json, Router,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;

#[derive(Clone, Debug)]
pub enum FakeReply {
  /// 200 with `{"response": text}`.
  Text(String),
  /// Non-success status with an empty body.
  Status(u16),
}

struct Fake {
  by_model: HashMap<String, FakeReply>,
  tags: Vec<String>,
}

/// Serve `/api/generate` (reply chosen by requested model; unknown models get 404)
/// and `/api/tags` on an ephemeral port. Returns the base URL.
pub async fn spawn_fake_ollama(replies: Vec<(&str, FakeReply)>, tags: Vec<&str>) -> String {
  let fake = Arc::new(Fake {
    by_model: replies.into_iter().map(|(m, r)| (m.to_string(), r)).collect(),
    tags: tags.into_iter().map(str::to_string).collect(),
  });

  let app = Router::new()
    .route("/api/generate", post(generate))
    .route("/api/tags", get(list_tags))
    .with_state(fake);

  let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind fake ollama");
  let addr = listener.local_addr().expect("local addr");
  tokio::spawn(async move {
    let _ = axum::serve(listener, app).await;
  });
  format!("http://{addr}")
}

async fn generate(State(fake): State<Arc<Fake>>, Json(body): Json<Value>) -> Response {
  let model = body.get("model").and_then(Value::as_str).unwrap_or_default();
  match fake.by_model.get(model) {
    Some(FakeReply::Text(t)) => Json(json!({ "model": model, "response": t, "done": true })).into_response(),
    Some(FakeReply::Status(code)) => StatusCode::from_u16(*code)
      .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
      .into_response(),
    None => StatusCode::NOT_FOUND.into_response(),
  }
}

async fn list_tags(State(fake): State<Arc<Fake>>) -> Json<Value> {
  let models: Vec<Value> = fake.tags.iter().map(|n| json!({ "name": n })).collect();
  Json(json!({ "models": models }))
}

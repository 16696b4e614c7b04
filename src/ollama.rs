//! Minimal client for an Ollama-style text-generation service.
//!
//! Two endpoints are used: `POST /api/generate` (non-streaming) and `GET /api/tags`.
//! Calls are instrumented and log model names, latencies and reply sizes, never
//! prompt or reply contents.
//!
//! Fallback is an ordered list of `Tier`s tried until one yields a reply the
//! caller accepts. Every rejected tier is logged with its reason.

use std::time::{Duration, Instant};

use reqwest::header::USER_AGENT;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::extract::extract_json;
use crate::util::trunc_for_log;

pub const TAGS_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Debug, Error)]
pub enum LlmError {
  #[error("transport error: {0}")]
  Transport(String),
  #[error("HTTP {status}: {body}")]
  Status { status: u16, body: String },
  #[error("reply has no 'response' text")]
  MissingResponse,
  #[error("malformed reply: {0}")]
  Malformed(String),
}

/// One step of a fallback chain: which model to ask and how long to wait.
#[derive(Clone, Debug, PartialEq)]
pub struct Tier {
  pub model: String,
  pub timeout: Duration,
}

impl Tier {
  pub fn new(model: &str, timeout: Duration) -> Self {
    Self { model: model.to_string(), timeout }
  }
}

#[derive(Clone)]
pub struct Ollama {
  pub client: reqwest::Client,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
  model: &'a str,
  prompt: &'a str,
  stream: bool,
}

#[derive(Deserialize)]
struct GenerateResponse {
  #[serde(default)]
  response: Option<String>,
}

impl Default for Ollama {
  fn default() -> Self {
    Self::new()
  }
}

impl Ollama {
  /// Timeouts are set per request, so the shared client carries none.
  pub fn new() -> Self {
    let client = reqwest::Client::builder()
      .build()
      .unwrap_or_else(|_| reqwest::Client::new());
    Self { client }
  }

  /// Single non-streaming generation call. Returns the raw `response` text.
  #[instrument(level = "info", skip(self, prompt), fields(%model, prompt_len = prompt.len(), timeout_s = timeout.as_secs()))]
  pub async fn generate(
    &self,
    base_url: &str,
    model: &str,
    prompt: &str,
    timeout: Duration,
  ) -> Result<String, LlmError> {
    let url = format!("{}/api/generate", base_url.trim_end_matches('/'));
    let req = GenerateRequest { model, prompt, stream: false };

    let start = Instant::now();
    let res = self.client.post(&url)
      .header(USER_AGENT, "email-trainer-backend/0.1")
      .timeout(timeout)
      .json(&req).send().await
      .map_err(|e| LlmError::Transport(e.to_string()))?;

    if !res.status().is_success() {
      let status = res.status().as_u16();
      let body = res.text().await.unwrap_or_default();
      return Err(LlmError::Status { status, body: trunc_for_log(&body, 200) });
    }

    let body: GenerateResponse = res.json().await.map_err(|e| LlmError::Malformed(e.to_string()))?;
    let text = body.response.ok_or(LlmError::MissingResponse)?;
    info!(elapsed = ?start.elapsed(), reply_len = text.len(), "Model reply received");
    Ok(text)
  }

  /// Installed model names. Any failure yields an empty list.
  #[instrument(level = "info", skip(self))]
  pub async fn list_models(&self, base_url: &str) -> Vec<String> {
    let url = format!("{}/api/tags", base_url.trim_end_matches('/'));
    let res = match self.client.get(&url).timeout(TAGS_TIMEOUT).send().await {
      Ok(r) if r.status().is_success() => r,
      Ok(r) => {
        warn!(target: "email_trainer", status = %r.status(), "Model listing refused");
        return Vec::new();
      }
      Err(e) => {
        warn!(target: "email_trainer", error = %e, "Model listing unreachable");
        return Vec::new();
      }
    };

    match res.json::<Value>().await {
      Ok(v) => model_names(&v),
      Err(e) => {
        warn!(target: "email_trainer", error = %e, "Model listing not JSON");
        Vec::new()
      }
    }
  }

  /// Walk `tiers` in order and return the first reply that `accept` turns into a
  /// value, along with the model that produced it. `None` means every tier failed.
  #[instrument(level = "info", skip(self, prompt, tiers, accept), fields(%purpose, tiers = tiers.len()))]
  pub async fn first_accepted<T, F>(
    &self,
    base_url: &str,
    tiers: &[Tier],
    prompt: &str,
    purpose: &'static str,
    accept: F,
  ) -> Option<(T, String)>
  where
    F: Fn(Map<String, Value>) -> Result<T, LlmError>,
  {
    for (idx, tier) in tiers.iter().enumerate() {
      let outcome = match self.generate(base_url, &tier.model, prompt, tier.timeout).await {
        Ok(text) => {
          let map = extract_json(&text);
          if map.is_empty() {
            Err(LlmError::Malformed("no JSON object in reply".into()))
          } else {
            accept(map)
          }
        }
        Err(e) => Err(e),
      };

      match outcome {
        Ok(v) => {
          info!(target: "email_trainer", %purpose, tier = idx, model = %tier.model, "Tier succeeded");
          return Some((v, tier.model.clone()));
        }
        Err(e) => {
          warn!(target: "email_trainer", %purpose, tier = idx, model = %tier.model, error = %e, "Tier failed; falling through");
        }
      }
    }
    None
  }
}

fn model_names(v: &Value) -> Vec<String> {
  let list = v.get("models")
    .and_then(Value::as_array)
    .or_else(|| v.get("data").and_then(Value::as_array));

  list.map(|models| {
    models.iter()
      .filter_map(|m| {
        ["name", "model", "tag"].iter()
          .find_map(|k| m.get(*k).and_then(Value::as_str))
          .filter(|s| !s.is_empty())
          .map(str::to_string)
      })
      .collect()
  })
  .unwrap_or_default()
}

/// Preference order: gemma3:1b, llama3.2:3b, any `:1b`, any `:3b`, else none.
pub fn select_preferred_model(names: &[String]) -> Option<String> {
  for exact in ["gemma3:1b", "llama3.2:3b"] {
    if names.iter().any(|n| n == exact) {
      return Some(exact.to_string());
    }
  }
  for suffix in [":1b", ":3b"] {
    if let Some(n) = names.iter().find(|n| n.ends_with(suffix)) {
      return Some(n.clone());
    }
  }
  None
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::testing::{spawn_fake_ollama, FakeReply};
  use serde_json::json;

  fn names(v: &[&str]) -> Vec<String> {
    v.iter().map(|s| s.to_string()).collect()
  }

  #[test]
  fn exact_gemma_wins_over_everything() {
    let n = names(&["mistral:7b", "llama3.2:3b", "gemma3:1b"]);
    assert_eq!(select_preferred_model(&n).as_deref(), Some("gemma3:1b"));
  }

  #[test]
  fn exact_llama_beats_generic_one_b() {
    let n = names(&["qwen:1b", "llama3.2:3b"]);
    assert_eq!(select_preferred_model(&n).as_deref(), Some("llama3.2:3b"));
  }

  #[test]
  fn generic_suffixes_in_order() {
    assert_eq!(select_preferred_model(&names(&["phi:3b", "qwen:1b"])).as_deref(), Some("qwen:1b"));
    assert_eq!(select_preferred_model(&names(&["phi:3b", "mistral:7b"])).as_deref(), Some("phi:3b"));
    assert_eq!(select_preferred_model(&names(&["mistral:7b"])), None);
  }

  #[test]
  fn model_names_reads_any_name_field() {
    let v = json!({"models": [{"name": "a:1b"}, {"model": "b:3b"}, {"tag": "c"}, {"size": 1}]});
    assert_eq!(model_names(&v), names(&["a:1b", "b:3b", "c"]));
    let v = json!({"data": [{"name": "d"}]});
    assert_eq!(model_names(&v), names(&["d"]));
    assert!(model_names(&json!({"nothing": true})).is_empty());
  }

  #[tokio::test]
  async fn list_models_unreachable_is_empty() {
    let client = Ollama::new();
    assert!(client.list_models("http://127.0.0.1:9").await.is_empty());
  }

  #[tokio::test]
  async fn first_accepted_falls_through_to_second_tier() {
    let base = spawn_fake_ollama(vec![
      ("big", FakeReply::Status(500)),
      ("small", FakeReply::Text("sure! {\"ok\": true}".into())),
    ], vec![]).await;

    let tiers = vec![Tier::new("big", Duration::from_secs(2)), Tier::new("small", Duration::from_secs(2))];
    let got = Ollama::new()
      .first_accepted(&base, &tiers, "prompt", "test", |m| Ok(m.get("ok").cloned()))
      .await;

    let (value, model) = got.expect("second tier should answer");
    assert_eq!(model, "small");
    assert_eq!(value, Some(json!(true)));
  }

  #[tokio::test]
  async fn rejected_replies_exhaust_all_tiers() {
    let base = spawn_fake_ollama(vec![
      ("big", FakeReply::Text("no json here".into())),
      ("small", FakeReply::Text("{\"partial\": 1}".into())),
    ], vec![]).await;

    let tiers = vec![Tier::new("big", Duration::from_secs(2)), Tier::new("small", Duration::from_secs(2))];
    let got: Option<((), String)> = Ollama::new()
      .first_accepted(&base, &tiers, "prompt", "test", |m| {
        if m.contains_key("required") { Ok(()) } else { Err(LlmError::Malformed("missing 'required'".into())) }
      })
      .await;
    assert!(got.is_none());
  }

  #[tokio::test]
  async fn list_models_against_fake_service() {
    let base = spawn_fake_ollama(vec![], vec!["gemma3:1b", "llama3.1"]).await;
    let listed = Ollama::new().list_models(&base).await;
    assert_eq!(listed, names(&["gemma3:1b", "llama3.1"]));
  }
}

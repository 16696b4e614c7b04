//! Email Trainer · practice backend
//!
//! - Axum HTTP API for scenarios, scored attempts, analytics, and settings
//! - Local Ollama models with tiered fallback to a built-in mock
//! - Static SPA fallback (./static/index.html)
//!
//! Important env variables:
//!   PORT               : u16 (default 3000)
//!   OLLAMA_BASE_URL    : default "http://localhost:11434"
//!   LLM_MODEL_NAME     : primary model (default "llama3.1")
//!   OLLAMA_SMALL_MODEL : fallback model (default "llama3.2:3b")
//!   USE_MOCK_LLM       : "1" to skip remote calls entirely
//!   SETTINGS_PATH      : persisted settings file (default "./settings.toml")
//!   AUTODETECT_MODEL   : "0" disables model autodetection at startup
//!   AGENT_CONFIG_PATH  : path to TOML with prompt templates
//!   LOG_LEVEL          : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT         : "pretty" (default) or "json"

mod achievements;
mod analytics;
mod config;
mod domain;
mod error;
mod evaluation;
mod export;
mod extract;
mod logic;
mod ollama;
mod presets;
mod protocol;
mod routes;
mod scenarios;
mod settings;
mod state;
mod store;
mod telemetry;
#[cfg(test)]
mod testing;
mod util;

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::config::ProcessConfig;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  telemetry::init_tracing();

  let config = ProcessConfig::from_env();
  let port = config.port;
  let autodetect = config.autodetect_model;

  // Shared application state (store, persisted settings, model client, prompts).
  let state = Arc::new(AppState::build(config).await?);

  if autodetect {
    match logic::autodetect_model_preference(&state).await {
      Ok(out) => info!(target: "email_trainer", selected = ?out.selected, "Startup model autodetect finished"),
      Err(e) => warn!(target: "email_trainer", error = %e, "Startup model autodetect failed"),
    }
  }

  let app = build_router(state.clone());

  let addr = SocketAddr::from(([0, 0, 0, 0], port));
  let listener = TcpListener::bind(addr).await?;
  info!(target: "email_trainer", %addr, "HTTP server listening");
  axum::serve(listener, app).await?;
  Ok(())
}

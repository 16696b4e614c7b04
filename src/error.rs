use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

use crate::settings::SettingsError;

/// Errors surfaced to HTTP callers. Model failures never reach this type;
/// they are absorbed by the fallback tiers.
#[derive(Debug, Error)]
pub enum AppError {
  #[error("{0}")]
  NotFound(String),
  #[error("validation error: {0}")]
  Validation(String),
  #[error("settings error: {0}")]
  Settings(#[from] SettingsError),
  #[error("export error: {0}")]
  Export(String),
}

impl AppError {
  pub fn not_found(what: &str, id: &str) -> Self {
    AppError::NotFound(format!("{what} not found: {id}"))
  }
}

impl IntoResponse for AppError {
  fn into_response(self) -> Response {
    let status = match &self {
      AppError::NotFound(_) => StatusCode::NOT_FOUND,
      AppError::Validation(_) => StatusCode::BAD_REQUEST,
      AppError::Settings(e) if e.is_client_error() => StatusCode::BAD_REQUEST,
      AppError::Settings(_) | AppError::Export(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let body = Json(json!({ "error": self.to_string() }));
    (status, body).into_response()
  }
}

impl From<validator::ValidationErrors> for AppError {
  fn from(value: validator::ValidationErrors) -> Self {
    Self::Validation(value.to_string())
  }
}

impl From<csv::Error> for AppError {
  fn from(value: csv::Error) -> Self {
    Self::Export(value.to_string())
  }
}

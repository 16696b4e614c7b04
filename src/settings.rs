//! Persisted key/value settings overlaid on the process defaults.
//!
//! `SettingsStore` is loaded once at startup and owned by `AppState`. Writes are
//! validated, flushed to the settings file, then applied to the in-memory
//! effective config. Callers take a `RuntimeConfig` snapshot per request.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{info, instrument, warn};

use crate::config::ProcessConfig;
use crate::domain::RubricWeights;

pub const KEY_MODEL_NAME: &str = "LLM_MODEL_NAME";
pub const KEY_BASE_URL: &str = "OLLAMA_BASE_URL";
pub const KEY_RUBRIC_WEIGHTS: &str = "RUBRIC_WEIGHTS";
pub const KEY_SMALL_MODEL: &str = "OLLAMA_SMALL_MODEL";

#[derive(Debug, Error)]
pub enum SettingsError {
  #[error("failed to access settings file {path}: {source}")]
  Io {
    path: String,
    #[source]
    source: std::io::Error,
  },
  #[error("failed to decode settings file: {0}")]
  Decode(#[from] toml::de::Error),
  #[error("failed to encode settings: {0}")]
  Encode(#[from] toml::ser::Error),
  #[error("unknown setting key '{0}'")]
  UnknownKey(String),
  #[error("weight for {criterion} must be within [0, 1], got {value}")]
  InvalidWeight { criterion: &'static str, value: f64 },
  #[error("invalid value for {key}: {reason}")]
  InvalidValue { key: String, reason: String },
}

impl SettingsError {
  /// True when the caller supplied bad input rather than the store failing.
  pub fn is_client_error(&self) -> bool {
    matches!(
      self,
      SettingsError::UnknownKey(_)
        | SettingsError::InvalidWeight { .. }
        | SettingsError::InvalidValue { .. }
    )
  }
}

/// One persisted override.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Setting {
  pub key: String,
  pub value: String,
  pub updated_at: DateTime<Utc>,
}

/// Effective configuration handed to the generator and evaluator.
#[derive(Clone, Debug, PartialEq)]
pub struct RuntimeConfig {
  pub base_url: String,
  pub model_name: String,
  pub small_model: String,
  pub rubric_weights: RubricWeights,
  pub use_mock: bool,
}

impl From<&ProcessConfig> for RuntimeConfig {
  fn from(p: &ProcessConfig) -> Self {
    Self {
      base_url: p.base_url.clone(),
      model_name: p.model_name.clone(),
      small_model: p.small_model.clone(),
      rubric_weights: p.rubric_weights,
      use_mock: p.use_mock,
    }
  }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct SettingsFile {
  #[serde(default)]
  settings: Vec<Setting>,
}

struct Inner {
  rows: BTreeMap<String, Setting>,
  effective: RuntimeConfig,
}

pub struct SettingsStore {
  path: Option<PathBuf>,
  inner: RwLock<Inner>,
}

impl SettingsStore {
  /// Store without a backing file; writes only live in memory.
  pub fn in_memory(defaults: &ProcessConfig) -> Self {
    Self {
      path: None,
      inner: RwLock::new(Inner { rows: BTreeMap::new(), effective: defaults.into() }),
    }
  }

  /// Read persisted settings from `path` and overlay them on `defaults`.
  /// A missing file is an empty store; rows that fail validation are skipped.
  #[instrument(level = "info", skip(defaults))]
  pub async fn load(defaults: &ProcessConfig, path: Option<PathBuf>) -> Result<Self, SettingsError> {
    let mut effective: RuntimeConfig = defaults.into();
    let mut rows = BTreeMap::new();

    if let Some(p) = &path {
      let file = match tokio::fs::read_to_string(p).await {
        Ok(s) => toml::from_str::<SettingsFile>(&s)?,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => SettingsFile::default(),
        Err(e) => return Err(SettingsError::Io { path: p.display().to_string(), source: e }),
      };

      for row in file.settings {
        match apply(&mut effective, &row.key, &row.value) {
          Ok(()) => {
            rows.insert(row.key.clone(), row);
          }
          Err(e) => {
            warn!(target: "settings", key = %row.key, error = %e, "Ignoring persisted setting");
          }
        }
      }
      info!(target: "settings", path = %p.display(), count = rows.len(), "Loaded persisted settings");
    }

    Ok(Self { path, inner: RwLock::new(Inner { rows, effective }) })
  }

  pub async fn snapshot(&self) -> RuntimeConfig {
    self.inner.read().await.effective.clone()
  }

  pub async fn get(&self, key: &str) -> Option<Setting> {
    self.inner.read().await.rows.get(key).cloned()
  }

  pub async fn all(&self) -> Vec<Setting> {
    self.inner.read().await.rows.values().cloned().collect()
  }

  /// Validate, persist, and apply one setting. The file is written before the
  /// in-memory config changes, so a failed write leaves both untouched.
  pub async fn set(&self, key: &str, value: &str) -> Result<Setting, SettingsError> {
    let mut rows = self.set_many(&[(key, value)]).await?;
    Ok(rows.remove(0))
  }

  /// Apply several settings as one change. Every pair is validated before the
  /// file is written once, so one bad value rejects the whole batch.
  #[instrument(level = "info", skip(self, pairs), fields(count = pairs.len()))]
  pub async fn set_many(&self, pairs: &[(&str, &str)]) -> Result<Vec<Setting>, SettingsError> {
    if pairs.is_empty() {
      return Ok(Vec::new());
    }
    let mut inner = self.inner.write().await;

    let mut effective = inner.effective.clone();
    for (key, value) in pairs {
      apply(&mut effective, key, value)?;
    }

    let now = Utc::now();
    let mut rows = inner.rows.clone();
    let written: Vec<Setting> = pairs
      .iter()
      .map(|(key, value)| Setting { key: key.to_string(), value: value.to_string(), updated_at: now })
      .collect();
    for row in &written {
      rows.insert(row.key.clone(), row.clone());
    }

    if let Some(p) = &self.path {
      let file = SettingsFile { settings: rows.values().cloned().collect() };
      let text = toml::to_string(&file)?;
      tokio::fs::write(p, text)
        .await
        .map_err(|e| SettingsError::Io { path: p.display().to_string(), source: e })?;
    }

    inner.rows = rows;
    inner.effective = effective;
    for row in &written {
      info!(target: "settings", key = %row.key, "Setting updated");
    }
    Ok(written)
  }

  pub async fn set_weights(&self, weights: &RubricWeights) -> Result<Setting, SettingsError> {
    self.set(KEY_RUBRIC_WEIGHTS, &weights_value(weights)?).await
  }

  /// Runtime-only switch between mock and remote scoring; not persisted.
  pub async fn set_use_mock(&self, use_mock: bool) {
    self.inner.write().await.effective.use_mock = use_mock;
    info!(target: "settings", use_mock, "Mock mode toggled");
  }
}

/// Persisted form of `RUBRIC_WEIGHTS`.
pub fn weights_value(weights: &RubricWeights) -> Result<String, SettingsError> {
  serde_json::to_string(weights)
    .map_err(|e| SettingsError::InvalidValue { key: KEY_RUBRIC_WEIGHTS.into(), reason: e.to_string() })
}

fn apply(cfg: &mut RuntimeConfig, key: &str, value: &str) -> Result<(), SettingsError> {
  let non_empty = |v: &str| -> Result<String, SettingsError> {
    let v = v.trim();
    if v.is_empty() {
      Err(SettingsError::InvalidValue { key: key.to_string(), reason: "must not be empty".into() })
    } else {
      Ok(v.to_string())
    }
  };

  match key {
    KEY_MODEL_NAME => cfg.model_name = non_empty(value)?,
    KEY_SMALL_MODEL => cfg.small_model = non_empty(value)?,
    KEY_BASE_URL => {
      let url = non_empty(value)?;
      if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(SettingsError::InvalidValue {
          key: key.to_string(),
          reason: "must start with http:// or https://".into(),
        });
      }
      cfg.base_url = url.trim_end_matches('/').to_string();
    }
    KEY_RUBRIC_WEIGHTS => {
      let weights: RubricWeights = serde_json::from_str(value).map_err(|e| SettingsError::InvalidValue {
        key: key.to_string(),
        reason: e.to_string(),
      })?;
      if let Some((c, w)) = weights.out_of_range() {
        return Err(SettingsError::InvalidWeight { criterion: c.key(), value: w });
      }
      cfg.rubric_weights = weights;
    }
    other => return Err(SettingsError::UnknownKey(other.to_string())),
  }
  Ok(())
}

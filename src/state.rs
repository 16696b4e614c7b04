//! Application state: attempt store, settings service, prompts, and the model client.
//!
//! This module owns:
//!   - the scenario/attempt store
//!   - the settings store (persisted overrides over process defaults)
//!   - the prompts struct (from TOML or defaults)
//!   - the Ollama HTTP client

use tracing::{info, instrument};

use crate::config::{load_agent_config_from_env, ProcessConfig, Prompts};
use crate::ollama::Ollama;
use crate::settings::{SettingsError, SettingsStore};
use crate::store::Store;

pub struct AppState {
    pub store: Store,
    pub settings: SettingsStore,
    pub ollama: Ollama,
    pub prompts: Prompts,
}

impl AppState {
    /// Build state from process config: load prompts (if configured) and
    /// persisted settings from `config.settings_path`.
    #[instrument(level = "info", skip_all, fields(settings_path = %config.settings_path.display()))]
    pub async fn build(config: ProcessConfig) -> Result<Self, SettingsError> {
        let prompts = load_agent_config_from_env()
            .map(|c| c.prompts)
            .unwrap_or_default();

        let settings = SettingsStore::load(&config, Some(config.settings_path.clone())).await?;
        let effective = settings.snapshot().await;
        info!(
            target: "email_trainer",
            model = %effective.model_name,
            small_model = %effective.small_model,
            base_url = %effective.base_url,
            use_mock = effective.use_mock,
            "Effective configuration"
        );

        Ok(Self::with_parts(settings, prompts))
    }

    pub fn with_parts(settings: SettingsStore, prompts: Prompts) -> Self {
        Self {
            store: Store::new(),
            settings,
            ollama: Ollama::new(),
            prompts,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// State with in-memory settings pointed at `base_url`.
    pub(crate) fn state_for(base_url: &str, use_mock: bool) -> AppState {
        let config = ProcessConfig {
            base_url: base_url.to_string(),
            model_name: "primary".into(),
            small_model: "small".into(),
            use_mock,
            ..ProcessConfig::default()
        };
        let settings = SettingsStore::in_memory(&config);
        AppState::with_parts(settings, Prompts::default())
    }

    #[tokio::test]
    async fn build_reads_missing_settings_file_as_empty() {
        let path = std::env::temp_dir().join(format!("email-trainer-state-{}.toml", uuid::Uuid::new_v4()));
        let config = ProcessConfig { settings_path: path, ..ProcessConfig::default() };
        let state = AppState::build(config).await.unwrap();
        assert!(state.settings.all().await.is_empty());
        assert_eq!(state.settings.snapshot().await.model_name, crate::config::DEFAULT_MODEL);
    }
}

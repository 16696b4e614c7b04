//! Process configuration from the environment, plus optional prompt overrides from TOML.
//!
//! `ProcessConfig` holds the defaults that persisted settings overlay at startup.
//! `AgentConfig` / `Prompts` describe the prompt templates sent to the model.

use std::path::PathBuf;

use serde::Deserialize;
use tracing::{error, info};

use crate::domain::RubricWeights;

pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";
pub const DEFAULT_MODEL: &str = "llama3.1";
pub const DEFAULT_SMALL_MODEL: &str = "llama3.2:3b";
pub const DEFAULT_SETTINGS_PATH: &str = "./settings.toml";

/// Defaults read once at startup.
#[derive(Clone, Debug)]
pub struct ProcessConfig {
  pub port: u16,
  pub base_url: String,
  pub model_name: String,
  pub small_model: String,
  pub rubric_weights: RubricWeights,
  pub use_mock: bool,
  pub settings_path: PathBuf,
  pub autodetect_model: bool,
}

impl Default for ProcessConfig {
  fn default() -> Self {
    Self {
      port: 3000,
      base_url: DEFAULT_BASE_URL.into(),
      model_name: DEFAULT_MODEL.into(),
      small_model: DEFAULT_SMALL_MODEL.into(),
      rubric_weights: RubricWeights::default(),
      use_mock: false,
      settings_path: PathBuf::from(DEFAULT_SETTINGS_PATH),
      autodetect_model: true,
    }
  }
}

impl ProcessConfig {
  pub fn from_env() -> Self {
    let d = Self::default();
    let var = |k: &str| std::env::var(k).ok().filter(|v| !v.trim().is_empty());

    Self {
      port: var("PORT").and_then(|p| p.parse::<u16>().ok()).unwrap_or(d.port),
      base_url: var("OLLAMA_BASE_URL").unwrap_or(d.base_url),
      model_name: var("LLM_MODEL_NAME").unwrap_or(d.model_name),
      small_model: var("OLLAMA_SMALL_MODEL").unwrap_or(d.small_model),
      rubric_weights: d.rubric_weights,
      use_mock: var("USE_MOCK_LLM").map(|v| v == "1").unwrap_or(d.use_mock),
      settings_path: var("SETTINGS_PATH").map(PathBuf::from).unwrap_or(d.settings_path),
      autodetect_model: var("AUTODETECT_MODEL").map(|v| v != "0").unwrap_or(d.autodetect_model),
    }
  }
}

#[derive(Clone, Debug, Deserialize, Default)]
pub struct AgentConfig {
  #[serde(default)]
  pub prompts: Prompts,
}

/// Prompt templates. `{placeholders}` are filled by `util::fill_template`.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Prompts {
  pub scenario_template: String,
  pub evaluation_template: String,
}

impl Default for Prompts {
  fn default() -> Self {
    Self {
      scenario_template: "Generate a highly specific, realistic professional email scenario. Avoid generic situations.\n\
Include:\n- Character name & role\n- Situation context (numbers/dates if relevant)\n- Specific challenge/request\n\
- Success criteria list tuned to difficulty\n- Tone requirements\n- Key information that must be included\n\
Difficulty: {difficulty} (Guidance: {guidance})\n\
Category (free text): {category}\nFocus Area: {focus}\n\
Return ONLY valid JSON with keys: character_name, character_role, scenario_text, success_criteria (list sized to difficulty), tone, rubric_text (short scoring guidelines for this scenario).".into(),
      evaluation_template: "Evaluate the email using this rubric (0-100 each):\n\
1) Clarity 2) Conciseness 3) Tone 4) Grammar/Spelling 5) Completeness 6) Politeness\n\
Rubric weights: {weights_json}\n\
Scenario: {scenario}\n\
Email: {email}\n\
Return ONLY valid JSON with keys:\n\
scores (object with clarity, conciseness, tone, grammar, completeness, politeness 0-100),\n\
total (weighted 0-100), feedback (string), suggestions (array of strings), rubric_text (string with short scoring guidelines).".into(),
    }
  }
}

/// Attempt to load `AgentConfig` from AGENT_CONFIG_PATH. On any parsing/IO error, returns None.
pub fn load_agent_config_from_env() -> Option<AgentConfig> {
  let path = std::env::var("AGENT_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match toml::from_str::<AgentConfig>(&s) {
      Ok(cfg) => {
        info!(target: "email_trainer", %path, "Loaded prompt config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "email_trainer", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "email_trainer", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn partial_prompt_override_keeps_other_defaults() {
    let cfg: AgentConfig = toml::from_str("[prompts]\nscenario_template = \"custom {difficulty}\"\n").unwrap();
    assert_eq!(cfg.prompts.scenario_template, "custom {difficulty}");
    assert_eq!(cfg.prompts.evaluation_template, Prompts::default().evaluation_template);
  }

  #[test]
  fn default_templates_carry_all_placeholders() {
    let p = Prompts::default();
    for key in ["{difficulty}", "{guidance}", "{category}", "{focus}"] {
      assert!(p.scenario_template.contains(key), "missing {key}");
    }
    for key in ["{weights_json}", "{scenario}", "{email}"] {
      assert!(p.evaluation_template.contains(key), "missing {key}");
    }
  }
}

//! Core behaviors behind the HTTP handlers.
//!
//! This includes:
//!   - Creating scenarios (generated or from the preset catalog)
//!   - Scoring and recording attempts
//!   - Model autodetection and settings updates

use chrono::Utc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::domain::{Attempt, Difficulty, Scenario};
use crate::error::AppError;
use crate::evaluation::evaluate_email;
use crate::ollama::select_preferred_model;
use crate::presets::preset_by_id;
use crate::protocol::{AutodetectOut, SettingsOut, SettingsUpdateIn, DEFAULT_CATEGORY, DEFAULT_FOCUS};
use crate::scenarios::generate_scenario;
use crate::settings::{weights_value, KEY_BASE_URL, KEY_MODEL_NAME, KEY_RUBRIC_WEIGHTS, KEY_SMALL_MODEL};
use crate::state::AppState;

#[instrument(level = "info", skip(state), fields(%difficulty, %category, %focus))]
pub async fn create_scenario(state: &AppState, difficulty: Difficulty, category: &str, focus: &str) -> Scenario {
  let cfg = state.settings.snapshot().await;
  let generated = generate_scenario(&state.ollama, &state.prompts, &cfg, difficulty, category, focus).await;
  let scenario = generated.into_scenario(difficulty, category);
  info!(target: "scenario", id = %scenario.id, source = ?scenario.source, "Scenario created");
  state.store.insert_scenario(scenario).await
}

#[instrument(level = "info", skip(state))]
pub async fn create_scenario_from_preset(state: &AppState, preset_id: &str) -> Result<Scenario, AppError> {
  let preset = preset_by_id(preset_id).ok_or_else(|| AppError::not_found("preset", preset_id))?;
  let scenario = preset.to_scenario();
  info!(target: "scenario", id = %scenario.id, %preset_id, "Scenario created from preset");
  Ok(state.store.insert_scenario(scenario).await)
}

/// Score `body` against a scenario and record the attempt.
///
/// Without a `scenario_id` a default beginner scenario is generated first, so a
/// bare email can still be scored. An id that does not resolve is a 404.
#[instrument(level = "info", skip(state, subject, body), fields(scenario_id = ?scenario_id, body_len = body.len()))]
pub async fn submit_attempt(
  state: &AppState,
  scenario_id: Option<&str>,
  subject: &str,
  body: &str,
) -> Result<(Attempt, Scenario), AppError> {
  let scenario = match scenario_id {
    Some(id) => state
      .store
      .get_scenario(id)
      .await
      .ok_or_else(|| AppError::not_found("scenario", id))?,
    None => create_scenario(state, Difficulty::Beginner, DEFAULT_CATEGORY, DEFAULT_FOCUS).await,
  };

  let cfg = state.settings.snapshot().await;
  let eval = evaluate_email(
    &state.ollama,
    &state.prompts,
    &cfg,
    &scenario.scenario_text,
    body,
    &cfg.rubric_weights,
  )
  .await;

  let rubric_text = if eval.rubric_text.is_empty() {
    scenario.rubric_text.clone().unwrap_or_default()
  } else {
    eval.rubric_text
  };

  let attempt = Attempt {
    id: Uuid::new_v4().to_string(),
    scenario_id: scenario.id.clone(),
    subject: subject.to_string(),
    body: body.to_string(),
    scores: eval.scores,
    total: eval.total,
    feedback: eval.feedback,
    suggestions: eval.suggestions,
    rubric_text,
    attempt_number: 0,
    source: eval.source,
    submitted_at: Utc::now(),
  };
  let attempt = state.store.record_attempt(attempt).await;
  info!(
    target: "email_trainer",
    id = %attempt.id,
    scenario_id = %attempt.scenario_id,
    number = attempt.attempt_number,
    total = attempt.total,
    "Attempt scored"
  );
  Ok((attempt, scenario))
}

/// Pick a small local model from what the service reports and persist it as
/// both the primary and the fallback model. No match leaves settings alone.
#[instrument(level = "info", skip(state))]
pub async fn autodetect_model_preference(state: &AppState) -> Result<AutodetectOut, AppError> {
  let base_url = state.settings.snapshot().await.base_url;
  let available = state.ollama.list_models(&base_url).await;
  let selected = select_preferred_model(&available);

  match &selected {
    Some(model) => {
      state.settings.set_many(&[(KEY_MODEL_NAME, model.as_str()), (KEY_SMALL_MODEL, model.as_str())]).await?;
      info!(target: "settings", %model, available = available.len(), "Preferred model selected");
    }
    None => {
      warn!(target: "settings", available = available.len(), "No preferred model found; keeping configured models");
    }
  }
  Ok(AutodetectOut { selected, available })
}

/// Current settings, after applying an optional mock toggle.
pub async fn settings_view(state: &AppState, mock: Option<bool>) -> SettingsOut {
  if let Some(use_mock) = mock {
    state.settings.set_use_mock(use_mock).await;
  }
  SettingsOut::new(state.settings.snapshot().await, state.settings.all().await)
}

/// Apply every field of `update` or none of them.
#[instrument(level = "info", skip(state, update))]
pub async fn update_settings(state: &AppState, update: SettingsUpdateIn) -> Result<SettingsOut, AppError> {
  let weights = update.weights.as_ref().map(weights_value).transpose()?;
  let mut pairs: Vec<(&str, &str)> = Vec::new();
  if let Some(name) = update.llm_model_name.as_deref() {
    pairs.push((KEY_MODEL_NAME, name.trim()));
  }
  if let Some(url) = update.ollama_base_url.as_deref() {
    pairs.push((KEY_BASE_URL, url.trim()));
  }
  if let Some(w) = weights.as_deref() {
    pairs.push((KEY_RUBRIC_WEIGHTS, w));
  }
  state.settings.set_many(&pairs).await?;
  Ok(settings_view(state, None).await)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::{EvaluationSource, RubricWeights, ScenarioSource};
  use crate::evaluation::mock_evaluate;
  use crate::state::tests::state_for;
  use crate::testing::spawn_fake_ollama;

  const DEAD: &str = "http://127.0.0.1:9";

  #[tokio::test]
  async fn attempts_on_one_scenario_are_numbered_in_order() {
    let state = state_for(DEAD, true);
    let scenario = create_scenario(&state, Difficulty::Intermediate, "client renewal", "tone").await;
    assert_eq!(scenario.source, ScenarioSource::Mock);

    let mut numbers = Vec::new();
    for _ in 0..3 {
      let (a, _) = submit_attempt(&state, Some(&scenario.id), "Hi", "Dear client, thanks.").await.unwrap();
      numbers.push(a.attempt_number);
    }
    assert_eq!(numbers, vec![1, 2, 3]);
  }

  #[tokio::test]
  async fn submit_scores_with_mock_and_current_weights() {
    let state = state_for(DEAD, true);
    let scenario = create_scenario_from_preset(&state, "beg_prof_round_90").await.unwrap();
    let (attempt, _) = submit_attempt(&state, Some(&scenario.id), "Rounding", "Dear Prof. Kim, ...").await.unwrap();
    let expected = mock_evaluate(&scenario.scenario_text, "Dear Prof. Kim, ...", &RubricWeights::default());
    assert_eq!(attempt.source, EvaluationSource::Mock);
    assert_eq!(attempt.scores, expected.scores);
    assert_eq!(attempt.total, expected.total);
  }

  #[tokio::test]
  async fn unknown_ids_are_not_found() {
    let state = state_for(DEAD, true);
    assert!(matches!(
      submit_attempt(&state, Some("nope"), "", "body").await,
      Err(AppError::NotFound(_))
    ));
    assert!(matches!(create_scenario_from_preset(&state, "nope").await, Err(AppError::NotFound(_))));
  }

  #[tokio::test]
  async fn missing_scenario_id_creates_a_default_scenario() {
    let state = state_for(DEAD, true);
    let (attempt, scenario) = submit_attempt(&state, None, "", "Hello").await.unwrap();
    assert_eq!(scenario.difficulty, Difficulty::Beginner);
    assert_eq!(scenario.category, DEFAULT_CATEGORY);
    assert_eq!(attempt.scenario_id, scenario.id);
    assert_eq!(attempt.attempt_number, 1);
  }

  #[tokio::test]
  async fn autodetect_persists_preferred_model_as_both_settings() {
    let base = spawn_fake_ollama(vec![], vec!["mistral:7b", "qwen2:1b", "llama3.2:3b"]).await;
    let state = state_for(&base, false);
    let out = autodetect_model_preference(&state).await.unwrap();
    assert_eq!(out.selected.as_deref(), Some("llama3.2:3b"));
    let cfg = state.settings.snapshot().await;
    assert_eq!(cfg.model_name, "llama3.2:3b");
    assert_eq!(cfg.small_model, "llama3.2:3b");
  }

  #[tokio::test]
  async fn autodetect_without_match_is_a_no_op() {
    let state = state_for(DEAD, false);
    let out = autodetect_model_preference(&state).await.unwrap();
    assert!(out.selected.is_none());
    assert!(out.available.is_empty());
    assert_eq!(state.settings.snapshot().await.model_name, "primary");
  }

  #[tokio::test]
  async fn settings_update_and_mock_toggle() {
    let state = state_for(DEAD, false);
    let update = SettingsUpdateIn {
      llm_model_name: Some(" gemma3:1b ".into()),
      ollama_base_url: None,
      weights: Some(RubricWeights { tone: 0.4, ..RubricWeights::default() }),
    };
    let out = update_settings(&state, update).await.unwrap();
    assert_eq!(out.llm_model_name, "gemma3:1b");
    assert_eq!(out.weights.tone, 0.4);
    assert!(!out.use_mock);

    assert!(settings_view(&state, Some(true)).await.use_mock);
    assert!(!settings_view(&state, Some(false)).await.use_mock);
  }

  #[tokio::test]
  async fn out_of_range_weight_is_rejected() {
    let state = state_for(DEAD, false);
    let update = SettingsUpdateIn {
      llm_model_name: None,
      ollama_base_url: None,
      weights: Some(RubricWeights { grammar: 1.5, ..RubricWeights::default() }),
    };
    let err = update_settings(&state, update).await.unwrap_err();
    assert!(matches!(err, AppError::Settings(_)));
  }

  #[tokio::test]
  async fn rejected_update_leaves_every_field_unchanged() {
    let state = state_for(DEAD, false);
    let update = SettingsUpdateIn {
      llm_model_name: Some("gemma3:1b".into()),
      ollama_base_url: Some("http://other:11434".into()),
      weights: Some(RubricWeights { grammar: 1.5, ..RubricWeights::default() }),
    };
    assert!(update_settings(&state, update).await.is_err());
    let cfg = state.settings.snapshot().await;
    assert_eq!(cfg.model_name, "primary");
    assert_eq!(cfg.base_url, DEAD);
    assert!(state.settings.all().await.is_empty());
  }
}

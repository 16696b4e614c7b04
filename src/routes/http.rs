//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.
//! Request bodies are validated here; failures come back as `AppError`.

use std::sync::Arc;

use axum::{
  extract::{Path, Query, State},
  http::{header, StatusCode},
  response::IntoResponse,
  Json,
};
use tracing::{info, instrument};
use validator::Validate;

use crate::achievements::{achievement_status, unlocked_achievements};
use crate::analytics::{average_scores, skill_breakdown, streak_days, total_trend};
use crate::error::AppError;
use crate::export::{attempts_csv, CSV_FILENAME};
use crate::logic::*;
use crate::presets::all_presets;
use crate::protocol::*;
use crate::settings::Setting;
use crate::state::AppState;

type Shared = State<Arc<AppState>>;

#[instrument(level = "info", skip(state))]
pub async fn http_health(State(state): Shared) -> impl IntoResponse {
  let use_mock = state.settings.snapshot().await.use_mock;
  Json(HealthOut { ok: true, use_mock })
}

#[instrument(level = "info", skip(state))]
pub async fn http_dashboard(State(state): Shared) -> impl IntoResponse {
  let all = state.store.attempts_chronological().await;
  let recent = state.store.attempts_recent(Some(RECENT_ATTEMPTS)).await;
  Json(DashboardOut {
    averages: average_scores(&all),
    recent,
    streak_days: streak_days(&all),
    total_attempts: all.len(),
    badges: unlocked_achievements(&all),
  })
}

#[instrument(level = "info", skip(state))]
pub async fn http_history(State(state): Shared) -> impl IntoResponse {
  Json(state.store.attempts_recent(None).await)
}

#[instrument(level = "info", skip(state))]
pub async fn http_averages(State(state): Shared) -> impl IntoResponse {
  Json(average_scores(&state.store.attempts_chronological().await))
}

#[instrument(level = "info", skip(state))]
pub async fn http_trend(State(state): Shared) -> impl IntoResponse {
  Json(total_trend(&state.store.attempts_chronological().await))
}

#[instrument(level = "info", skip(state))]
pub async fn http_skills(State(state): Shared) -> impl IntoResponse {
  Json(skill_breakdown(&state.store.attempts_chronological().await))
}

#[instrument(level = "info", skip(state))]
pub async fn http_achievements(State(state): Shared) -> impl IntoResponse {
  let achievements = achievement_status(&state.store.attempts_chronological().await);
  let unlocked_count = achievements.iter().filter(|a| a.unlocked).count();
  Json(AchievementsOut { unlocked_count, achievements })
}

#[instrument(level = "info", skip(state, body), fields(difficulty = %body.difficulty))]
pub async fn http_post_scenario(
  State(state): Shared,
  Json(body): Json<ScenarioIn>,
) -> Result<impl IntoResponse, AppError> {
  body.validate()?;
  let category = body.category.as_deref().unwrap_or(DEFAULT_CATEGORY);
  let focus = body.focus.as_deref().unwrap_or(DEFAULT_FOCUS);
  let scenario = create_scenario(&state, body.difficulty, category, focus).await;
  info!(target: "scenario", id = %scenario.id, "HTTP scenario served");
  Ok((StatusCode::CREATED, Json(scenario)))
}

#[instrument(level = "info", skip(state))]
pub async fn http_list_scenarios(State(state): Shared) -> impl IntoResponse {
  Json(state.store.list_scenarios().await)
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_scenario(
  State(state): Shared,
  Path(id): Path<String>,
) -> Result<Json<ScenarioOut>, AppError> {
  let scenario = state
    .store
    .get_scenario(&id)
    .await
    .ok_or_else(|| AppError::not_found("scenario", &id))?;
  let attempts = state.store.attempts_for_scenario(&id).await;
  Ok(Json(ScenarioOut { scenario, attempts }))
}

#[instrument(level = "info")]
pub async fn http_presets() -> impl IntoResponse {
  Json(all_presets())
}

#[instrument(level = "info", skip(state))]
pub async fn http_post_preset_scenario(
  State(state): Shared,
  Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
  let scenario = create_scenario_from_preset(&state, &id).await?;
  Ok((StatusCode::CREATED, Json(scenario)))
}

#[instrument(level = "info", skip(state, body), fields(scenario_id = ?body.scenario_id, body_len = body.body.len()))]
pub async fn http_post_attempt(
  State(state): Shared,
  Json(body): Json<AttemptIn>,
) -> Result<impl IntoResponse, AppError> {
  body.validate()?;
  let subject = body.subject.as_deref().unwrap_or_default();
  let (attempt, scenario) = submit_attempt(&state, body.scenario_id.as_deref(), subject, &body.body).await?;
  info!(target: "email_trainer", id = %attempt.id, total = attempt.total, "HTTP attempt evaluated");
  Ok((StatusCode::CREATED, Json(AttemptOut { attempt, scenario })))
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_attempt(
  State(state): Shared,
  Path(id): Path<String>,
) -> Result<Json<AttemptOut>, AppError> {
  let attempt = state
    .store
    .get_attempt(&id)
    .await
    .ok_or_else(|| AppError::not_found("attempt", &id))?;
  let scenario = state
    .store
    .get_scenario(&attempt.scenario_id)
    .await
    .ok_or_else(|| AppError::not_found("scenario", &attempt.scenario_id))?;
  Ok(Json(AttemptOut { attempt, scenario }))
}

#[instrument(level = "info", skip(state), fields(mock = ?q.mock))]
pub async fn http_get_settings(State(state): Shared, Query(q): Query<SettingsQuery>) -> impl IntoResponse {
  Json(settings_view(&state, q.mock_flag()).await)
}

#[instrument(level = "info", skip(state, body))]
pub async fn http_put_settings(
  State(state): Shared,
  Json(body): Json<SettingsUpdateIn>,
) -> Result<Json<SettingsOut>, AppError> {
  body.validate()?;
  Ok(Json(update_settings(&state, body).await?))
}

#[instrument(level = "info", skip(state))]
pub async fn http_get_setting(State(state): Shared, Path(key): Path<String>) -> Result<Json<Setting>, AppError> {
  state
    .settings
    .get(&key)
    .await
    .map(Json)
    .ok_or_else(|| AppError::not_found("setting", &key))
}

#[instrument(level = "info", skip(state))]
pub async fn http_post_autodetect(State(state): Shared) -> Result<Json<AutodetectOut>, AppError> {
  Ok(Json(autodetect_model_preference(&state).await?))
}

#[instrument(level = "info", skip(state))]
pub async fn http_export_csv(State(state): Shared) -> Result<impl IntoResponse, AppError> {
  let attempts = state.store.attempts_chronological().await;
  let body = attempts_csv(&attempts)?;
  info!(target: "email_trainer", rows = attempts.len(), "CSV export served");
  Ok((
    [
      (header::CONTENT_TYPE, "text/csv".to_string()),
      (header::CONTENT_DISPOSITION, format!("attachment; filename={CSV_FILENAME}")),
    ],
    body,
  ))
}

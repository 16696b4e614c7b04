//! Router assembly: HTTP endpoints, static files, CORS, and HTTP tracing.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::state::AppState;

pub mod http;

/// Build the application router with:
/// - JSON API under `/api/v1/...` plus the CSV export
/// - Static SPA from `./static` with index fallback
/// - CORS (allow any origin/method/headers)
/// - HTTP trace layer (per-request spans w/ method, path, status, latency)
pub fn build_router(state: Arc<AppState>) -> Router {
    let static_service = ServeDir::new("./static")
        .append_index_html_on_directories(true)
        .not_found_service(ServeFile::new("./static/index.html"));

    Router::new()
        .route("/api/v1/health", get(http::http_health))
        .route("/api/v1/dashboard", get(http::http_dashboard))
        .route("/api/v1/history", get(http::http_history))
        .route("/api/v1/analytics/averages", get(http::http_averages))
        .route("/api/v1/analytics/trend", get(http::http_trend))
        .route("/api/v1/analytics/skills", get(http::http_skills))
        .route("/api/v1/achievements", get(http::http_achievements))
        .route("/api/v1/scenarios", get(http::http_list_scenarios).post(http::http_post_scenario))
        .route("/api/v1/scenarios/:id", get(http::http_get_scenario))
        .route("/api/v1/presets", get(http::http_presets))
        .route("/api/v1/presets/:id/scenario", post(http::http_post_preset_scenario))
        .route("/api/v1/attempts", post(http::http_post_attempt))
        .route("/api/v1/attempts/:id", get(http::http_get_attempt))
        .route("/api/v1/settings", get(http::http_get_settings).put(http::http_put_settings))
        .route("/api/v1/settings/autodetect", post(http::http_post_autodetect))
        .route("/api/v1/settings/:key", get(http::http_get_setting))
        .route("/api/v1/export/csv", get(http::http_export_csv))
        // State + CORS + HTTP tracing
        .with_state(state)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        // Frontend fallback
        .fallback_service(static_service)
}

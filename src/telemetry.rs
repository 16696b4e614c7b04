//! Telemetry initialization (tracing/tracing-subscriber).
//!
//! - LOG_LEVEL overrides the filter directives, e.g. "debug" or
//!   "info,scenario=debug,evaluation=debug,tower_http=info".
//! - LOG_FORMAT=json switches to structured JSON lines; anything else is pretty text.
//!
//! Targets in use: `email_trainer`, `scenario`, `evaluation`, `settings`.

use tracing_subscriber::EnvFilter;

pub const DEFAULT_FILTER: &str =
    "info,email_trainer=debug,scenario=debug,evaluation=debug,settings=debug,tower_http=info,axum=info";

/// `LOG_LEVEL` if it parses, otherwise `DEFAULT_FILTER`.
fn filter_from(log_level: Option<&str>) -> EnvFilter {
    log_level
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(DEFAULT_FILTER))
}

pub fn init_tracing() {
    let log_level = std::env::var("LOG_LEVEL").ok();
    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter_from(log_level.as_deref()))
        .with_target(true)
        .with_file(true)
        .with_line_number(true);

    if json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

//! Public HTTP request/response structs (serde ready).
//! Request bodies derive `Validate`; handlers call `.validate()` before any work.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::achievements::{Achievement, AchievementStatus};
use crate::analytics::AverageScores;
use crate::domain::{Attempt, Difficulty, RubricWeights, Scenario};
use crate::settings::{RuntimeConfig, Setting};

pub const DEFAULT_CATEGORY: &str = "academic";
pub const DEFAULT_FOCUS: &str = "clarity";
pub const RECENT_ATTEMPTS: usize = 10;

#[derive(Debug, Deserialize, Validate)]
pub struct ScenarioIn {
    pub difficulty: Difficulty,
    #[validate(length(min = 1, max = 64, message = "Category must be between 1 and 64 characters"))]
    pub category: Option<String>,
    #[validate(length(min = 1, max = 64, message = "Focus must be between 1 and 64 characters"))]
    pub focus: Option<String>,
}

/// A scenario together with every attempt made on it so far.
#[derive(Debug, Serialize)]
pub struct ScenarioOut {
    pub scenario: Scenario,
    pub attempts: Vec<Attempt>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct AttemptIn {
    pub scenario_id: Option<String>,
    #[validate(length(max = 200, message = "Subject must be at most 200 characters"))]
    pub subject: Option<String>,
    #[validate(length(min = 1, max = 10000, message = "Body must be between 1 and 10000 characters"))]
    pub body: String,
}

#[derive(Debug, Serialize)]
pub struct AttemptOut {
    pub attempt: Attempt,
    pub scenario: Scenario,
}

#[derive(Debug, Serialize)]
pub struct DashboardOut {
    pub averages: AverageScores,
    pub recent: Vec<Attempt>,
    pub streak_days: u32,
    pub total_attempts: usize,
    pub badges: Vec<Achievement>,
}

#[derive(Debug, Serialize)]
pub struct AchievementsOut {
    pub unlocked_count: usize,
    pub achievements: Vec<AchievementStatus>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SettingsQuery {
    /// `1` forces mock scoring, `0` goes back to the remote model. Any other
    /// value leaves the flag alone.
    pub mock: Option<String>,
}

impl SettingsQuery {
    pub fn mock_flag(&self) -> Option<bool> {
        match self.mock.as_deref() {
            Some("1") => Some(true),
            Some("0") => Some(false),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct SettingsUpdateIn {
    #[validate(length(min = 1, max = 100, message = "Model name must be between 1 and 100 characters"))]
    pub llm_model_name: Option<String>,
    #[validate(length(min = 1, max = 255, message = "Base URL must be between 1 and 255 characters"))]
    pub ollama_base_url: Option<String>,
    /// Range of each weight is checked by the settings store.
    pub weights: Option<RubricWeights>,
}

#[derive(Debug, Serialize)]
pub struct SettingsOut {
    pub llm_model_name: String,
    pub ollama_base_url: String,
    pub small_model: String,
    pub weights: RubricWeights,
    pub use_mock: bool,
    /// Persisted overrides, keyed rows as stored.
    pub overrides: Vec<Setting>,
}

impl SettingsOut {
    pub fn new(cfg: RuntimeConfig, overrides: Vec<Setting>) -> Self {
        Self {
            llm_model_name: cfg.model_name,
            ollama_base_url: cfg.base_url,
            small_model: cfg.small_model,
            weights: cfg.rubric_weights,
            use_mock: cfg.use_mock,
            overrides,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AutodetectOut {
    pub selected: Option<String>,
    pub available: Vec<String>,
}

#[derive(Serialize)]
pub struct HealthOut {
    pub ok: bool,
    pub use_mock: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attempt_body_bounds() {
        let ok = AttemptIn { scenario_id: None, subject: None, body: "Hi".into() };
        assert!(ok.validate().is_ok());

        let empty = AttemptIn { scenario_id: None, subject: None, body: String::new() };
        assert!(empty.validate().is_err());

        let long = AttemptIn { scenario_id: None, subject: Some("s".repeat(201)), body: "x".into() };
        assert!(long.validate().is_err());
    }

    #[test]
    fn scenario_request_parses_difficulty_and_limits_category() {
        let req: ScenarioIn = serde_json::from_str(r#"{"difficulty":"advanced","category":"client"}"#).unwrap();
        assert_eq!(req.difficulty, Difficulty::Advanced);
        assert!(req.validate().is_ok());

        let req = ScenarioIn { difficulty: Difficulty::Beginner, category: Some("c".repeat(65)), focus: None };
        assert!(req.validate().is_err());
        assert!(serde_json::from_str::<ScenarioIn>(r#"{"difficulty":"expert"}"#).is_err());
    }
}

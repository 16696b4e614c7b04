//! Rubric scoring of a submitted email: remote model tiers, then a seeded mock.
//!
//! The mock seeds its RNG from the input lengths, so the same (scenario, email)
//! pair always scores the same. Remote scores are taken as given: no clamping.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{info, instrument};

use crate::config::Prompts;
use crate::domain::{Criterion, EvaluationSource, RubricWeights, Scores};
use crate::extract::normalize_suggestions;
use crate::ollama::{LlmError, Ollama, Tier};
use crate::settings::RuntimeConfig;
use crate::util::{char_len, fill_template};

pub const PRIMARY_TIMEOUT: Duration = Duration::from_secs(15);
pub const SMALL_TIMEOUT: Duration = Duration::from_secs(8);

pub const MOCK_RUBRIC_TEXT: &str = "Rubric (mock): clarity, conciseness, tone, grammar, completeness, politeness.";
pub const MOCK_FEEDBACK: &str = "This is a mock evaluation. Focus on being specific, concise, and polite.";
pub const MOCK_SUGGESTIONS: [&str; 3] = [
  "Open with a clear purpose line.",
  "Trim redundant phrases to improve conciseness.",
  "Close with a concrete next step and thanks.",
];

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct Evaluation {
  pub scores: Scores,
  pub total: i64,
  pub feedback: String,
  pub suggestions: Vec<String>,
  pub rubric_text: String,
  pub source: EvaluationSource,
}

/// Σ score × weight, truncated toward zero.
pub fn weighted_total(scores: &Scores, weights: &RubricWeights) -> i64 {
  let sum: f64 = Criterion::ALL
    .iter()
    .map(|c| scores.get(*c) as f64 * weights.get(*c))
    .sum();
  sum.trunc() as i64
}

/// Length-driven pseudo-random scoring, reproducible for a given pair of input lengths.
pub fn mock_evaluate(scenario_text: &str, email_body: &str, weights: &RubricWeights) -> Evaluation {
  let length = char_len(email_body) as i64;
  let base = (40 + length / 40).min(100);
  let seed = (char_len(email_body) + char_len(scenario_text)) as u64;
  let mut rng = StdRng::seed_from_u64(seed);

  let mut scores = Scores::default();
  for c in Criterion::ALL {
    let jitter: i64 = rng.gen_range(-10..=10);
    let value = match c {
      Criterion::Conciseness => (100 - length / 60 + jitter).clamp(40, 100),
      _ => (base + jitter).min(100),
    };
    scores.set(c, value);
  }

  Evaluation {
    total: weighted_total(&scores, weights),
    scores,
    feedback: MOCK_FEEDBACK.to_string(),
    suggestions: MOCK_SUGGESTIONS.iter().map(|s| s.to_string()).collect(),
    rubric_text: MOCK_RUBRIC_TEXT.to_string(),
    source: EvaluationSource::Mock,
  }
}

/// Integer reading of a model-supplied number: floats and numeric strings are
/// truncated, anything else is 0.
fn int_like(v: Option<&Value>) -> i64 {
  match v {
    Some(Value::Number(n)) => n.as_i64().unwrap_or_else(|| n.as_f64().map(|f| f.trunc() as i64).unwrap_or(0)),
    Some(Value::String(s)) => s.trim().parse::<f64>().map(|f| f.trunc() as i64).unwrap_or(0),
    _ => 0,
  }
}

fn text_field(map: &Map<String, Value>, key: &str) -> String {
  match map.get(key) {
    Some(Value::String(s)) => s.trim().to_string(),
    Some(Value::Null) | None => String::new(),
    Some(other) => other.to_string(),
  }
}

/// Accept a reply only if it carries both `scores` (an object) and `total`.
fn parse_remote(map: Map<String, Value>) -> Result<Evaluation, LlmError> {
  let scores_obj = match map.get("scores") {
    Some(Value::Object(o)) => o,
    Some(_) => return Err(LlmError::Malformed("'scores' is not an object".into())),
    None => return Err(LlmError::Malformed("missing 'scores'".into())),
  };
  if !map.contains_key("total") {
    return Err(LlmError::Malformed("missing 'total'".into()));
  }

  let mut scores = Scores::default();
  for c in Criterion::ALL {
    scores.set(c, int_like(scores_obj.get(c.key())));
  }

  Ok(Evaluation {
    scores,
    total: int_like(map.get("total")),
    feedback: text_field(&map, "feedback"),
    suggestions: normalize_suggestions(map.get("suggestions").unwrap_or(&Value::Null)),
    rubric_text: text_field(&map, "rubric_text"),
    source: EvaluationSource::Remote,
  })
}

pub fn evaluation_tiers(cfg: &RuntimeConfig) -> Vec<Tier> {
  vec![
    Tier::new(&cfg.model_name, PRIMARY_TIMEOUT),
    Tier::new(&cfg.small_model, SMALL_TIMEOUT),
  ]
}

/// Score an email. Always returns a result: the mock is the last tier.
#[instrument(
  level = "info",
  skip(ollama, prompts, cfg, scenario_text, email_body, weights),
  fields(scenario_len = scenario_text.len(), body_len = email_body.len(), use_mock = cfg.use_mock)
)]
pub async fn evaluate_email(
  ollama: &Ollama,
  prompts: &Prompts,
  cfg: &RuntimeConfig,
  scenario_text: &str,
  email_body: &str,
  weights: &RubricWeights,
) -> Evaluation {
  if !cfg.use_mock {
    let weights_json = serde_json::to_string(weights).unwrap_or_else(|_| "{}".into());
    let prompt = fill_template(
      &prompts.evaluation_template,
      &[("weights_json", &weights_json), ("scenario", scenario_text), ("email", email_body)],
    );
    let tiers = evaluation_tiers(cfg);
    if let Some((eval, model)) = ollama
      .first_accepted(&cfg.base_url, &tiers, &prompt, "evaluation", parse_remote)
      .await
    {
      info!(target: "evaluation", %model, total = eval.total, "Email scored remotely");
      return eval;
    }
  }

  let eval = mock_evaluate(scenario_text, email_body, weights);
  info!(target: "evaluation", total = eval.total, "Email scored by mock");
  eval
}

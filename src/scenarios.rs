//! Scenario generation: remote model tiers first, canned mock scenarios last.
//!
//! The mock generator is deliberately unseeded; two calls with the same inputs
//! may return different scenarios.

use std::time::Duration;

use chrono::Utc;
use rand::seq::SliceRandom;
use serde_json::{Map, Value};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::config::Prompts;
use crate::domain::{Difficulty, Scenario, ScenarioSource};
use crate::extract::normalize_suggestions;
use crate::ollama::{LlmError, Ollama, Tier};
use crate::settings::RuntimeConfig;
use crate::util::fill_template;

pub const PRIMARY_TIMEOUT: Duration = Duration::from_secs(10);
pub const SMALL_TIMEOUT: Duration = Duration::from_secs(6);

const MOCK_TONE: &str = "professional, confident, concise";
const MOCK_NAMES: [&str; 4] = ["Dr. Avery", "Prof. Kim", "Jordan Patel", "Sam Rivera"];
const MOCK_ROLES: [&str; 4] = ["Professor", "Manager", "Client Success Lead", "TA"];

const ACADEMIC_KEYWORDS: [&str; 2] = ["acad", "prof"];
const BUSINESS_KEYWORDS: [&str; 6] = ["client", "manager", "work", "biz", "company", "salary"];

/// Coarse grouping of free-text categories used by the mock generator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Bucket {
  Academic,
  Business,
  Personal,
}

/// What a generator tier produced, before it is stored as a `Scenario`.
#[derive(Clone, Debug)]
pub struct GeneratedScenario {
  pub character_name: Option<String>,
  pub character_role: Option<String>,
  pub scenario_text: String,
  pub success_criteria: Vec<String>,
  pub tone: Option<String>,
  pub rubric_text: String,
  pub source: ScenarioSource,
}

impl GeneratedScenario {
  pub fn into_scenario(self, difficulty: Difficulty, category: &str) -> Scenario {
    Scenario {
      id: Uuid::new_v4().to_string(),
      character_name: self.character_name,
      character_role: self.character_role,
      scenario_text: self.scenario_text,
      difficulty,
      category: category.to_string(),
      success_criteria: self.success_criteria,
      rubric_text: Some(self.rubric_text),
      tone: self.tone,
      source: self.source,
      preset_id: None,
      title: None,
      created_at: Utc::now(),
    }
  }
}

pub fn bucket_for_category(category: &str) -> Bucket {
  let c = category.to_lowercase();
  if ACADEMIC_KEYWORDS.iter().any(|k| c.contains(k)) {
    Bucket::Academic
  } else if BUSINESS_KEYWORDS.iter().any(|k| c.contains(k)) {
    Bucket::Business
  } else {
    Bucket::Personal
  }
}

/// Prompt-level hint on context depth and criteria count; not enforced on replies.
pub fn difficulty_guidance(difficulty: Difficulty) -> &'static str {
  match difficulty {
    Difficulty::Beginner => "Provide rich context and concrete hints the learner can follow. Include 3-5 success criteria.",
    Difficulty::Intermediate => "Provide moderate context and 2-3 success criteria. Avoid step-by-step hints.",
    Difficulty::Advanced => "Provide minimal context, avoid explicit hints. Only 1-2 high-level success criteria.",
  }
}

fn default_rubric_text(difficulty: Difficulty) -> &'static str {
  match difficulty {
    Difficulty::Beginner => "Clarity: request stated in the opening lines; Completeness: every success criterion covered; \
Tone: respectful; Conciseness: under 200 words; Politeness: thank the reader.",
    Difficulty::Intermediate => "Clarity: explicit ask; Completeness: at least one evidence point; Tone: professional; Conciseness: under 150 words.",
    Difficulty::Advanced => "Clarity: crisp ask; Tone: confident and professional; Conciseness: under 120 words.",
  }
}

fn mock_texts(bucket: Bucket) -> [&'static str; 3] {
  match bucket {
    Bucket::Academic => [
      "Write to your professor requesting rounding your 89.4% to 90% due to consistent top-quartile performance and extra credit completed.",
      "Email your TA to ask for a regrade on Question 3 citing rubric misinterpretation.",
      "Request a deadline extension for your literature review due to conference travel with attached itinerary.",
    ],
    Bucket::Business => [
      "Negotiate a 5% delivery delay with a client after a supplier recall; propose mitigation and revised timeline.",
      "Ask your manager to approve a $1,200 budget increase for user testing with data-backed rationale.",
      "Escalate a production incident summary to the VP with clear next steps and owners.",
    ],
    Bucket::Personal => [
      "Ask your mentor for a recommendation letter highlighting two recent projects and deadlines.",
      "Email a club president to propose merging overlapping workshops into one event.",
      "Request a landlord repair with photos and proposed appointment windows.",
    ],
  }
}

pub fn mock_success_criteria(difficulty: Difficulty) -> Vec<String> {
  let items: &[&str] = match difficulty {
    Difficulty::Beginner => &[
      "Open with specific course/subject and your identifier",
      "State the request clearly with concrete rationale",
      "Cite at least one piece of evidence",
      "Propose a realistic next step/date",
      "Maintain a respectful tone",
    ],
    Difficulty::Intermediate => &[
      "Clear request with concise rationale",
      "One evidence point",
      "Proposed next step",
    ],
    Difficulty::Advanced => &["Clear request", "Professional tone"],
  };
  items.iter().map(|s| s.to_string()).collect()
}

/// Canned scenario picked with an unseeded RNG.
pub fn mock_scenario(difficulty: Difficulty, category: &str) -> GeneratedScenario {
  let mut rng = rand::thread_rng();
  let bucket = bucket_for_category(category);
  let texts = mock_texts(bucket);

  GeneratedScenario {
    character_name: MOCK_NAMES.choose(&mut rng).map(|s| s.to_string()),
    character_role: MOCK_ROLES.choose(&mut rng).map(|s| s.to_string()),
    scenario_text: texts.choose(&mut rng).copied().unwrap_or(texts[0]).to_string(),
    success_criteria: mock_success_criteria(difficulty),
    tone: Some(MOCK_TONE.to_string()),
    rubric_text: default_rubric_text(difficulty).to_string(),
    source: ScenarioSource::Mock,
  }
}

fn non_empty_str(map: &Map<String, Value>, key: &str) -> Option<String> {
  map.get(key)
    .and_then(Value::as_str)
    .map(str::trim)
    .filter(|s| !s.is_empty())
    .map(str::to_string)
}

/// Lenient reading of a model reply. Only an empty object is rejected, and the
/// tier runner already filters those out.
fn parse_remote(map: Map<String, Value>, difficulty: Difficulty) -> Result<GeneratedScenario, LlmError> {
  if map.is_empty() {
    return Err(LlmError::Malformed("empty scenario object".into()));
  }
  Ok(GeneratedScenario {
    character_name: non_empty_str(&map, "character_name"),
    character_role: non_empty_str(&map, "character_role"),
    scenario_text: non_empty_str(&map, "scenario_text").unwrap_or_default(),
    success_criteria: normalize_suggestions(map.get("success_criteria").unwrap_or(&Value::Null)),
    tone: non_empty_str(&map, "tone"),
    rubric_text: non_empty_str(&map, "rubric_text").unwrap_or_else(|| default_rubric_text(difficulty).to_string()),
    source: ScenarioSource::Generated,
  })
}

pub fn scenario_tiers(cfg: &RuntimeConfig) -> Vec<Tier> {
  vec![
    Tier::new(&cfg.model_name, PRIMARY_TIMEOUT),
    Tier::new(&cfg.small_model, SMALL_TIMEOUT),
  ]
}

/// Generate a scenario. Always returns something: the mock is the last tier.
#[instrument(level = "info", skip(ollama, prompts, cfg), fields(%difficulty, category_len = category.len(), use_mock = cfg.use_mock))]
pub async fn generate_scenario(
  ollama: &Ollama,
  prompts: &Prompts,
  cfg: &RuntimeConfig,
  difficulty: Difficulty,
  category: &str,
  focus: &str,
) -> GeneratedScenario {
  if !cfg.use_mock {
    let prompt = fill_template(
      &prompts.scenario_template,
      &[
        ("difficulty", difficulty.as_str()),
        ("guidance", difficulty_guidance(difficulty)),
        ("category", category),
        ("focus", focus),
      ],
    );
    let tiers = scenario_tiers(cfg);
    if let Some((generated, model)) = ollama
      .first_accepted(&cfg.base_url, &tiers, &prompt, "scenario", |m| parse_remote(m, difficulty))
      .await
    {
      info!(target: "scenario", %difficulty, %model, criteria = generated.success_criteria.len(), "Scenario generated remotely");
      return generated;
    }
  }

  let generated = mock_scenario(difficulty, category);
  info!(target: "scenario", %difficulty, bucket = ?bucket_for_category(category), "Scenario generated by mock");
  generated
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::ProcessConfig;
  use crate::testing::{spawn_fake_ollama, FakeReply};

  fn cfg_for(base: &str) -> RuntimeConfig {
    let mut cfg = RuntimeConfig::from(&ProcessConfig::default());
    cfg.base_url = base.to_string();
    cfg.model_name = "primary".into();
    cfg.small_model = "small".into();
    cfg
  }

  #[test]
  fn category_bucketing() {
    assert_eq!(bucket_for_category("Client renewal"), Bucket::Business);
    assert_eq!(bucket_for_category("Prof. Smith's class"), Bucket::Academic);
    assert_eq!(bucket_for_category("vacation plans"), Bucket::Personal);
    assert_eq!(bucket_for_category("ACADEMIC"), Bucket::Academic);
    assert_eq!(bucket_for_category("salary talk"), Bucket::Business);
  }

  #[test]
  fn mock_criteria_count_follows_difficulty() {
    assert_eq!(mock_success_criteria(Difficulty::Beginner).len(), 5);
    assert_eq!(mock_success_criteria(Difficulty::Intermediate).len(), 3);
    assert_eq!(mock_success_criteria(Difficulty::Advanced).len(), 2);
  }

  #[test]
  fn mock_scenario_draws_from_bucket_pool() {
    for _ in 0..20 {
      let s = mock_scenario(Difficulty::Advanced, "company offsite");
      assert!(mock_texts(Bucket::Business).contains(&s.scenario_text.as_str()));
      assert!(MOCK_NAMES.contains(&s.character_name.as_deref().unwrap()));
      assert!(MOCK_ROLES.contains(&s.character_role.as_deref().unwrap()));
      assert_eq!(s.source, ScenarioSource::Mock);
      assert_eq!(s.tone.as_deref(), Some(MOCK_TONE));
    }
  }

  #[test]
  fn guidance_differs_per_difficulty() {
    assert!(difficulty_guidance(Difficulty::Beginner).contains("3-5"));
    assert!(difficulty_guidance(Difficulty::Intermediate).contains("2-3"));
    assert!(difficulty_guidance(Difficulty::Advanced).contains("1-2"));
  }

  #[test]
  fn remote_reply_is_read_leniently() {
    let map = match serde_json::json!({
      "character_name": "Ms. Lopez",
      "scenario_text": "Ask for a budget review.",
      "success_criteria": "1. Be specific 2. Give a date",
    }) {
      Value::Object(m) => m,
      _ => unreachable!(),
    };
    let g = parse_remote(map, Difficulty::Intermediate).unwrap();
    assert_eq!(g.character_name.as_deref(), Some("Ms. Lopez"));
    assert!(g.character_role.is_none());
    assert_eq!(g.success_criteria, vec!["Be specific", "Give a date"]);
    assert_eq!(g.rubric_text, default_rubric_text(Difficulty::Intermediate));
    assert_eq!(g.source, ScenarioSource::Generated);
  }

  #[tokio::test]
  async fn small_model_answers_when_primary_fails() {
    let reply = r#"Here you go: {"character_name": "Ana", "character_role": "Manager", "scenario_text": "Ask for Friday off.", "success_criteria": ["Give reason"], "tone": "warm"}"#;
    let base = spawn_fake_ollama(vec![
      ("primary", FakeReply::Status(503)),
      ("small", FakeReply::Text(reply.into())),
    ], vec![]).await;

    let g = generate_scenario(&Ollama::new(), &Prompts::default(), &cfg_for(&base), Difficulty::Advanced, "work", "tone").await;
    assert_eq!(g.source, ScenarioSource::Generated);
    assert_eq!(g.scenario_text, "Ask for Friday off.");
    assert_eq!(g.success_criteria, vec!["Give reason"]);
  }

  #[tokio::test]
  async fn all_tiers_failing_falls_back_to_mock() {
    let base = spawn_fake_ollama(vec![
      ("primary", FakeReply::Text("I cannot help with that".into())),
      ("small", FakeReply::Text("[]".into())),
    ], vec![]).await;

    let g = generate_scenario(&Ollama::new(), &Prompts::default(), &cfg_for(&base), Difficulty::Beginner, "vacation", "clarity").await;
    assert_eq!(g.source, ScenarioSource::Mock);
    assert!(mock_texts(Bucket::Personal).contains(&g.scenario_text.as_str()));
  }

  #[tokio::test]
  async fn mock_flag_skips_remote_tiers() {
    let mut cfg = cfg_for("http://127.0.0.1:9");
    cfg.use_mock = true;
    let g = generate_scenario(&Ollama::new(), &Prompts::default(), &cfg, Difficulty::Beginner, "prof", "clarity").await;
    assert_eq!(g.source, ScenarioSource::Mock);
  }
}

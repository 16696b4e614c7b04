//! Domain models: difficulty levels, rubric criteria and weights, scenarios, attempts.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How much hand-holding a scenario gives the learner.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
  Beginner,
  Intermediate,
  Advanced,
}

impl Difficulty {
  pub const ALL: [Difficulty; 3] = [Difficulty::Beginner, Difficulty::Intermediate, Difficulty::Advanced];

  pub fn as_str(&self) -> &'static str {
    match self {
      Difficulty::Beginner => "beginner",
      Difficulty::Intermediate => "intermediate",
      Difficulty::Advanced => "advanced",
    }
  }
}

impl fmt::Display for Difficulty {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// The six rubric criteria, in display order.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Criterion {
  Clarity,
  Conciseness,
  Tone,
  Grammar,
  Completeness,
  Politeness,
}

impl Criterion {
  pub const ALL: [Criterion; 6] = [
    Criterion::Clarity,
    Criterion::Conciseness,
    Criterion::Tone,
    Criterion::Grammar,
    Criterion::Completeness,
    Criterion::Politeness,
  ];

  pub fn key(&self) -> &'static str {
    match self {
      Criterion::Clarity => "clarity",
      Criterion::Conciseness => "conciseness",
      Criterion::Tone => "tone",
      Criterion::Grammar => "grammar",
      Criterion::Completeness => "completeness",
      Criterion::Politeness => "politeness",
    }
  }

  pub fn label(&self) -> &'static str {
    match self {
      Criterion::Clarity => "Clarity",
      Criterion::Conciseness => "Conciseness",
      Criterion::Tone => "Tone",
      Criterion::Grammar => "Grammar",
      Criterion::Completeness => "Completeness",
      Criterion::Politeness => "Politeness",
    }
  }
}

/// Per-criterion integer scores. Remote scores are stored as given, so values
/// outside 0..=100 are possible.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Scores {
  pub clarity: i64,
  pub conciseness: i64,
  pub tone: i64,
  pub grammar: i64,
  pub completeness: i64,
  pub politeness: i64,
}

impl Scores {
  pub fn get(&self, c: Criterion) -> i64 {
    match c {
      Criterion::Clarity => self.clarity,
      Criterion::Conciseness => self.conciseness,
      Criterion::Tone => self.tone,
      Criterion::Grammar => self.grammar,
      Criterion::Completeness => self.completeness,
      Criterion::Politeness => self.politeness,
    }
  }

  pub fn set(&mut self, c: Criterion, value: i64) {
    match c {
      Criterion::Clarity => self.clarity = value,
      Criterion::Conciseness => self.conciseness = value,
      Criterion::Tone => self.tone = value,
      Criterion::Grammar => self.grammar = value,
      Criterion::Completeness => self.completeness = value,
      Criterion::Politeness => self.politeness = value,
    }
  }
}

/// Rubric weight per criterion. A key missing from stored JSON reads as 0.
/// Weights are not required to sum to 1.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct RubricWeights {
  #[serde(default)] pub clarity: f64,
  #[serde(default)] pub conciseness: f64,
  #[serde(default)] pub tone: f64,
  #[serde(default)] pub grammar: f64,
  #[serde(default)] pub completeness: f64,
  #[serde(default)] pub politeness: f64,
}

impl Default for RubricWeights {
  fn default() -> Self {
    Self {
      clarity: 0.20,
      conciseness: 0.15,
      tone: 0.20,
      grammar: 0.15,
      completeness: 0.15,
      politeness: 0.15,
    }
  }
}

impl RubricWeights {
  pub fn get(&self, c: Criterion) -> f64 {
    match c {
      Criterion::Clarity => self.clarity,
      Criterion::Conciseness => self.conciseness,
      Criterion::Tone => self.tone,
      Criterion::Grammar => self.grammar,
      Criterion::Completeness => self.completeness,
      Criterion::Politeness => self.politeness,
    }
  }

  /// First criterion whose weight is outside [0, 1], if any.
  pub fn out_of_range(&self) -> Option<(Criterion, f64)> {
    Criterion::ALL
      .iter()
      .map(|c| (*c, self.get(*c)))
      .find(|(_, w)| !(0.0..=1.0).contains(w))
  }
}

/// Where a scenario came from.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioSource {
  Generated, // remote model reply
  Mock,      // local canned generator
  Preset,    // curated catalog
}

/// Which path produced an attempt's scores.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationSource {
  Remote,
  Mock,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Scenario {
  pub id: String,
  #[serde(default)] pub character_name: Option<String>,
  #[serde(default)] pub character_role: Option<String>,
  pub scenario_text: String,
  pub difficulty: Difficulty,
  pub category: String,
  #[serde(default)] pub success_criteria: Vec<String>,
  #[serde(default)] pub rubric_text: Option<String>,
  #[serde(default)] pub tone: Option<String>,
  pub source: ScenarioSource,
  #[serde(default)] pub preset_id: Option<String>,
  #[serde(default)] pub title: Option<String>,
  pub created_at: DateTime<Utc>,
}

/// One scored submission. Never mutated after it is recorded.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Attempt {
  pub id: String,
  pub scenario_id: String,
  #[serde(default)] pub subject: String,
  pub body: String,
  pub scores: Scores,
  pub total: i64,
  #[serde(default)] pub feedback: String,
  #[serde(default)] pub suggestions: Vec<String>,
  #[serde(default)] pub rubric_text: String,
  pub attempt_number: u32,
  pub source: EvaluationSource,
  pub submitted_at: DateTime<Utc>,
}

use serde::Serialize;

use crate::domain::Attempt;
use crate::error::AppError;

pub const CSV_FILENAME: &str = "attempts.csv";

#[derive(Serialize)]
struct AttemptRow<'a> {
  attempt_id: &'a str,
  scenario_id: &'a str,
  subject: &'a str,
  total: i64,
  clarity: i64,
  conciseness: i64,
  tone: i64,
  grammar: i64,
  completeness: i64,
  politeness: i64,
  submitted_at: String,
}

impl<'a> From<&'a Attempt> for AttemptRow<'a> {
  fn from(a: &'a Attempt) -> Self {
    AttemptRow {
      attempt_id: &a.id,
      scenario_id: &a.scenario_id,
      subject: &a.subject,
      total: a.total,
      clarity: a.scores.clarity,
      conciseness: a.scores.conciseness,
      tone: a.scores.tone,
      grammar: a.scores.grammar,
      completeness: a.scores.completeness,
      politeness: a.scores.politeness,
      submitted_at: a.submitted_at.to_rfc3339(),
    }
  }
}

/// Header plus one row per attempt, in the order given. The header is written
/// even when there are no attempts.
pub fn attempts_csv(attempts: &[Attempt]) -> Result<String, AppError> {
  let mut wtr = csv::WriterBuilder::new().has_headers(false).from_writer(Vec::new());
  wtr.write_record([
    "attempt_id",
    "scenario_id",
    "subject",
    "total",
    "clarity",
    "conciseness",
    "tone",
    "grammar",
    "completeness",
    "politeness",
    "submitted_at",
  ])?;
  for a in attempts {
    wtr.serialize(AttemptRow::from(a))?;
  }
  let bytes = wtr.into_inner().map_err(|e| AppError::Export(e.to_string()))?;
  String::from_utf8(bytes).map_err(|e| AppError::Export(e.to_string()))
}

//! Aggregates over the attempt history. Everything here is recomputed per query.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::{Attempt, Criterion};

#[derive(Clone, Copy, Debug, Default, Serialize, PartialEq)]
pub struct AverageScores {
  pub clarity: f64,
  pub conciseness: f64,
  pub tone: f64,
  pub grammar: f64,
  pub completeness: f64,
  pub politeness: f64,
  pub total: f64,
}

impl AverageScores {
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
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct TrendPoint {
  /// 1-based position in submission order.
  pub index: usize,
  pub total: i64,
  pub attempt_id: String,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct SkillAverage {
  pub criterion: &'static str,
  pub label: &'static str,
  pub average: f64,
}

/// Arithmetic mean of each criterion and of the total. All zero when empty.
pub fn average_scores(attempts: &[Attempt]) -> AverageScores {
  if attempts.is_empty() {
    return AverageScores::default();
  }
  AverageScores {
    clarity: mean(attempts, |a| a.scores.clarity),
    conciseness: mean(attempts, |a| a.scores.conciseness),
    tone: mean(attempts, |a| a.scores.tone),
    grammar: mean(attempts, |a| a.scores.grammar),
    completeness: mean(attempts, |a| a.scores.completeness),
    politeness: mean(attempts, |a| a.scores.politeness),
    total: mean(attempts, |a| a.total),
  }
}

fn mean(attempts: &[Attempt], f: impl Fn(&Attempt) -> i64) -> f64 {
  attempts.iter().map(|a| f(a) as f64).sum::<f64>() / attempts.len() as f64
}

/// Distinct calendar dates (UTC) on which anything was submitted.
pub fn practice_dates(attempts: &[Attempt]) -> BTreeSet<NaiveDate> {
  attempts.iter().map(|a| a.submitted_at.date_naive()).collect()
}

/// Length of the run of consecutive days ending at the latest date in `dates`.
pub fn streak_from_dates(dates: &BTreeSet<NaiveDate>) -> u32 {
  let mut days = dates.iter().rev();
  let Some(mut prev) = days.next().copied() else {
    return 0;
  };
  let mut streak = 1;
  for d in days {
    if prev.pred_opt() == Some(*d) {
      streak += 1;
      prev = *d;
    } else {
      break;
    }
  }
  streak
}

pub fn streak_days(attempts: &[Attempt]) -> u32 {
  streak_from_dates(&practice_dates(attempts))
}

/// Totals in submission order. Expects `attempts` chronological.
pub fn total_trend(attempts: &[Attempt]) -> Vec<TrendPoint> {
  attempts
    .iter()
    .enumerate()
    .map(|(i, a)| TrendPoint { index: i + 1, total: a.total, attempt_id: a.id.clone() })
    .collect()
}

pub fn skill_breakdown(attempts: &[Attempt]) -> Vec<SkillAverage> {
  let avg = average_scores(attempts);
  Criterion::ALL
    .iter()
    .map(|c| SkillAverage { criterion: c.key(), label: c.label(), average: avg.get(*c) })
    .collect()
}

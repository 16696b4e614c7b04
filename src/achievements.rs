//! Badge catalog. A badge is unlocked iff its predicate holds over the full
//! chronological history; nothing about unlocks is stored.

use serde::Serialize;

use crate::analytics::practice_dates;
use crate::domain::{Attempt, Criterion};

#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
pub struct Achievement {
  pub id: &'static str,
  pub name: &'static str,
  pub desc: &'static str,
}

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct AchievementStatus {
  #[serde(flatten)]
  pub achievement: Achievement,
  pub unlocked: bool,
}

#[derive(Clone, Copy)]
enum Rule {
  TotalEquals(i64),
  CriterionAtLeast95(Criterion),
  Consistent,
  Comeback,
  DistinctDays,
  ToneEquals73,
}

const MASTERY_SCORE: i64 = 95;
const MASTERY_COUNT: usize = 3;
const CONSISTENT_SCORE: i64 = 80;
const CONSISTENT_COUNT: usize = 5;
const COMEBACK_GAIN: i64 = 20;
const STREAK_DAYS: usize = 3;
const SECRET_TONE: i64 = 73;

const CATALOG: [(Achievement, Rule); 13] = [
  (Achievement { id: "perfect", name: "Perfection!", desc: "Earned a perfect 100% once." }, Rule::TotalEquals(100)),
  (Achievement { id: "zero", name: "Rock Bottom", desc: "Scored 0% once (we all start somewhere)." }, Rule::TotalEquals(0)),
  (Achievement { id: "fifty", name: "Perfectly Average", desc: "Hit exactly 50% once." }, Rule::TotalEquals(50)),
  (
    Achievement { id: "clarity_master", name: "Clarity Master", desc: "Scored ≥95 in Clarity three times." },
    Rule::CriterionAtLeast95(Criterion::Clarity),
  ),
  (
    Achievement { id: "conciseness_master", name: "Conciseness Master", desc: "Scored ≥95 in Conciseness three times." },
    Rule::CriterionAtLeast95(Criterion::Conciseness),
  ),
  (
    Achievement { id: "tone_master", name: "Tone Master", desc: "Scored ≥95 in Tone three times." },
    Rule::CriterionAtLeast95(Criterion::Tone),
  ),
  (
    Achievement { id: "grammar_master", name: "Grammar Master", desc: "Scored ≥95 in Grammar three times." },
    Rule::CriterionAtLeast95(Criterion::Grammar),
  ),
  (
    Achievement { id: "completeness_master", name: "Completeness Master", desc: "Scored ≥95 in Completeness three times." },
    Rule::CriterionAtLeast95(Criterion::Completeness),
  ),
  (
    Achievement { id: "politeness_master", name: "Politeness Master", desc: "Scored ≥95 in Politeness three times." },
    Rule::CriterionAtLeast95(Criterion::Politeness),
  ),
  (Achievement { id: "consistent", name: "Consistent Performer", desc: "Five attempts with 80% or higher." }, Rule::Consistent),
  (Achievement { id: "comeback", name: "Comeback", desc: "Improved by 20+ points in one attempt." }, Rule::Comeback),
  (Achievement { id: "streak", name: "Streak Starter", desc: "Practiced on 3 or more different days." }, Rule::DistinctDays),
  (Achievement { id: "secret", name: "???", desc: "You discovered a secret condition." }, Rule::ToneEquals73),
];

impl Rule {
  /// `attempts` must be in submission order; `Comeback` compares neighbours.
  fn holds(self, attempts: &[Attempt]) -> bool {
    match self {
      Rule::TotalEquals(v) => attempts.iter().any(|a| a.total == v),
      Rule::CriterionAtLeast95(c) => attempts.iter().filter(|a| a.scores.get(c) >= MASTERY_SCORE).count() >= MASTERY_COUNT,
      Rule::Consistent => attempts.iter().filter(|a| a.total >= CONSISTENT_SCORE).count() >= CONSISTENT_COUNT,
      Rule::Comeback => attempts.windows(2).any(|w| w[1].total.saturating_sub(w[0].total) >= COMEBACK_GAIN),
      Rule::DistinctDays => practice_dates(attempts).len() >= STREAK_DAYS,
      Rule::ToneEquals73 => attempts.iter().any(|a| a.scores.tone == SECRET_TONE),
    }
  }
}

/// Badges currently earned, in catalog order.
pub fn unlocked_achievements(attempts: &[Attempt]) -> Vec<Achievement> {
  CATALOG
    .iter()
    .filter(|(_, rule)| rule.holds(attempts))
    .map(|(a, _)| *a)
    .collect()
}

/// Whole catalog with an unlocked flag per badge.
pub fn achievement_status(attempts: &[Attempt]) -> Vec<AchievementStatus> {
  CATALOG
    .iter()
    .map(|(a, rule)| AchievementStatus { achievement: *a, unlocked: rule.holds(attempts) })
    .collect()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::domain::Scores;
  use crate::store::tests::attempt_at;
  use chrono::{Duration, TimeZone, Utc};

  fn history(totals: &[i64]) -> Vec<Attempt> {
    let t0 = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();
    totals
      .iter()
      .enumerate()
      .map(|(i, t)| attempt_at("s", *t, t0 + Duration::minutes(i as i64)))
      .collect()
  }

  fn ids(attempts: &[Attempt]) -> Vec<&'static str> {
    unlocked_achievements(attempts).iter().map(|a| a.id).collect()
  }

  #[test]
  fn empty_history_unlocks_nothing() {
    assert!(unlocked_achievements(&[]).is_empty());
    let status = achievement_status(&[]);
    assert_eq!(status.len(), 13);
    assert!(status.iter().all(|s| !s.unlocked));
  }

  #[test]
  fn comeback_needs_a_twenty_point_jump_between_neighbours() {
    assert!(ids(&history(&[50, 40, 65])).contains(&"comeback"));
    assert!(!ids(&history(&[50, 55, 60])).contains(&"comeback"));
  }

  #[test]
  fn comeback_survives_extreme_remote_totals() {
    assert!(ids(&history(&[i64::MIN, 5])).contains(&"comeback"));
    assert!(!ids(&history(&[i64::MAX, i64::MIN])).contains(&"comeback"));
    assert_eq!(achievement_status(&history(&[i64::MIN, i64::MAX])).len(), 13);
  }

  #[test]
  fn exact_totals() {
    let got = ids(&history(&[100, 0, 50]));
    for id in ["perfect", "zero", "fifty"] {
      assert!(got.contains(&id), "{id}");
    }
    assert!(ids(&history(&[99, 51, 1])).is_empty());
  }

  #[test]
  fn mastery_needs_three_high_scores_in_one_criterion() {
    let mut attempts = history(&[70, 70, 70]);
    for a in attempts.iter_mut().take(2) {
      a.scores.grammar = 95;
    }
    assert!(!ids(&attempts).contains(&"grammar_master"));
    attempts[2].scores.grammar = 100;
    let got = ids(&attempts);
    assert!(got.contains(&"grammar_master"));
    assert!(!got.contains(&"clarity_master"));
  }

  #[test]
  fn consistent_needs_five_totals_at_eighty() {
    assert!(!ids(&history(&[80, 85, 90, 95])).contains(&"consistent"));
    assert!(ids(&history(&[80, 85, 90, 95, 81])).contains(&"consistent"));
  }

  #[test]
  fn streak_badge_counts_distinct_days() {
    let t0 = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();
    let spread = vec![
      attempt_at("s", 10, t0),
      attempt_at("s", 10, t0 + Duration::days(4)),
      attempt_at("s", 10, t0 + Duration::days(9)),
    ];
    assert!(ids(&spread).contains(&"streak"));
    assert!(!ids(&history(&[10, 10, 10])).contains(&"streak"));
  }

  #[test]
  fn secret_is_tone_of_exactly_seventy_three() {
    let mut attempts = history(&[60]);
    attempts[0].scores = Scores { tone: 73, ..Scores::default() };
    assert!(ids(&attempts).contains(&"secret"));
    attempts[0].scores.tone = 74;
    assert!(!ids(&attempts).contains(&"secret"));
  }

  #[test]
  fn status_serializes_flat() {
    let status = achievement_status(&history(&[100]));
    let v = serde_json::to_value(&status[0]).unwrap();
    assert_eq!(v["id"], "perfect");
    assert_eq!(v["unlocked"], true);
  }
}

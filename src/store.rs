//! In-memory scenario and attempt store.
//!
//! Scenarios are immutable once inserted; attempts are append-only. Attempt
//! numbers are assigned while the write lock is held, so concurrent submissions
//! on one scenario never share a number.

use std::collections::HashMap;

use tokio::sync::RwLock;
use tracing::{debug, instrument};

use crate::domain::{Attempt, Scenario};

#[derive(Default)]
struct Inner {
  scenarios: HashMap<String, Scenario>,
  attempts: HashMap<String, Attempt>,
  /// Attempt ids in insertion (= submission) order.
  attempt_order: Vec<String>,
}

#[derive(Default)]
pub struct Store {
  inner: RwLock<Inner>,
}

impl Store {
  pub fn new() -> Self {
    Self::default()
  }

  #[instrument(level = "debug", skip(self, s), fields(id = %s.id))]
  pub async fn insert_scenario(&self, s: Scenario) -> Scenario {
    let mut inner = self.inner.write().await;
    inner.scenarios.insert(s.id.clone(), s.clone());
    s
  }

  pub async fn get_scenario(&self, id: &str) -> Option<Scenario> {
    self.inner.read().await.scenarios.get(id).cloned()
  }

  /// Newest first.
  pub async fn list_scenarios(&self) -> Vec<Scenario> {
    let mut all: Vec<Scenario> = self.inner.read().await.scenarios.values().cloned().collect();
    all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    all
  }

  /// Store `attempt` with the next attempt number for its scenario. Whatever
  /// number the caller put on it is replaced.
  #[instrument(level = "debug", skip(self, attempt), fields(scenario_id = %attempt.scenario_id))]
  pub async fn record_attempt(&self, mut attempt: Attempt) -> Attempt {
    let mut inner = self.inner.write().await;
    let last = inner
      .attempts
      .values()
      .filter(|a| a.scenario_id == attempt.scenario_id)
      .map(|a| a.attempt_number)
      .max()
      .unwrap_or(0);
    attempt.attempt_number = last + 1;

    inner.attempt_order.push(attempt.id.clone());
    inner.attempts.insert(attempt.id.clone(), attempt.clone());
    debug!(target: "email_trainer", id = %attempt.id, number = attempt.attempt_number, "Attempt recorded");
    attempt
  }

  pub async fn get_attempt(&self, id: &str) -> Option<Attempt> {
    self.inner.read().await.attempts.get(id).cloned()
  }

  /// Oldest first, ordered by submission time (ties keep insertion order).
  pub async fn attempts_chronological(&self) -> Vec<Attempt> {
    let inner = self.inner.read().await;
    let mut out: Vec<Attempt> = inner
      .attempt_order
      .iter()
      .filter_map(|id| inner.attempts.get(id).cloned())
      .collect();
    out.sort_by(|a, b| a.submitted_at.cmp(&b.submitted_at));
    out
  }

  /// Newest first, optionally capped.
  pub async fn attempts_recent(&self, limit: Option<usize>) -> Vec<Attempt> {
    let mut out = self.attempts_chronological().await;
    out.reverse();
    if let Some(n) = limit {
      out.truncate(n);
    }
    out
  }

  pub async fn attempts_for_scenario(&self, scenario_id: &str) -> Vec<Attempt> {
    self.attempts_chronological()
      .await
      .into_iter()
      .filter(|a| a.scenario_id == scenario_id)
      .collect()
  }
}

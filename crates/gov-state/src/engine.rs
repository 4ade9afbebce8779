use gov_core::constants::RESERVED_METRIC_IDS;
use gov_core::types::{ActionId, EntityId, EvidenceId, LogicalTimestamp, MetricMutation};
use gov_crypto::chain_hash;
use thiserror::Error;
use tracing::info;

use crate::metric::{MetricRegistry, StateValue, ValidatorKind};
use crate::snapshot::Snapshot;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StateError {
  #[error("reserved metric id: {0}")]
  ReservedMetricId(String),
  #[error("metric not registered: {0}")]
  UnregisteredMetric(String),
  #[error("value failed validator for metric {0}")]
  ValidationFailed(String),
  #[error("global monotonicity violated: {new} < {last}")]
  GlobalMonotonicity { new: String, last: String },
  #[error("per-metric monotonicity violated for {metric}: {new} < {last}")]
  MetricMonotonicity { metric: String, new: String, last: String },
  #[error("mutation set is empty")]
  EmptyMutationSet,
}

/// Per-metric provenance + global snapshot chain, atomic multi-mutation
/// apply. The sole mutation entry point is `apply_mutations`:
/// either every mutation in the set lands, or none does — the draft
/// `KernelState` is built up immutably and only swapped in at the very end.
pub struct StateEngine {
  metrics: MetricRegistry,
  snapshots: Vec<Snapshot>,
}

impl Default for StateEngine {
  fn default() -> Self {
    Self::new()
  }
}

impl StateEngine {
  pub fn new() -> Self {
    Self {
      metrics: MetricRegistry::new(),
      snapshots: vec![Snapshot::genesis()],
    }
  }

  pub fn metrics_mut(&mut self) -> &mut MetricRegistry {
    &mut self.metrics
  }

  pub fn metrics(&self) -> &MetricRegistry {
    &self.metrics
  }

  pub fn current_state(&self) -> &crate::snapshot::KernelState {
    &self.latest_snapshot().state
  }

  pub fn snapshots(&self) -> &[Snapshot] {
    &self.snapshots
  }

  pub fn latest_snapshot(&self) -> &Snapshot {
    self.snapshots.last().expect("genesis snapshot always present")
  }

  /// `validateMutation`: metric id is non-reserved,
  /// registered, and passes its optional validator.
  pub fn validate_mutation(&self, mutation: &MetricMutation) -> Result<(), StateError> {
    let id = mutation.metric_id.as_str();
    if RESERVED_METRIC_IDS.contains(&id) {
      return Err(StateError::ReservedMetricId(id.to_string()));
    }
    let metric = self
      .metrics
      .get(&mutation.metric_id)
      .ok_or_else(|| StateError::UnregisteredMetric(id.to_string()))?;
    if let Some(validator_name) = &metric.validator {
      if let Some(kind) = ValidatorKind::from_name(validator_name) {
        if !kind.check(&mutation.value) {
          return Err(StateError::ValidationFailed(id.to_string()));
        }
      }
    }
    Ok(())
  }

  /// `applyTrusted`: the sole mutation entry point. On any
  /// validation or monotonicity failure, state is left completely
  /// untouched and a new snapshot never materialises. Returns the newly
  /// appended snapshot.
  pub fn apply_mutations(
    &mut self,
    mutations: &[MetricMutation],
    timestamp: LogicalTimestamp,
    _initiator: &EntityId,
    action_id: &ActionId,
    evidence_id: &EvidenceId,
  ) -> Result<&Snapshot, StateError> {
    if mutations.is_empty() {
      return Err(StateError::EmptyMutationSet);
    }

    for m in mutations {
      self.validate_mutation(m)?;
    }

    let current = self.current_state();
    if let Some(last_update) = current.last_update {
      if timestamp < last_update {
        return Err(StateError::GlobalMonotonicity {
          new: timestamp.to_string(),
          last: last_update.to_string(),
        });
      }
    }
    for m in mutations {
      if let Some(existing) = current.metrics.get(&m.metric_id) {
        if timestamp < existing.updated_at {
          return Err(StateError::MetricMonotonicity {
            metric: m.metric_id.to_string(),
            new: timestamp.to_string(),
            last: existing.updated_at.to_string(),
          });
        }
      }
    }

    let mut draft = current.clone();
    for m in mutations {
      let prev_hash = draft
        .metrics
        .get(&m.metric_id)
        .map(|v| v.state_hash.clone())
        .unwrap_or_default();
      let new_state_hash = chain_hash(&prev_hash, evidence_id.as_str());
      draft.metrics.insert(
        m.metric_id.clone(),
        StateValue {
          value: m.value.clone(),
          updated_at: timestamp,
          evidence_hash: evidence_id.to_string(),
          state_hash: new_state_hash,
        },
      );
    }
    draft.version += 1;
    draft.last_update = Some(timestamp);

    let snapshot = self.latest_snapshot().next(draft, action_id.clone(), timestamp);
    self.snapshots.push(snapshot);
    info!(action_id = %action_id, version = self.current_state().version, "state mutations applied atomically");
    Ok(self.latest_snapshot())
  }

  /// `verifyIntegrity`: walk snapshots confirming each
  /// `previousHash` links and each `hash` is reproducible from the
  /// stored state.
  pub fn verify_integrity(&self) -> bool {
    if self.snapshots.first().is_none_or(|g| g.hash != Snapshot::genesis().hash) {
      return false;
    }
    for pair in self.snapshots.windows(2) {
      let (prev, curr) = (&pair[0], &pair[1]);
      if curr.previous_hash != prev.hash {
        return false;
      }
      if curr.hash != curr.recomputed_hash() {
        return false;
      }
    }
    true
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use gov_core::types::{Metric, MetricId, MetricType};
  use serde_json::json;

  fn metric(id: &str) -> Metric {
    Metric {
      id: MetricId::from(id),
      kind: MetricType::Gauge,
      description: "test".into(),
      unit: "u".into(),
      validator: None,
    }
  }

  fn ts(n: u64) -> LogicalTimestamp {
    LogicalTimestamp::new(0, n)
  }

  #[test]
  fn apply_single_mutation() {
    let mut engine = StateEngine::new();
    engine.metrics_mut().register(metric("coin"));
    let mutation = MetricMutation { metric_id: MetricId::from("coin"), value: json!(10) };
    engine
      .apply_mutations(&[mutation], ts(1), &EntityId::from("alice"), &ActionId::from("a1"), &EvidenceId::from("e1"))
      .unwrap();
    assert_eq!(
      engine.current_state().metrics.get(&MetricId::from("coin")).unwrap().value,
      json!(10)
    );
    assert!(engine.verify_integrity());
  }

  #[test]
  fn reserved_metric_rejected() {
    let engine = StateEngine::new();
    let mutation = MetricMutation { metric_id: MetricId::from("__proto__"), value: json!(1) };
    assert_eq!(
      engine.validate_mutation(&mutation),
      Err(StateError::ReservedMetricId("__proto__".into()))
    );
  }

  #[test]
  fn atomic_failure_leaves_state_untouched() {
    let mut engine = StateEngine::new();
    engine.metrics_mut().register(metric("a"));
    // "b" is never registered: the whole batch must fail and leave "a" untouched.
    let good = MetricMutation { metric_id: MetricId::from("a"), value: json!(1) };
    let bad = MetricMutation { metric_id: MetricId::from("b"), value: json!(1) };
    let before = engine.current_state().version;
    let err = engine
      .apply_mutations(
        &[good, bad],
        ts(1),
        &EntityId::from("x"),
        &ActionId::from("a1"),
        &EvidenceId::from("e1"),
      )
      .unwrap_err();
    assert!(matches!(err, StateError::UnregisteredMetric(_)));
    assert_eq!(engine.current_state().version, before);
    assert!(!engine.current_state().metrics.contains_key(&MetricId::from("a")));
  }

  #[test]
  fn per_metric_monotonicity_enforced() {
    let mut engine = StateEngine::new();
    engine.metrics_mut().register(metric("a"));
    let m1 = MetricMutation { metric_id: MetricId::from("a"), value: json!(1) };
    engine
      .apply_mutations(&[m1], ts(10), &EntityId::from("x"), &ActionId::from("a1"), &EvidenceId::from("e1"))
      .unwrap();
    let m2 = MetricMutation { metric_id: MetricId::from("a"), value: json!(2) };
    let err = engine
      .apply_mutations(&[m2], ts(5), &EntityId::from("x"), &ActionId::from("a2"), &EvidenceId::from("e2"))
      .unwrap_err();
    assert!(matches!(err, StateError::GlobalMonotonicity { .. }));
  }
}

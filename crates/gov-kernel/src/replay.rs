use std::collections::HashSet;

use gov_core::types::{ActionId, MetricMutation};
use gov_evidence::{Evidence, EvidenceStatus, EvidenceStore};
use gov_state::StateEngine;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum ReplayError {
  #[error("evidence chain is corrupt (hash mismatch at {0})")]
  CorruptChain(String),
  #[error("SUCCESS evidence {0} is missing its mutation-set metadata")]
  MissingMutationSet(String),
  #[error("replay failed to re-apply mutations for evidence {evidence_id}: {reason}")]
  ReapplyFailed { evidence_id: String, reason: String },
}

/// Deterministically replays `store`'s evidence chain against a fresh
/// `StateEngine`, re-hydrating the seen-action set.
/// Determinism rests on: canonical encoding, an ordered evidence log, pure
/// guard functions (never consulted here — only SUCCESS entries replay),
/// and stable (sorted) metric iteration in Merkle computation.
pub fn replay(store: &dyn EvidenceStore, state: &mut StateEngine) -> Result<HashSet<ActionId>, ReplayError> {
  if !gov_evidence::verify_chain(store) {
    return Err(ReplayError::CorruptChain("evidence self-hash or linkage check failed".into()));
  }

  let mut seen = HashSet::new();
  for evidence in store.chain() {
    if evidence.status != EvidenceStatus::Success {
      continue;
    }
    replay_one(&evidence, state)?;
    seen.insert(evidence.action_id.clone());
  }
  info!(replayed = seen.len(), "replay engine reconstructed kernel state");
  Ok(seen)
}

fn replay_one(evidence: &Evidence, state: &mut StateEngine) -> Result<(), ReplayError> {
  let mutations: Vec<MetricMutation> = serde_json::from_value(
    evidence
      .metadata
      .get("mutations")
      .cloned()
      .ok_or_else(|| ReplayError::MissingMutationSet(evidence.evidence_id.to_string()))?,
  )
  .map_err(|e| ReplayError::ReapplyFailed { evidence_id: evidence.evidence_id.to_string(), reason: e.to_string() })?;

  state
    .apply_mutations(
      &mutations,
      evidence.timestamp,
      &gov_core::types::EntityId::from("replay"),
      &evidence.action_id,
      &evidence.evidence_id,
    )
    .map_err(|e| ReplayError::ReapplyFailed { evidence_id: evidence.evidence_id.to_string(), reason: e.to_string() })?;
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use gov_core::types::{ActionId, LogicalTimestamp, MetricId};
  use gov_evidence::InMemoryEvidenceStore;
  use serde_json::json;

  fn ts(n: u64) -> LogicalTimestamp {
    LogicalTimestamp::new(0, n)
  }

  #[test]
  fn replay_reconstructs_identical_snapshot_chain() {
    let mut live = StateEngine::new();
    live.metrics_mut().register(gov_core::types::Metric {
      id: MetricId::from("coin"),
      kind: gov_core::types::MetricType::Gauge,
      description: "d".into(),
      unit: "u".into(),
      validator: None,
    });

    let mut store = InMemoryEvidenceStore::new();
    let mutation = MetricMutation { metric_id: MetricId::from("coin"), value: json!(10) };

    let evidence = Evidence::new(
      None,
      ActionId::from("a1"),
      EvidenceStatus::Success,
      ts(1),
      "committed".into(),
      json!({ "mutations": [mutation.clone()] }),
    );

    let snapshot = live
      .apply_mutations(&[mutation], ts(1), &gov_core::types::EntityId::from("alice"), &ActionId::from("a1"), &evidence.evidence_id)
      .unwrap()
      .clone();

    store.append(evidence).unwrap();

    let mut fresh = StateEngine::new();
    fresh.metrics_mut().register(gov_core::types::Metric {
      id: MetricId::from("coin"),
      kind: gov_core::types::MetricType::Gauge,
      description: "d".into(),
      unit: "u".into(),
      validator: None,
    });
    let seen = replay(&store, &mut fresh).unwrap();

    assert!(seen.contains(&ActionId::from("a1")));
    assert_eq!(fresh.latest_snapshot().hash, snapshot.hash);
  }
}

use std::collections::BTreeMap;

use gov_core::types::{ActionId, LogicalTimestamp, MetricId};
use gov_crypto::sha256_hex;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::metric::StateValue;

/// The kernel's current materialised view.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KernelState {
  pub metrics: BTreeMap<MetricId, StateValue>,
  pub version: u64,
  pub last_update: Option<LogicalTimestamp>,
}

/// Merkle root over the metrics map sorted by key, each rendered as
/// `key:stateHash`, plus the version.
pub fn global_merkle_root(state: &KernelState) -> String {
  let mut leaves: Vec<String> = state
    .metrics
    .iter()
    .map(|(k, v)| format!("{k}:{}", v.state_hash))
    .collect();
  leaves.sort();
  let joined = format!("{}|{}", leaves.join(","), state.version);
  sha256_hex(joined.as_bytes())
}

/// A Merkle-linked view of the complete kernel state after one committed
/// action.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
  pub state: KernelState,
  pub hash: String,
  pub previous_hash: String,
  pub action_id: Option<ActionId>,
  pub timestamp: LogicalTimestamp,
}

impl Snapshot {
  /// The genesis snapshot: empty state, `hash = H("GENESIS")`.
  pub fn genesis() -> Self {
    Self {
      state: KernelState::default(),
      hash: sha256_hex(b"GENESIS"),
      previous_hash: String::new(),
      action_id: None,
      timestamp: LogicalTimestamp::GENESIS,
    }
  }

  /// Build the successor snapshot for `state`, chaining from `self`.
  pub fn next(&self, state: KernelState, action_id: ActionId, timestamp: LogicalTimestamp) -> Self {
    let merkle_root = global_merkle_root(&state);
    let hash_input = json!([state.version, action_id.0, timestamp.to_string(), merkle_root, self.hash]);
    let hash = sha256_hex(gov_core::canon::canonical_bytes(&hash_input).as_slice());
    Self {
      state,
      hash,
      previous_hash: self.hash.clone(),
      action_id: Some(action_id),
      timestamp,
    }
  }

  /// Recompute `hash` from `state`/`previous_hash`/`action_id`/`timestamp`
  /// and compare against the stored value — used by `verify_integrity`.
  pub fn recomputed_hash(&self) -> String {
    let merkle_root = global_merkle_root(&self.state);
    let action_id_str = self.action_id.as_ref().map(|a| a.0.clone()).unwrap_or_default();
    let hash_input = json!([
      self.state.version,
      action_id_str,
      self.timestamp.to_string(),
      merkle_root,
      self.previous_hash
    ]);
    sha256_hex(gov_core::canon::canonical_bytes(&hash_input).as_slice())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn genesis_hash_is_stable() {
    let g1 = Snapshot::genesis();
    let g2 = Snapshot::genesis();
    assert_eq!(g1.hash, g2.hash);
    assert_eq!(g1.hash, sha256_hex(b"GENESIS"));
  }

  #[test]
  fn chain_links_to_previous() {
    let genesis = Snapshot::genesis();
    let mut state = KernelState::default();
    state.version = 1;
    let next = genesis.next(state, ActionId::from("a1"), LogicalTimestamp::new(0, 1));
    assert_eq!(next.previous_hash, genesis.hash);
    assert_eq!(next.hash, next.recomputed_hash());
  }
}

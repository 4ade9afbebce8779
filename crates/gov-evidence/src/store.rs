use gov_core::types::{ActionId, EvidenceId};
use thiserror::Error;

use crate::evidence::Evidence;

#[derive(Debug, Error)]
pub enum EvidenceStoreError {
    #[error("storage backend error: {0}")]
    Backend(String),
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Pluggable evidence-store port: persistence is an external collaborator,
/// not a kernel concern. The kernel only ever
/// depends on this trait, never on a concrete backend.
pub trait EvidenceStore: Send + Sync {
    fn append(&mut self, evidence: Evidence) -> Result<(), EvidenceStoreError>;
    fn latest(&self) -> Option<Evidence>;
    fn get(&self, id: &EvidenceId) -> Option<Evidence>;
    fn for_action(&self, action_id: &ActionId) -> Vec<Evidence>;
    /// Full chain, oldest first, for replay and integrity verification.
    fn chain(&self) -> Vec<Evidence>;
}

/// Default in-process evidence store. Suitable for tests and for kernels
/// that never crash-restart; crash recovery instead uses a
/// `sled`-backed store behind the `sled-store` feature.
#[derive(Debug, Default)]
pub struct InMemoryEvidenceStore {
    chain: Vec<Evidence>,
}

impl InMemoryEvidenceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EvidenceStore for InMemoryEvidenceStore {
    fn append(&mut self, evidence: Evidence) -> Result<(), EvidenceStoreError> {
        self.chain.push(evidence);
        Ok(())
    }

    fn latest(&self) -> Option<Evidence> {
        self.chain.last().cloned()
    }

    fn get(&self, id: &EvidenceId) -> Option<Evidence> {
        self.chain.iter().find(|e| &e.evidence_id == id).cloned()
    }

    fn for_action(&self, action_id: &ActionId) -> Vec<Evidence> {
        self.chain.iter().filter(|e| &e.action_id == action_id).cloned().collect()
    }

    fn chain(&self) -> Vec<Evidence> {
        self.chain.clone()
    }
}

/// Walk `store`'s chain verifying each entry's self-hash and its link to
/// the previous entry.
pub fn verify_chain(store: &dyn EvidenceStore) -> bool {
    let chain = store.chain();
    let mut prev: Option<EvidenceId> = None;
    for evidence in &chain {
        if !evidence.verify_self() {
            return false;
        }
        if evidence.previous_id != prev {
            return false;
        }
        prev = Some(evidence.evidence_id.clone());
    }
    true
}

use gov_core::types::{ActionId, EvidenceId};

use crate::evidence::Evidence;
use crate::store::{EvidenceStore, EvidenceStoreError};

/// Persistent evidence store backed by sled (pure-Rust, no C dependencies),
/// for kernels that need the chain to survive a crash-restart. One named
/// tree, keyed by the evidence's append order so iteration order matches
/// chain order.
///
///   chain  — u64 be bytes (sequence) → serde_json(Evidence)
pub struct SledEvidenceStore {
    db: sled::Db,
    chain: sled::Tree,
}

impl SledEvidenceStore {
    pub fn open<P: AsRef<std::path::Path>>(path: P) -> Result<Self, EvidenceStoreError> {
        let db = sled::open(path).map_err(|e| EvidenceStoreError::Backend(e.to_string()))?;
        let chain = db.open_tree("chain").map_err(|e| EvidenceStoreError::Backend(e.to_string()))?;
        Ok(Self { db, chain })
    }

    pub fn flush(&self) -> Result<(), EvidenceStoreError> {
        self.db.flush().map_err(|e| EvidenceStoreError::Backend(e.to_string()))?;
        Ok(())
    }

    fn next_key(&self) -> [u8; 8] {
        (self.chain.len() as u64).to_be_bytes()
    }
}

impl EvidenceStore for SledEvidenceStore {
    fn append(&mut self, evidence: Evidence) -> Result<(), EvidenceStoreError> {
        let bytes = serde_json::to_vec(&evidence).map_err(|e| EvidenceStoreError::Serialization(e.to_string()))?;
        self.chain
            .insert(self.next_key(), bytes)
            .map_err(|e| EvidenceStoreError::Backend(e.to_string()))?;
        Ok(())
    }

    fn latest(&self) -> Option<Evidence> {
        self.chain.iter().next_back().and_then(|item| item.ok()).and_then(|(_, v)| serde_json::from_slice(&v).ok())
    }

    fn get(&self, id: &EvidenceId) -> Option<Evidence> {
        self.chain().into_iter().find(|e| &e.evidence_id == id)
    }

    fn for_action(&self, action_id: &ActionId) -> Vec<Evidence> {
        self.chain().into_iter().filter(|e| &e.action_id == action_id).collect()
    }

    fn chain(&self) -> Vec<Evidence> {
        self.chain
            .iter()
            .filter_map(|item| item.ok())
            .filter_map(|(_, v)| serde_json::from_slice(&v).ok())
            .collect()
    }
}

use gov_core::canon::canonical_bytes;
use gov_core::types::{ActionId, EvidenceId, LogicalTimestamp};
use gov_crypto::sha256_hex;
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Lifecycle status recorded for one `Action` as it moves through
/// Submit → Guard → Commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EvidenceStatus {
    Attempt,
    Accepted,
    Reject,
    Aborted,
    Success,
    Failure,
}

/// A single hash-chained, tamper-evident log entry.
///
/// `evidence_id = H(canonical([prev, actionId, status, timestamp, H(reason), H(canonical(metadata))]))`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Evidence {
    pub evidence_id: EvidenceId,
    pub previous_id: Option<EvidenceId>,
    pub action_id: ActionId,
    pub status: EvidenceStatus,
    pub timestamp: LogicalTimestamp,
    pub reason: String,
    pub metadata: serde_json::Value,
}

impl Evidence {
    /// Append-time constructor: derives `evidence_id` from `previous_id`
    /// and the rest of the record, so the id is never independently
    /// forgeable.
    pub fn new(
        previous_id: Option<EvidenceId>,
        action_id: ActionId,
        status: EvidenceStatus,
        timestamp: LogicalTimestamp,
        reason: String,
        metadata: serde_json::Value,
    ) -> Self {
        let evidence_id = Self::compute_id(&previous_id, &action_id, status, timestamp, &reason, &metadata);
        Self { evidence_id: EvidenceId::from(evidence_id), previous_id, action_id, status, timestamp, reason, metadata }
    }

    fn compute_id(
        previous_id: &Option<EvidenceId>,
        action_id: &ActionId,
        status: EvidenceStatus,
        timestamp: LogicalTimestamp,
        reason: &str,
        metadata: &serde_json::Value,
    ) -> String {
        let prev = previous_id.as_ref().map(|p| p.to_string()).unwrap_or_default();
        let reason_hash = sha256_hex(reason.as_bytes());
        let metadata_hash = sha256_hex(canonical_bytes(metadata).as_slice());
        let status_str = serde_json::to_value(status).unwrap();
        let envelope = json!([prev, action_id.0, status_str, timestamp.to_string(), reason_hash, metadata_hash]);
        sha256_hex(canonical_bytes(&envelope).as_slice())
    }

    /// Recompute `evidence_id` from the stored fields and compare — used to
    /// detect tampering when walking the chain.
    pub fn verify_self(&self) -> bool {
        let recomputed =
            Self::compute_id(&self.previous_id, &self.action_id, self.status, self.timestamp, &self.reason, &self.metadata);
        recomputed == self.evidence_id.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_is_deterministic() {
        let e1 = Evidence::new(None, ActionId::from("a1"), EvidenceStatus::Attempt, LogicalTimestamp::new(0, 1), "submitted".into(), json!({}));
        let e2 = Evidence::new(None, ActionId::from("a1"), EvidenceStatus::Attempt, LogicalTimestamp::new(0, 1), "submitted".into(), json!({}));
        assert_eq!(e1.evidence_id, e2.evidence_id);
    }

    #[test]
    fn chained_ids_differ_from_unchained() {
        let e1 = Evidence::new(None, ActionId::from("a1"), EvidenceStatus::Attempt, LogicalTimestamp::new(0, 1), "submitted".into(), json!({}));
        let e2 = Evidence::new(Some(e1.evidence_id.clone()), ActionId::from("a1"), EvidenceStatus::Accepted, LogicalTimestamp::new(0, 2), "guard passed".into(), json!({}));
        assert_ne!(e1.evidence_id, e2.evidence_id);
        assert!(e2.verify_self());
    }

    #[test]
    fn tampering_is_detected() {
        let mut e = Evidence::new(None, ActionId::from("a1"), EvidenceStatus::Attempt, LogicalTimestamp::new(0, 1), "submitted".into(), json!({}));
        e.reason = "tampered".into();
        assert!(!e.verify_self());
    }
}

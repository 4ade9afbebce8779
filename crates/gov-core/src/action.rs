//! Action identity and signing-string construction.
//!
//! Hashing and signature verification themselves live in `gov-crypto`; this
//! module only builds the canonical byte strings those primitives operate
//! over, so that `gov-core` stays free of a cryptography dependency.

use crate::canon::canonical_string;
use crate::types::{EntityId, LogicalTimestamp, Payload};

fn timestamp_field(ts: &Option<LogicalTimestamp>) -> String {
  match ts {
    Some(t) => t.to_string(),
    None => "null".to_string(),
  }
}

/// The byte string hashed (SHA-256) to derive `actionId`.
pub fn action_id_input(
  initiator: &EntityId,
  payload: &Payload,
  timestamp: LogicalTimestamp,
  expires_at: Option<LogicalTimestamp>,
) -> String {
  let payload_json = serde_json::to_value(payload).expect("Payload always serializes");
  format!(
    "{}:{}:{}:{}",
    initiator,
    canonical_string(&payload_json),
    timestamp,
    timestamp_field(&expires_at)
  )
}

/// The byte string signed (ed25519) by the initiator:
/// `actionId ‖ ":" ‖ initiator ‖ ":" ‖ canonical(payload) ‖ ":" ‖ timestamp ‖ ":" ‖ expiresAt`.
pub fn signing_string(
  action_id: &str,
  initiator: &EntityId,
  payload: &Payload,
  timestamp: LogicalTimestamp,
  expires_at: Option<LogicalTimestamp>,
) -> String {
  let payload_json = serde_json::to_value(payload).expect("Payload always serializes");
  format!(
    "{}:{}:{}:{}:{}",
    action_id,
    initiator,
    canonical_string(&payload_json),
    timestamp,
    timestamp_field(&expires_at)
  )
}

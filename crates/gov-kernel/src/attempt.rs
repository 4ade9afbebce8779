use gov_core::types::{Action, AttemptId, EntityId, LogicalTimestamp, ProtocolId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttemptStatus {
  Pending,
  Accepted,
  Rejected,
  Committed,
  Aborted,
}

/// Transient in-flight action record, lives only between submit and
/// commit/reject.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attempt {
  pub id: AttemptId,
  pub initiator: EntityId,
  pub protocol_id: Option<ProtocolId>,
  pub action: Action,
  pub cost: u64,
  pub timestamp: LogicalTimestamp,
  pub status: AttemptStatus,
}

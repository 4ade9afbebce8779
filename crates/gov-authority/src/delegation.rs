use gov_core::types::{AuthorityId, EntityId, LogicalTimestamp};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DelegationStatus {
  Active,
  Revoked,
}

/// Per-capacity numeric ceiling a delegation may carry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Limits {
  pub max_value: f64,
}

/// An authority (delegation) record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Delegation {
  pub authority_id: AuthorityId,
  pub granter: EntityId,
  pub grantee: EntityId,
  pub capacity: String,
  pub jurisdiction: String,
  pub timestamp: LogicalTimestamp,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub expires_at: Option<LogicalTimestamp>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub limits: Option<Limits>,
  pub status: DelegationStatus,
  pub signature: String,
}

impl Delegation {
  pub fn is_active(&self) -> bool {
    self.status == DelegationStatus::Active
  }

  pub fn has_expired(&self, now: LogicalTimestamp) -> bool {
    matches!(self.expires_at, Some(exp) if now > exp)
  }
}

/// Context accompanying an `authorized()` query.
#[derive(Debug, Clone, Copy)]
pub struct AuthorizationContext {
  pub time: LogicalTimestamp,
  pub value: Option<f64>,
}

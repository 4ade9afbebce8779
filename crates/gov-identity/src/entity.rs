use gov_core::types::{EntityId, LogicalTimestamp};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EntityType {
  Actor,
  System,
  Asset,
  Office,
  Abstract,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EntityStatus {
  Active,
  Revoked,
}

/// Identity registry element. `parents` forms a DAG; cycles and
/// re-registration of a revoked id are rejected by the registry, never by
/// this struct itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
  pub id: EntityId,
  /// Hex-encoded ed25519 public key.
  pub public_key: String,
  #[serde(rename = "type")]
  pub kind: EntityType,
  pub status: EntityStatus,
  pub parents: Vec<EntityId>,
  pub created_at: LogicalTimestamp,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub revoked_at: Option<LogicalTimestamp>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub is_root: Option<bool>,
}

impl Entity {
  pub fn is_active(&self) -> bool {
    self.status == EntityStatus::Active
  }

  pub fn is_root(&self) -> bool {
    self.is_root.unwrap_or(false)
  }
}

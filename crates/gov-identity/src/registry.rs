use std::collections::{HashMap, HashSet};

use gov_core::types::{EntityId, LogicalTimestamp};
use thiserror::Error;
use tracing::{info, warn};

use crate::entity::{Entity, EntityStatus, EntityType};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IdentityError {
  #[error("entity already registered: {0}")]
  AlreadyRegistered(String),
  #[error("entity id was revoked and cannot be re-registered: {0}")]
  Resurrection(String),
  #[error("unknown parent entity: {0}")]
  UnknownParent(String),
  #[error("registering {0} would create a cycle in the parents DAG")]
  CycleDetected(String),
  #[error("root entities cannot be revoked: {0}")]
  RootCannotBeRevoked(String),
  #[error("entity not found: {0}")]
  NotFound(String),
}

/// In-memory identity registry. All writes happen only through
/// privileged kernel entry points; reads are non-blocking.
#[derive(Debug, Default)]
pub struct IdentityRegistry {
  entities: HashMap<EntityId, Entity>,
  /// Ids that have ever existed, including revoked ones — enforces
  /// invariant I2 ("no resurrection") even after an entity is pruned.
  ever_registered: HashSet<EntityId>,
}

impl IdentityRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn get(&self, id: &EntityId) -> Option<&Entity> {
    self.entities.get(id)
  }

  pub fn is_registered(&self, id: &EntityId) -> bool {
    self.entities.contains_key(id)
  }

  pub fn is_active(&self, id: &EntityId) -> bool {
    self.entities.get(id).is_some_and(Entity::is_active)
  }

  /// Register a new entity. Rejects re-creation of a revoked id (I2) and
  /// runs an iterative DFS over `parents` to refuse cycles (I4).
  pub fn register(
    &mut self,
    id: EntityId,
    public_key: String,
    kind: EntityType,
    parents: Vec<EntityId>,
    created_at: LogicalTimestamp,
    is_root: bool,
  ) -> Result<(), IdentityError> {
    if self.ever_registered.contains(&id) {
      if self.entities.contains_key(&id) {
        return Err(IdentityError::AlreadyRegistered(id.to_string()));
      }
      return Err(IdentityError::Resurrection(id.to_string()));
    }

    if parents.iter().any(|p| p == &id) {
      return Err(IdentityError::CycleDetected(id.to_string()));
    }

    for parent in &parents {
      if !self.entities.contains_key(parent) {
        return Err(IdentityError::UnknownParent(parent.to_string()));
      }
    }

    if self.would_cycle(&id, &parents) {
      return Err(IdentityError::CycleDetected(id.to_string()));
    }

    let entity = Entity {
      id: id.clone(),
      public_key,
      kind,
      status: EntityStatus::Active,
      parents,
      created_at,
      revoked_at: None,
      is_root: if is_root { Some(true) } else { None },
    };
    self.ever_registered.insert(id.clone());
    self.entities.insert(id.clone(), entity);
    info!(entity = %id, "entity registered");
    Ok(())
  }

  /// Iterative DFS: would adding `id` with `parents` create a cycle?
  /// Since `id` is new, a cycle can only occur if `id` is reachable from
  /// one of its own proposed parents — impossible for a fresh id unless
  /// a parent's ancestry path is malformed. This also guards against
  /// self-parenting and duplicate-parent loops introduced by callers.
  fn would_cycle(&self, id: &EntityId, parents: &[EntityId]) -> bool {
    if parents.iter().any(|p| p == id) {
      return true;
    }
    let mut stack: Vec<&EntityId> = parents.iter().collect();
    let mut visited: HashSet<&EntityId> = HashSet::new();
    while let Some(current) = stack.pop() {
      if current == id {
        return true;
      }
      if !visited.insert(current) {
        continue;
      }
      if let Some(entity) = self.entities.get(current) {
        stack.extend(entity.parents.iter());
      }
    }
    false
  }

  /// Revoke an entity (I1: roots are never revoked).
  pub fn revoke(&mut self, id: &EntityId, now: LogicalTimestamp) -> Result<(), IdentityError> {
    let entity = self
      .entities
      .get_mut(id)
      .ok_or_else(|| IdentityError::NotFound(id.to_string()))?;
    if entity.is_root() {
      return Err(IdentityError::RootCannotBeRevoked(id.to_string()));
    }
    entity.status = EntityStatus::Revoked;
    entity.revoked_at = Some(now);
    warn!(entity = %id, "entity revoked");
    Ok(())
  }

  /// All entities currently REVOKED — used to empty scope caches downstream.
  pub fn revoked_ids(&self) -> impl Iterator<Item = &EntityId> {
    self.entities
      .values()
      .filter(|e| e.status == EntityStatus::Revoked)
      .map(|e| &e.id)
  }
}

use gov_core::constants::is_sentinel_signature;
use gov_core::types::{AuthorityId, EntityId, LogicalTimestamp};
use gov_identity::IdentityRegistry;
use thiserror::Error;
use tracing::{info, warn};

use crate::capacity::covers;
use crate::delegation::{AuthorizationContext, Delegation, DelegationStatus, Limits};

#[derive(Debug, Error)]
pub enum AuthorityError {
  #[error("granter not active: {0}")]
  GranterNotActive(String),
  #[error("grantee not active: {0}")]
  GranteeNotActive(String),
  #[error("granter not authorized to delegate {capacity}:{jurisdiction}")]
  ScopeAmplification { capacity: String, jurisdiction: String },
  #[error("signature invalid")]
  SignatureInvalid,
  #[error("authority record not found: {0}")]
  NotFound(String),
}

/// Delegation graph. Holds an append-only vector of records;
/// `revoke` only ever flips `status`, never removes an entry — the log of
/// who was once authorized for what is never lost.
#[derive(Debug, Default)]
pub struct AuthorityEngine {
  delegations: Vec<Delegation>,
}

impl AuthorityEngine {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn all(&self) -> &[Delegation] {
    &self.delegations
  }

  pub fn get(&self, id: &AuthorityId) -> Option<&Delegation> {
    self.delegations.iter().find(|d| &d.authority_id == id)
  }

  /// Grant `(capacity, jurisdiction)` from `granter` to `grantee`.
  ///
  /// Enforces non-escalation: the
  /// granter must already be authorized for what it grants, unless it is
  /// root or the signature is the governance sentinel.
  #[allow(clippy::too_many_arguments)]
  pub fn grant(
    &mut self,
    registry: &IdentityRegistry,
    authority_id: AuthorityId,
    granter: EntityId,
    grantee: EntityId,
    capacity: String,
    jurisdiction: String,
    timestamp: LogicalTimestamp,
    expires_at: Option<LogicalTimestamp>,
    limits: Option<Limits>,
    signature: String,
  ) -> Result<(), AuthorityError> {
    if !registry.is_active(&granter) {
      return Err(AuthorityError::GranterNotActive(granter.to_string()));
    }
    if !registry.is_active(&grantee) {
      return Err(AuthorityError::GranteeNotActive(grantee.to_string()));
    }

    let granter_is_root = registry.get(&granter).is_some_and(|e| e.is_root());
    if !granter_is_root && !is_sentinel_signature(&signature) {
      let ctx = AuthorizationContext { time: timestamp, value: None };
      if !self.authorized(registry, &granter, &capacity, &jurisdiction, ctx) {
        return Err(AuthorityError::ScopeAmplification { capacity, jurisdiction });
      }
    }

    let delegation = Delegation {
      authority_id: authority_id.clone(),
      granter: granter.clone(),
      grantee: grantee.clone(),
      capacity: capacity.clone(),
      jurisdiction: jurisdiction.clone(),
      timestamp,
      expires_at,
      limits,
      status: DelegationStatus::Active,
      signature,
    };
    self.delegations.push(delegation);
    info!(authority = %authority_id, %granter, %grantee, %capacity, %jurisdiction, "authority granted");
    Ok(())
  }

  pub fn revoke(&mut self, authority_id: &AuthorityId) -> Result<(), AuthorityError> {
    let delegation = self
      .delegations
      .iter_mut()
      .find(|d| &d.authority_id == authority_id)
      .ok_or_else(|| AuthorityError::NotFound(authority_id.to_string()))?;
    delegation.status = DelegationStatus::Revoked;
    warn!(authority = %authority_id, "authority revoked");
    Ok(())
  }

  /// Recursive liveness check.
  ///
  /// Returns true iff there exists an active, unexpired delegation chain
  /// from a root (or the governance sentinel) down to `entity` covering
  /// `(capacity, jurisdiction)` with `context.value` inside any numeric
  /// limit along the chain. Revocation of any delegation in the chain —
  /// or of any intermediate entity — deauthorizes every descendant on
  /// the very next call; nothing is cached.
  pub fn authorized(
    &self,
    registry: &IdentityRegistry,
    entity: &EntityId,
    capacity: &str,
    jurisdiction: &str,
    context: AuthorizationContext,
  ) -> bool {
    self.authorized_inner(registry, entity, capacity, jurisdiction, context, 0)
  }

  fn authorized_inner(
    &self,
    registry: &IdentityRegistry,
    entity: &EntityId,
    capacity: &str,
    jurisdiction: &str,
    context: AuthorizationContext,
    depth: usize,
  ) -> bool {
    // Bound recursion depth against pathological delegation chains;
    // well-formed grants can never form a cycle since every delegation
    // points strictly backward in time.
    if depth > 64 {
      return false;
    }
    let Some(entity_record) = registry.get(entity) else {
      return false;
    };
    if entity_record.is_root() {
      return true;
    }
    if !entity_record.is_active() {
      return false;
    }

    self.delegations.iter().any(|d| {
      d.grantee == *entity
        && d.is_active()
        && !d.has_expired(context.time)
        && covers(&d.capacity, capacity)
        && covers(&d.jurisdiction, jurisdiction)
        && limit_satisfied(d.limits, context.value)
        && self.authorized_inner(
          registry,
          &d.granter,
          &d.capacity,
          &d.jurisdiction,
          context,
          depth + 1,
        )
    })
  }
}

fn limit_satisfied(limits: Option<Limits>, value: Option<f64>) -> bool {
  match (limits, value) {
    (Some(l), Some(v)) => v <= l.max_value,
    (Some(_), None) => false,
    (None, _) => true,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use gov_identity::EntityType;

  fn ts(n: u64) -> LogicalTimestamp {
    LogicalTimestamp::new(0, n)
  }

  fn setup() -> (IdentityRegistry, AuthorityEngine, EntityId, EntityId, EntityId) {
    let mut registry = IdentityRegistry::new();
    let root = EntityId::from("root");
    let p1 = EntityId::from("p1");
    let p2 = EntityId::from("p2");
    registry
      .register(root.clone(), "pk".into(), EntityType::System, vec![], ts(0), true)
      .unwrap();
    registry
      .register(p1.clone(), "pk".into(), EntityType::Actor, vec![root.clone()], ts(1), false)
      .unwrap();
    registry
      .register(p2.clone(), "pk".into(), EntityType::Actor, vec![root.clone()], ts(1), false)
      .unwrap();
    (registry, AuthorityEngine::new(), root, p1, p2)
  }

  #[test]
  fn revocation_propagates_to_descendants() {
    let (registry, mut engine, root, p1, p2) = setup();
    let ctx = AuthorizationContext { time: ts(10), value: None };

    engine
      .grant(
        &registry,
        AuthorityId::from("d1"),
        root.clone(),
        p1.clone(),
        "*".into(),
        "*".into(),
        ts(2),
        None,
        None,
        "GOVERNANCE_SIGNATURE".into(),
      )
      .unwrap();
    engine
      .grant(
        &registry,
        AuthorityId::from("d2"),
        p1.clone(),
        p2.clone(),
        "METRIC.WRITE".into(),
        "metric.a".into(),
        ts(3),
        None,
        None,
        "GOVERNANCE_SIGNATURE".into(),
      )
      .unwrap();

    assert!(engine.authorized(&registry, &p2, "METRIC.WRITE", "metric.a", ctx));

    engine.revoke(&AuthorityId::from("d1")).unwrap();
    assert!(!engine.authorized(&registry, &p2, "METRIC.WRITE", "metric.a", ctx));
  }

  #[test]
  fn grant_without_scope_is_rejected() {
    let (registry, mut engine, _root, p1, p2) = setup();
    let err = engine
      .grant(
        &registry,
        AuthorityId::from("d1"),
        p1,
        p2,
        "METRIC.WRITE".into(),
        "metric.a".into(),
        ts(1),
        None,
        None,
        "sig-not-sentinel".into(),
      )
      .unwrap_err();
    assert!(matches!(err, AuthorityError::ScopeAmplification { .. }));
  }

  #[test]
  fn limit_enforced() {
    let (registry, mut engine, root, p1, _p2) = setup();
    engine
      .grant(
        &registry,
        AuthorityId::from("d1"),
        root,
        p1.clone(),
        "METRIC.WRITE".into(),
        "metric.a".into(),
        ts(1),
        None,
        Some(Limits { max_value: 100.0 }),
        "GOVERNANCE_SIGNATURE".into(),
      )
      .unwrap();
    let ok_ctx = AuthorizationContext { time: ts(2), value: Some(50.0) };
    let over_ctx = AuthorizationContext { time: ts(2), value: Some(500.0) };
    assert!(engine.authorized(&registry, &p1, "METRIC.WRITE", "metric.a", ok_ctx));
    assert!(!engine.authorized(&registry, &p1, "METRIC.WRITE", "metric.a", over_ctx));
  }
}

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use gov_authority::{AuthorityEngine, Limits};
use gov_core::constants::{CAPACITY_GOVERNANCE_WILDCARD, MIN_OVERRIDE_SIGNATURES};
use gov_core::error::{GovError, Rejection, RejectionCode};
use gov_core::types::{
  Action, ActionId, AttemptId, AuthorityId, EntityId, LogicalTimestamp, MetricMutation, ProtocolId, WallClockMs,
};
use gov_evidence::{Evidence, EvidenceStatus, EvidenceStore};
use gov_guards::{check_budget, check_multisig, run_guard_battery, GuardContext, PressureCounters};
use gov_identity::{EntityType, IdentityRegistry};
use gov_protocol::ProtocolEngine;
use gov_state::StateEngine;
use serde_json::json;
use tracing::{info, warn};

use crate::attempt::{Attempt, AttemptStatus};
use crate::replay;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
  Uninitialized,
  Constituted,
  Active,
  Suspended,
  Violated,
  Recovered,
  Dissolved,
}

/// Critical rejection codes that trigger automatic revocation of the
/// initiator, except when rehearsal or root.
const CRITICAL_CODES: [RejectionCode; 3] =
  [RejectionCode::SignatureInvalid, RejectionCode::OverscopeAttempt, RejectionCode::RevokedEntity];

/// Result of a completed commit.
#[derive(Debug, Clone)]
pub struct CommitRecord {
  pub attempt_id: AttemptId,
  pub old_state_hash: String,
  pub new_state_hash: String,
  pub cost: u64,
  pub timestamp: LogicalTimestamp,
  pub status: AttemptStatus,
}

struct KernelInner {
  lifecycle: Lifecycle,
  identity: IdentityRegistry,
  authority: AuthorityEngine,
  state: StateEngine,
  protocols: ProtocolEngine,
  evidence: Box<dyn EvidenceStore>,
  attempts: HashMap<AttemptId, Attempt>,
  seen_actions: HashSet<ActionId>,
  pressure: PressureCounters,
}

/// The orchestrator. Holds the attempts map, the seen-action
/// set, and the lifecycle state behind a single lock, matching the
/// concurrency model's single-kernel-lock-across-guard-and-commit
/// requirement: `seenActions`, `attempts`, and `snapshots` are
/// never modified with interleaving.
pub struct Kernel {
  inner: Mutex<KernelInner>,
}

impl Kernel {
  /// Constructs a fresh, empty kernel in CONSTITUTED state. Call
  /// [`Kernel::boot`] to run the Replay Engine and transition to ACTIVE.
  pub fn new(evidence: Box<dyn EvidenceStore>) -> Self {
    Self {
      inner: Mutex::new(KernelInner {
        lifecycle: Lifecycle::Constituted,
        identity: IdentityRegistry::new(),
        authority: AuthorityEngine::new(),
        state: StateEngine::new(),
        protocols: ProtocolEngine::new(),
        evidence,
        attempts: HashMap::new(),
        seen_actions: HashSet::new(),
        pressure: PressureCounters::new(),
      }),
    }
  }

  /// Runs the Replay Engine against the kernel's own evidence store and
  /// transitions CONSTITUTED -> ACTIVE. Must be
  /// called exactly once, before any submit/guard/commit call.
  pub fn boot(&self) -> Result<(), GovError> {
    let mut inner = self.inner.lock().expect("kernel mutex poisoned");
    if inner.lifecycle != Lifecycle::Constituted {
      return Err(GovError::LifecycleViolation(format!("{:?}", inner.lifecycle)));
    }
    let seen = replay::replay(inner.evidence.as_ref(), &mut inner.state).map_err(|e| GovError::ReplayMismatch(e.to_string()))?;
    inner.seen_actions = seen;
    inner.lifecycle = Lifecycle::Active;
    info!("kernel replay complete, transitioning to ACTIVE");
    Ok(())
  }

  /// Registers the founding root entity directly, bypassing the
  /// GOVERNANCE:* check that every other entity-creation path requires.
  /// Only callable before [`Kernel::boot`] — there is no authorized caller
  /// yet at that point, root included.
  pub fn bootstrap_root(&self, id: EntityId, public_key: String, now: LogicalTimestamp) -> Result<(), GovError> {
    let mut inner = self.inner.lock().expect("kernel mutex poisoned");
    if inner.lifecycle != Lifecycle::Constituted {
      return Err(GovError::LifecycleViolation(format!("{:?}", inner.lifecycle)));
    }
    inner.identity.register(id, public_key, EntityType::System, vec![], now, true).map_err(|e| GovError::Other(e.to_string()))?;
    Ok(())
  }

  /// Registers a metric schema. Metric-schema setup is not a
  /// governance-gated privileged operation — it is plain
  /// configuration, open to any caller with access to the kernel handle.
  pub fn register_metric(&self, metric: gov_core::types::Metric) {
    let mut inner = self.inner.lock().expect("kernel mutex poisoned");
    inner.state.metrics_mut().register(metric);
  }

  fn require_active(inner: &KernelInner) -> Result<(), GovError> {
    if inner.lifecycle == Lifecycle::Active {
      Ok(())
    } else {
      Err(GovError::LifecycleViolation(format!("{:?}", inner.lifecycle)))
    }
  }

  // ── Two-phase pipeline ────────────────────────────────────────────────────

  /// `submitAttempt`. Inserts into the attempts map and
  /// appends an ATTEMPT evidence, unless `payload.rehearsal`.
  pub fn submit_attempt(&self, protocol_id: Option<ProtocolId>, action: Action, cost: u64) -> Result<AttemptId, GovError> {
    let mut inner = self.inner.lock().expect("kernel mutex poisoned");
    Self::require_active(&inner)?;

    let attempt_id = AttemptId::from(action.action_id.as_str());
    let rehearsal = action.payload.is_rehearsal();
    let action_timestamp = action.timestamp;

    if !rehearsal {
      let latest = inner.evidence.latest();
      let evidence = Evidence::new(
        latest.map(|e| e.evidence_id),
        action.action_id.clone(),
        EvidenceStatus::Attempt,
        action.timestamp,
        "submitted".into(),
        json!({}),
      );
      inner.evidence.append(evidence).map_err(|e| GovError::Storage(e.to_string()))?;
    }

    let attempt = Attempt {
      id: attempt_id.clone(),
      initiator: action.initiator.clone(),
      protocol_id,
      action,
      cost,
      timestamp: action_timestamp,
      status: AttemptStatus::Pending,
    };
    inner.attempts.insert(attempt_id.clone(), attempt);
    Ok(attempt_id)
  }

  /// `guardAttempt`. Runs the guard battery, logs
  /// ACCEPTED/REJECT evidence, and on a critical rejection code triggers
  /// automatic revocation of the initiator (unless rehearsal or root).
  pub fn guard_attempt(&self, id: &AttemptId, now_ms: WallClockMs) -> Result<(), Rejection> {
    let mut inner = self.inner.lock().expect("kernel mutex poisoned");
    let attempt = match inner.attempts.get(id) {
      Some(a) => a.clone(),
      None => {
        return Err(Rejection::new(
          RejectionCode::DataIntegrity,
          "guardAttempt",
          "attempt must exist",
          format!("no such attempt {id}"),
        ))
      }
    };
    let rehearsal = attempt.action.payload.is_rehearsal();
    let distinct_approvals = count_distinct_approvals(&attempt.action);
    let protocol_active = |pid: &ProtocolId| inner.protocols.is_active(pid);

    let ctx = GuardContext {
      action: &attempt.action,
      identity: &inner.identity,
      authority: &inner.authority,
      state: &inner.state,
      now_ms,
      seen_actions: &inner.seen_actions,
      distinct_approvals,
      protocol_active: &protocol_active,
    };
    let result = run_guard_battery(&ctx, &mut inner.pressure);

    match &result {
      Ok(()) => {
        if let Some(a) = inner.attempts.get_mut(id) {
          a.status = AttemptStatus::Accepted;
        }
        if !rehearsal {
          let latest = inner.evidence.latest();
          let evidence = Evidence::new(
            latest.map(|e| e.evidence_id),
            attempt.action.action_id.clone(),
            EvidenceStatus::Accepted,
            attempt.action.timestamp,
            "guard accepted".into(),
            json!({}),
          );
          let _ = inner.evidence.append(evidence);
        }
      }
      Err(rejection) => {
        if let Some(a) = inner.attempts.get_mut(id) {
          a.status = AttemptStatus::Rejected;
        }
        if !rehearsal {
          let latest = inner.evidence.latest();
          let evidence = Evidence::new(
            latest.map(|e| e.evidence_id),
            attempt.action.action_id.clone(),
            EvidenceStatus::Reject,
            attempt.action.timestamp,
            rejection.message.clone(),
            serde_json::to_value(rejection).unwrap_or(json!({})),
          );
          let _ = inner.evidence.append(evidence);
        }

        let initiator_is_root = inner.identity.get(&attempt.action.initiator).is_some_and(|e| e.is_root());
        if !rehearsal && !initiator_is_root && CRITICAL_CODES.contains(&rejection.code) {
          warn!(initiator = %attempt.action.initiator, code = ?rejection.code, "critical rejection, auto-revoking initiator");
          let _ = inner.identity.revoke(&attempt.action.initiator, attempt.action.timestamp);
        }
      }
    }
    result
  }

  /// `commitAttempt`. Requires ACCEPTED. Evaluates the
  /// protocol side-effect set, validates every mutation, and either
  /// applies the whole set atomically or aborts with none of it visible.
  pub fn commit_attempt(&self, id: &AttemptId, budget: u64) -> Result<CommitRecord, GovError> {
    let mut inner = self.inner.lock().expect("kernel mutex poisoned");
    Self::require_active(&inner)?;

    let attempt = inner
      .attempts
      .get(id)
      .cloned()
      .ok_or_else(|| GovError::Other(format!("no such attempt {id}")))?;
    if attempt.status != AttemptStatus::Accepted {
      return Err(GovError::LifecycleViolation(format!("attempt {id} is not ACCEPTED")));
    }

    check_budget(attempt.cost, budget).map_err(GovError::Rejected)?;

    let rehearsal = attempt.action.payload.is_rehearsal();
    let primary_mutation = MetricMutation { metric_id: attempt.action.payload.metric_id.clone(), value: attempt.action.payload.value.clone() };

    let side_effects = match inner.protocols.evaluate(&inner.state, &primary_mutation) {
      Ok(m) => m,
      Err(e) => {
        Self::abort(&mut inner, &attempt, &e.to_string(), rehearsal);
        return Err(GovError::ProtocolViolation(e.to_string()));
      }
    };

    let mut all_mutations = vec![primary_mutation];
    all_mutations.extend(side_effects);

    for m in &all_mutations {
      if let Err(e) = inner.state.validate_mutation(m) {
        Self::abort(&mut inner, &attempt, &e.to_string(), rehearsal);
        return Err(GovError::DataIntegrity(e.to_string()));
      }
    }

    if rehearsal {
      return Ok(CommitRecord {
        attempt_id: id.clone(),
        old_state_hash: "REHEARSAL".into(),
        new_state_hash: "REHEARSAL".into(),
        cost: attempt.cost,
        timestamp: attempt.action.timestamp,
        status: AttemptStatus::Committed,
      });
    }

    let old_hash = inner.evidence.latest().map(|e| e.evidence_id.to_string()).unwrap_or_default();
    let latest = inner.evidence.latest();
    let success_metadata = json!({ "mutations": all_mutations });
    let evidence = Evidence::new(
      latest.map(|e| e.evidence_id),
      attempt.action.action_id.clone(),
      EvidenceStatus::Success,
      attempt.action.timestamp,
      "committed".into(),
      success_metadata,
    );
    inner.evidence.append(evidence.clone()).map_err(|e| GovError::Storage(e.to_string()))?;

    inner
      .state
      .apply_mutations(&all_mutations, attempt.action.timestamp, &attempt.action.initiator, &attempt.action.action_id, &evidence.evidence_id)
      .map_err(|e| GovError::DataIntegrity(e.to_string()))?;

    inner.seen_actions.insert(attempt.action.action_id.clone());
    if let Some(a) = inner.attempts.get_mut(id) {
      a.status = AttemptStatus::Committed;
    }

    Ok(CommitRecord {
      attempt_id: id.clone(),
      old_state_hash: old_hash,
      new_state_hash: evidence.evidence_id.to_string(),
      cost: attempt.cost,
      timestamp: attempt.action.timestamp,
      status: AttemptStatus::Committed,
    })
  }

  fn abort(inner: &mut KernelInner, attempt: &Attempt, reason: &str, rehearsal: bool) {
    if let Some(a) = inner.attempts.get_mut(&attempt.id) {
      a.status = AttemptStatus::Aborted;
    }
    if !rehearsal {
      let latest = inner.evidence.latest();
      let evidence = Evidence::new(
        latest.map(|e| e.evidence_id),
        attempt.action.action_id.clone(),
        EvidenceStatus::Aborted,
        attempt.action.timestamp,
        reason.to_string(),
        json!({}),
      );
      let _ = inner.evidence.append(evidence);
    }
  }

  /// Convenience wrapper performing submit -> guard -> commit with a
  /// default cost of 1, against the given commit budget.
  pub fn execute(&self, action: Action, protocol_id: Option<ProtocolId>, budget: u64, now_ms: WallClockMs) -> Result<CommitRecord, GovError> {
    let attempt_id = self.submit_attempt(protocol_id, action, 1)?;
    self.guard_attempt(&attempt_id, now_ms).map_err(GovError::Rejected)?;
    self.commit_attempt(&attempt_id, budget)
  }

  /// Privileged override path: requires GOVERNANCE:OVERRIDE
  /// authorization and at least `MIN_OVERRIDE_SIGNATURES` distinct valid
  /// signatures over the justification. Bypasses protocol binding.
  pub fn override_action(
    &self,
    action: Action,
    justification: String,
    signatures: Vec<String>,
    signer_keys: Vec<String>,
  ) -> Result<CommitRecord, GovError> {
    let mut inner = self.inner.lock().expect("kernel mutex poisoned");
    Self::require_active(&inner)?;

    let ctx = gov_authority::AuthorizationContext { time: action.timestamp, value: None };
    if !inner.authority.authorized(&inner.identity, &action.initiator, CAPACITY_GOVERNANCE_WILDCARD, "*", ctx) {
      return Err(GovError::OverscopeAttempt { capacity: CAPACITY_GOVERNANCE_WILDCARD.into(), jurisdiction: "*".into() });
    }
    check_multisig(justification.as_bytes(), &signatures, &signer_keys, MIN_OVERRIDE_SIGNATURES).map_err(GovError::Rejected)?;

    let mutation = MetricMutation { metric_id: action.payload.metric_id.clone(), value: action.payload.value.clone() };
    inner.state.validate_mutation(&mutation).map_err(|e| GovError::DataIntegrity(e.to_string()))?;

    let latest = inner.evidence.latest();
    let evidence = Evidence::new(
      latest.map(|e| e.evidence_id),
      action.action_id.clone(),
      EvidenceStatus::Success,
      action.timestamp,
      justification,
      json!({ "mutations": [mutation.clone()], "override": true }),
    );
    inner.evidence.append(evidence.clone()).map_err(|e| GovError::Storage(e.to_string()))?;
    inner
      .state
      .apply_mutations(&[mutation], action.timestamp, &action.initiator, &action.action_id, &evidence.evidence_id)
      .map_err(|e| GovError::DataIntegrity(e.to_string()))?;
    inner.seen_actions.insert(action.action_id.clone());

    Ok(CommitRecord {
      attempt_id: AttemptId::from(action.action_id.as_str()),
      old_state_hash: String::new(),
      new_state_hash: evidence.evidence_id.to_string(),
      cost: 0,
      timestamp: action.timestamp,
      status: AttemptStatus::Committed,
    })
  }

  // ── Privileged operations ─────────────────────────────────────────────────
  // Require the caller to be authorized for GOVERNANCE:* and log their own
  // SUCCESS evidence.

  fn require_governance(inner: &KernelInner, caller: &EntityId, now: LogicalTimestamp) -> Result<(), GovError> {
    let ctx = gov_authority::AuthorizationContext { time: now, value: None };
    if inner.authority.authorized(&inner.identity, caller, CAPACITY_GOVERNANCE_WILDCARD, "*", ctx) {
      Ok(())
    } else {
      Err(GovError::OverscopeAttempt { capacity: CAPACITY_GOVERNANCE_WILDCARD.into(), jurisdiction: "*".into() })
    }
  }

  fn log_privileged_success(inner: &mut KernelInner, action_id: ActionId, now: LogicalTimestamp, message: &str) {
    let latest = inner.evidence.latest();
    let evidence = Evidence::new(latest.map(|e| e.evidence_id), action_id, EvidenceStatus::Success, now, message.to_string(), json!({}));
    let _ = inner.evidence.append(evidence);
  }

  #[allow(clippy::too_many_arguments)]
  pub fn create_entity(
    &self,
    caller: &EntityId,
    id: EntityId,
    public_key: String,
    kind: EntityType,
    parents: Vec<EntityId>,
    now: LogicalTimestamp,
    is_root: bool,
  ) -> Result<(), GovError> {
    let mut inner = self.inner.lock().expect("kernel mutex poisoned");
    Self::require_active(&inner)?;
    Self::require_governance(&inner, caller, now)?;
    inner.identity.register(id.clone(), public_key, kind, parents, now, is_root).map_err(|e| GovError::Other(e.to_string()))?;
    Self::log_privileged_success(&mut inner, ActionId::from(format!("create-entity:{id}")), now, "entity created");
    Ok(())
  }

  /// `caller` must hold `GOVERNANCE:*` to invoke this privileged entry
  /// point; `granter` is the entity recorded as the delegation's source
  /// and is usually, but need not be, the same entity as `caller` (e.g.
  /// the governance authority acting on behalf of an intermediate
  /// delegate it is re-keying).
  #[allow(clippy::too_many_arguments)]
  pub fn grant_authority(
    &self,
    caller: &EntityId,
    granter: EntityId,
    authority_id: AuthorityId,
    grantee: EntityId,
    capacity: String,
    jurisdiction: String,
    now: LogicalTimestamp,
    expires_at: Option<LogicalTimestamp>,
    limits: Option<Limits>,
    signature: String,
  ) -> Result<(), GovError> {
    let mut inner = self.inner.lock().expect("kernel mutex poisoned");
    Self::require_active(&inner)?;
    Self::require_governance(&inner, caller, now)?;
    inner
      .authority
      .grant(&inner.identity, authority_id.clone(), granter, grantee, capacity, jurisdiction, now, expires_at, limits, signature)
      .map_err(|e| GovError::Other(e.to_string()))?;
    Self::log_privileged_success(&mut inner, ActionId::from(format!("grant-authority:{authority_id}")), now, "authority granted");
    Ok(())
  }

  pub fn revoke_authority(&self, caller: &EntityId, authority_id: AuthorityId, now: LogicalTimestamp) -> Result<(), GovError> {
    let mut inner = self.inner.lock().expect("kernel mutex poisoned");
    Self::require_active(&inner)?;
    Self::require_governance(&inner, caller, now)?;
    inner.authority.revoke(&authority_id).map_err(|e| GovError::Other(e.to_string()))?;
    Self::log_privileged_success(&mut inner, ActionId::from(format!("revoke-authority:{authority_id}")), now, "authority revoked");
    Ok(())
  }

  pub fn revoke_entity(&self, caller: &EntityId, id: EntityId, now: LogicalTimestamp) -> Result<(), GovError> {
    let mut inner = self.inner.lock().expect("kernel mutex poisoned");
    Self::require_active(&inner)?;
    Self::require_governance(&inner, caller, now)?;
    inner.identity.revoke(&id, now).map_err(|e| GovError::Other(e.to_string()))?;
    Self::log_privileged_success(&mut inner, ActionId::from(format!("revoke-entity:{id}")), now, "entity revoked");
    Ok(())
  }

  // ── Read-only accessors ───────────────────────────────────────────────────

  pub fn with_state_view<R>(&self, f: impl FnOnce(crate::views::StateView) -> R) -> R {
    let inner = self.inner.lock().expect("kernel mutex poisoned");
    f(crate::views::StateView::new(&inner.state))
  }

  pub fn with_evidence_view<R>(&self, f: impl FnOnce(crate::views::EvidenceView) -> R) -> R {
    let inner = self.inner.lock().expect("kernel mutex poisoned");
    f(crate::views::EvidenceView::new(inner.evidence.as_ref()))
  }

  pub fn with_authority_view<R>(&self, f: impl FnOnce(crate::views::AuthorityView) -> R) -> R {
    let inner = self.inner.lock().expect("kernel mutex poisoned");
    f(crate::views::AuthorityView::new(&inner.authority, &inner.identity))
  }

  pub fn register_protocol(&self, protocol: gov_protocol::Protocol) {
    let mut inner = self.inner.lock().expect("kernel mutex poisoned");
    inner.protocols.register(protocol);
  }

  pub fn lifecycle(&self) -> Lifecycle {
    self.inner.lock().expect("kernel mutex poisoned").lifecycle
  }
}

fn count_distinct_approvals(action: &Action) -> usize {
  action.payload.approvals.as_ref().map(|v| v.iter().collect::<HashSet<_>>().len()).unwrap_or(0)
}

#[cfg(test)]
mod tests {
  use super::*;
  use gov_core::types::Payload;
  use gov_evidence::InMemoryEvidenceStore;

  fn ts(epoch: u64, logical: u64) -> LogicalTimestamp {
    LogicalTimestamp::new(epoch, logical)
  }

  fn action(id: &str, initiator: &str, metric: &str, value: serde_json::Value, when: LogicalTimestamp, signature: &str) -> Action {
    Action {
      action_id: ActionId::from(id),
      initiator: EntityId::from(initiator),
      payload: Payload {
        metric_id: metric.into(),
        value,
        protocol_id: None,
        irreversible: None,
        rehearsal: None,
        kind: None,
        owner: None,
        synthesizer: None,
        dissent: None,
        approvals: None,
      },
      timestamp: when,
      expires_at: None,
      signature: signature.to_string(),
    }
  }

  // Basic lifecycle/bootstrap smoke test. The named end-to-end scenarios
  // (THREAT-01/02/03, C-2, C-3, crash recovery) live in tests/scenarios.rs
  // as integration tests against the public Kernel API.
  #[test]
  fn bootstrap_root_then_boot_then_execute() {
    let kernel = Kernel::new(Box::new(InMemoryEvidenceStore::new()));
    kernel.bootstrap_root(EntityId::from("root"), "pk-root".into(), ts(0, 0)).unwrap();
    kernel.register_metric(gov_core::types::Metric {
      id: "coin".into(),
      kind: gov_core::types::MetricType::Gauge,
      description: "test metric".into(),
      unit: "u".into(),
      validator: None,
    });
    kernel.boot().unwrap();
    assert_eq!(kernel.lifecycle(), Lifecycle::Active);

    let a = action("a1", "root", "coin", serde_json::json!(10), ts(1_000, 1), gov_core::constants::SENTINEL_TRUSTED);
    let record = kernel.execute(a, None, 10, 2_000).unwrap();
    assert_eq!(record.status, AttemptStatus::Committed);
  }

  #[test]
  fn bootstrap_root_rejected_after_boot() {
    let kernel = Kernel::new(Box::new(InMemoryEvidenceStore::new()));
    kernel.boot().unwrap();
    let err = kernel.bootstrap_root(EntityId::from("root"), "pk-root".into(), ts(0, 0)).unwrap_err();
    assert!(matches!(err, GovError::LifecycleViolation(_)));
  }
}

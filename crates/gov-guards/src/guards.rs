use gov_core::constants::{is_sentinel_signature, CAPACITY_METRIC_WRITE_PREFIX, MIN_IRREVERSIBLE_APPROVALS, PROTOCOL_ID_ROOT, PROTOCOL_ID_SYSTEM};
use gov_core::error::{Rejection, RejectionCode};
use gov_crypto::verify_hex;

use crate::context::GuardContext;
use crate::invariants;

/// A guard is a pure function `(context) -> Ok | Reject`. None of them
/// mutate anything reachable from `GuardContext`.
pub trait Guard {
    fn name(&self) -> &'static str;
    fn check(&self, ctx: &GuardContext) -> Result<(), Rejection>;
}

fn reject(code: RejectionCode, invariant_id: &str, boundary: &str, message: impl Into<String>) -> Rejection {
    Rejection::new(code, invariant_id, boundary, message)
}

/// 1. Runs the §4.2 static invariant battery.
pub struct InvariantGuard;

impl Guard for InvariantGuard {
    fn name(&self) -> &'static str {
        "InvariantGuard"
    }

    fn check(&self, ctx: &GuardContext) -> Result<(), Rejection> {
        invariants::check_signature_format(ctx.action)?;
        invariants::check_initiator_registered(ctx.action, ctx.identity)?;
        invariants::check_initiator_active(ctx.action, ctx.identity)?;
        invariants::check_finite_value(ctx.action)?;
        invariants::check_clock_skew(ctx.action, ctx.now_ms)?;
        invariants::check_payload_size(ctx.action)?;
        invariants::check_action_id_present(ctx.action)?;
        invariants::check_metric_id_present(ctx.action)?;
        Ok(())
    }
}

/// 2. Looks up the initiator's public key, reconstructs the canonical
/// signing string, and verifies the ed25519 signature (unless sentinel).
pub struct SignatureGuard;

impl Guard for SignatureGuard {
    fn name(&self) -> &'static str {
        "SignatureGuard"
    }

    fn check(&self, ctx: &GuardContext) -> Result<(), Rejection> {
        let action = ctx.action;
        if is_sentinel_signature(&action.signature) {
            return Ok(());
        }
        let Some(entity) = ctx.identity.get(&action.initiator) else {
            return Err(reject(
                RejectionCode::SignatureInvalid,
                "SignatureGuard",
                "initiator must be resolvable to verify a signature",
                format!("unknown initiator {}", action.initiator),
            ));
        };
        let signing_string = gov_core::action::signing_string(
            action.action_id.as_str(),
            action.initiator.as_str(),
            &action.payload,
            action.timestamp,
            action.expires_at,
        );
        if verify_hex(signing_string.as_bytes(), &action.signature, &entity.public_key) {
            Ok(())
        } else {
            Err(reject(
                RejectionCode::SignatureInvalid,
                "SignatureGuard",
                "signature must verify against initiator's public key",
                format!("invalid signature for action {}", action.action_id),
            ))
        }
    }
}

/// 3. Asks the Authority Engine whether `initiator` is authorized for
/// `METRIC.WRITE:<metricId>` in `{time, value}`.
pub struct ScopeGuard;

impl Guard for ScopeGuard {
    fn name(&self) -> &'static str {
        "ScopeGuard"
    }

    fn check(&self, ctx: &GuardContext) -> Result<(), Rejection> {
        let action = ctx.action;
        let capacity = CAPACITY_METRIC_WRITE_PREFIX;
        let jurisdiction = action.payload.metric_id.as_str();
        let auth_ctx = gov_authority::AuthorizationContext {
            time: action.timestamp,
            value: action.payload.value.as_f64(),
        };
        if ctx.authority.authorized(ctx.identity, &action.initiator, capacity, jurisdiction, auth_ctx) {
            Ok(())
        } else {
            Err(reject(
                RejectionCode::OverscopeAttempt,
                "ScopeGuard",
                "initiator must be authorized for METRIC.WRITE over the target metric",
                format!("{} is not authorized to write {}", action.initiator, jurisdiction),
            ))
        }
    }
}

/// 4. Enforces monotonic ordering: globally against `KernelState.lastUpdate`
/// and per-metric against that metric's last recorded update.
pub struct TimeGuard;

impl Guard for TimeGuard {
    fn name(&self) -> &'static str {
        "TimeGuard"
    }

    fn check(&self, ctx: &GuardContext) -> Result<(), Rejection> {
        let action = ctx.action;
        let state = ctx.state.current_state();
        if let Some(last_update) = state.last_update {
            if action.timestamp < last_update {
                return Err(reject(
                    RejectionCode::TemporalParadox,
                    "TimeGuard",
                    "action timestamp must not precede KernelState.lastUpdate",
                    format!("action {} timestamp precedes last global update", action.action_id),
                ));
            }
        }
        if let Some(existing) = state.metrics.get(&action.payload.metric_id) {
            if action.timestamp < existing.updated_at {
                return Err(reject(
                    RejectionCode::TemporalParadox,
                    "TimeGuard",
                    "action timestamp must not precede the metric's last update",
                    format!("action {} timestamp precedes metric {} history", action.action_id, action.payload.metric_id),
                ));
            }
        }
        Ok(())
    }
}

/// 5. Rejects if `actionId` has already been committed.
pub struct ReplayGuard;

impl Guard for ReplayGuard {
    fn name(&self) -> &'static str {
        "ReplayGuard"
    }

    fn check(&self, ctx: &GuardContext) -> Result<(), Rejection> {
        if ctx.seen_actions.contains(&ctx.action.action_id) {
            Err(reject(
                RejectionCode::ReplayDetected,
                "ReplayGuard",
                "actionId must not already be in the seen-set",
                format!("action {} already committed", ctx.action.action_id),
            ))
        } else {
            Ok(())
        }
    }
}

/// 6. If `payload.irreversible = true`, requires >= 2 distinct approvals.
pub struct IrreversibilityGuard;

impl Guard for IrreversibilityGuard {
    fn name(&self) -> &'static str {
        "IrreversibilityGuard"
    }

    fn check(&self, ctx: &GuardContext) -> Result<(), Rejection> {
        if !ctx.action.payload.is_irreversible() {
            return Ok(());
        }
        if ctx.distinct_approvals >= MIN_IRREVERSIBLE_APPROVALS {
            Ok(())
        } else {
            Err(reject(
                RejectionCode::IrreversibilityViolation,
                "IrreversibilityGuard",
                "irreversible actions require at least 2 distinct approvals",
                format!("got {} approvals", ctx.distinct_approvals),
            ))
        }
    }
}

/// 7. If `payload.type = COLLECTIVE`, requires `owner`, `synthesizer`, and
/// an explicit (possibly null, but present) `dissent`.
pub struct CollectiveGuard;

impl Guard for CollectiveGuard {
    fn name(&self) -> &'static str {
        "CollectiveGuard"
    }

    fn check(&self, ctx: &GuardContext) -> Result<(), Rejection> {
        let payload = &ctx.action.payload;
        if !payload.is_collective() {
            return Ok(());
        }
        if payload.owner.is_none() || payload.synthesizer.is_none() || payload.dissent.is_none() {
            Err(reject(
                RejectionCode::ProtocolViolation,
                "CollectiveGuard",
                "collective actions require owner, synthesizer, and an explicit dissent field",
                format!("action {} is missing a collective field", ctx.action.action_id),
            ))
        } else {
            Ok(())
        }
    }
}

/// 8. If `protocolId` is not one of the exempt system ids, the protocol
/// must be registered and ACTIVE (per `ctx.protocol_active`).
pub struct ProtocolBindingGuard;

impl Guard for ProtocolBindingGuard {
    fn name(&self) -> &'static str {
        "ProtocolBindingGuard"
    }

    fn check(&self, ctx: &GuardContext) -> Result<(), Rejection> {
        let Some(protocol_id) = &ctx.action.payload.protocol_id else {
            return Ok(());
        };
        if protocol_id.as_str() == PROTOCOL_ID_SYSTEM || protocol_id.as_str() == PROTOCOL_ID_ROOT {
            return Ok(());
        }
        if (ctx.protocol_active)(protocol_id) {
            Ok(())
        } else {
            Err(reject(
                RejectionCode::ProtocolViolation,
                "ProtocolBindingGuard",
                "bound protocol must be registered and ACTIVE",
                format!("protocol {protocol_id} is not active"),
            ))
        }
    }
}

/// MultiSigGuard (override path): requires >= `min_signatures`
/// distinct valid signatures from `signer_keys`. Invoked directly by
/// `Kernel::override`, not part of the standard guard battery.
pub fn check_multisig(
    message: &[u8],
    signatures: &[String],
    signer_keys: &[String],
    min_signatures: usize,
) -> Result<(), Rejection> {
    let mut verified = std::collections::HashSet::new();
    for sig in signatures {
        for key in signer_keys {
            if verified.contains(key) {
                continue;
            }
            if verify_hex(message, sig, key) {
                verified.insert(key.clone());
                break;
            }
        }
    }
    if verified.len() >= min_signatures {
        Ok(())
    } else {
        Err(reject(
            RejectionCode::SignatureInvalid,
            "MultiSigGuard",
            "override requires at least the configured number of distinct valid signatures",
            format!("got {} distinct valid signatures, need {}", verified.len(), min_signatures),
        ))
    }
}

/// BudgetGuard (commit-stage): the attempt's cost must not
/// exceed the remaining budget. Invoked directly by `Kernel::commitAttempt`.
pub fn check_budget(cost: u64, budget: u64) -> Result<(), Rejection> {
    if cost <= budget {
        Ok(())
    } else {
        Err(reject(
            RejectionCode::BudgetExhausted,
            "BudgetGuard",
            "attempt cost must not exceed remaining budget",
            format!("need {cost}, have {budget}"),
        ))
    }
}

use gov_core::error::Rejection;

use crate::context::GuardContext;
use crate::guards::{
    CollectiveGuard, Guard, InvariantGuard, IrreversibilityGuard, ProtocolBindingGuard, ReplayGuard, ScopeGuard,
    SignatureGuard, TimeGuard,
};
use crate::pressure::PressureCounters;

/// Runs the §4.3 guard battery in its fixed order, short-circuiting on the
/// first rejection. Feeds the rejecting guard's invariant id into
/// `pressure` for diagnostics.
pub fn run_guard_battery(ctx: &GuardContext, pressure: &mut PressureCounters) -> Result<(), Rejection> {
    let guards: [&dyn Guard; 8] = [
        &InvariantGuard,
        &SignatureGuard,
        &ScopeGuard,
        &TimeGuard,
        &ReplayGuard,
        &IrreversibilityGuard,
        &CollectiveGuard,
        &ProtocolBindingGuard,
    ];
    for guard in guards {
        if let Err(rejection) = guard.check(ctx) {
            pressure.record(&rejection.invariant_id);
            return Err(rejection);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use gov_authority::AuthorityEngine;
    use gov_core::types::{Action, LogicalTimestamp, Payload};
    use gov_identity::{EntityType, IdentityRegistry};
    use gov_state::StateEngine;
    use serde_json::json;
    use std::collections::HashSet;

    #[test]
    fn battery_short_circuits_on_first_failure() {
        let mut registry = IdentityRegistry::new();
        registry
            .register("root".into(), "pk".into(), EntityType::System, vec![], LogicalTimestamp::new(0, 0), true)
            .unwrap();
        let authority = AuthorityEngine::new();
        let state = StateEngine::new();
        let seen = HashSet::new();
        let action = Action {
            action_id: "a1".into(),
            initiator: "ghost".into(),
            payload: Payload {
                metric_id: "coin".into(),
                value: json!(1),
                protocol_id: None,
                irreversible: None,
                rehearsal: None,
                kind: None,
                owner: None,
                synthesizer: None,
                dissent: None,
                approvals: None,
            },
            timestamp: LogicalTimestamp::new(0, 1),
            expires_at: None,
            signature: "TRUSTED".into(),
        };
        let protocol_active = |_: &gov_core::types::ProtocolId| false;
        let ctx = GuardContext {
            action: &action,
            identity: &registry,
            authority: &authority,
            state: &state,
            now_ms: 0,
            seen_actions: &seen,
            distinct_approvals: 0,
            protocol_active: &protocol_active,
        };
        let mut pressure = PressureCounters::new();
        let err = run_guard_battery(&ctx, &mut pressure).unwrap_err();
        // "ghost" is unregistered: InvariantGuard (INV-ID-02) fires first.
        assert_eq!(err.invariant_id, "INV-ID-02");
    }
}

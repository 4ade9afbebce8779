use std::collections::HashSet;

use gov_authority::AuthorityEngine;
use gov_core::types::{Action, ActionId, ProtocolId, WallClockMs};
use gov_identity::IdentityRegistry;
use gov_state::StateEngine;

/// Everything a guard needs to evaluate one action, borrowed for the
/// duration of `guardAttempt`. No guard mutates anything reachable from
/// here.
///
/// `protocol_active` is a closure rather than a direct dependency on the
/// protocol engine: guards sit below the protocol layer in the dependency
/// order, so the kernel supplies the lookup the same way the state layer
/// supplies parent-existence checks to DAG validation.
pub struct GuardContext<'a> {
    pub action: &'a Action,
    pub identity: &'a IdentityRegistry,
    pub authority: &'a AuthorityEngine,
    pub state: &'a StateEngine,
    pub now_ms: WallClockMs,
    pub seen_actions: &'a HashSet<ActionId>,
    pub distinct_approvals: usize,
    pub protocol_active: &'a dyn Fn(&ProtocolId) -> bool,
}

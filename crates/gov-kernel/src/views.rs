use gov_authority::{AuthorityEngine, AuthorizationContext, Delegation};
use gov_core::types::{EntityId, MetricId};
use gov_evidence::{Evidence, EvidenceStore};
use gov_identity::{Entity, IdentityRegistry};
use gov_state::{KernelState, Snapshot, StateValue};

/// Read-only borrowing wrapper over the state layer: external readers get a
/// thin view, never the mutable engine itself.
pub struct StateView<'a> {
    state: &'a gov_state::StateEngine,
}

impl<'a> StateView<'a> {
    pub fn new(state: &'a gov_state::StateEngine) -> Self {
        Self { state }
    }

    pub fn metric(&self, id: &MetricId) -> Option<&StateValue> {
        self.state.current_state().metrics.get(id)
    }

    pub fn current_state(&self) -> &KernelState {
        self.state.current_state()
    }

    pub fn snapshots(&self) -> &[Snapshot] {
        self.state.snapshots()
    }

    pub fn verify_integrity(&self) -> bool {
        self.state.verify_integrity()
    }
}

pub struct EvidenceView<'a> {
    store: &'a dyn EvidenceStore,
}

impl<'a> EvidenceView<'a> {
    pub fn new(store: &'a dyn EvidenceStore) -> Self {
        Self { store }
    }

    pub fn latest(&self) -> Option<Evidence> {
        self.store.latest()
    }

    pub fn full_history(&self) -> Vec<Evidence> {
        self.store.chain()
    }

    pub fn verify_chain(&self) -> bool {
        gov_evidence::verify_chain(self.store)
    }
}

pub struct AuthorityView<'a> {
    authority: &'a AuthorityEngine,
    identity: &'a IdentityRegistry,
}

impl<'a> AuthorityView<'a> {
    pub fn new(authority: &'a AuthorityEngine, identity: &'a IdentityRegistry) -> Self {
        Self { authority, identity }
    }

    pub fn authorized(&self, entity: &EntityId, capacity: &str, jurisdiction: &str, ctx: AuthorizationContext) -> bool {
        self.authority.authorized(self.identity, entity, capacity, jurisdiction, ctx)
    }

    pub fn delegations(&self) -> &[Delegation] {
        self.authority.all()
    }

    pub fn entity(&self, id: &EntityId) -> Option<&Entity> {
        self.identity.get(id)
    }
}

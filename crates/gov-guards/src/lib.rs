pub mod battery;
pub mod context;
pub mod guards;
pub mod invariants;
pub mod pressure;

pub use battery::run_guard_battery;
pub use context::GuardContext;
pub use guards::{
    check_budget, check_multisig, CollectiveGuard, Guard, InvariantGuard, IrreversibilityGuard, ProtocolBindingGuard,
    ReplayGuard, ScopeGuard, SignatureGuard, TimeGuard,
};
pub use pressure::PressureCounters;

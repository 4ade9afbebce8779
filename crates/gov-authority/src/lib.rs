pub mod capacity;
pub mod delegation;
pub mod engine;

pub use capacity::covers;
pub use delegation::{AuthorizationContext, Delegation, DelegationStatus, Limits};
pub use engine::{AuthorityEngine, AuthorityError};

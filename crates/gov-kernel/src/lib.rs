pub mod attempt;
pub mod kernel;
pub mod replay;
pub mod views;

pub use attempt::{Attempt, AttemptStatus};
pub use kernel::{CommitRecord, Kernel, Lifecycle};
pub use replay::ReplayError;
pub use views::{AuthorityView, EvidenceView, StateView};

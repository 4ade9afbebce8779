pub mod engine;
pub mod predicate;
pub mod protocol;
pub mod rule;

pub use engine::{ProtocolEngine, ProtocolError};
pub use predicate::{Predicate, ThresholdOp};
pub use protocol::{Lifecycle, Protocol};
pub use rule::Rule;

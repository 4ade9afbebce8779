pub mod engine;
pub mod metric;
pub mod snapshot;

pub use engine::{StateEngine, StateError};
pub use metric::{MetricRegistry, StateValue, ValidatorKind};
pub use snapshot::{global_merkle_root, KernelState, Snapshot};

pub mod evidence;
pub mod store;

#[cfg(feature = "sled-store")]
pub mod sled_store;

pub use evidence::{Evidence, EvidenceStatus};
pub use store::{verify_chain, EvidenceStore, EvidenceStoreError, InMemoryEvidenceStore};

#[cfg(feature = "sled-store")]
pub use sled_store::SledEvidenceStore;

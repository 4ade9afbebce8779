pub mod action;
pub mod canon;
pub mod constants;
pub mod error;
pub mod types;

pub use error::{GovError, Rejection, RejectionCode};
pub use types::*;

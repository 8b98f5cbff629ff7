//! Signed Commitment Verification
//!
//! Nothing the log reports about its own size is used until it has passed
//! through [`CommitmentVerifier`].

pub mod commitment;
pub mod consistency;
pub mod log_root;

pub use commitment::{CommitmentVerifier, VerifiedState};
pub use consistency::ConsistencyGuard;
pub use log_root::LogRootV1;

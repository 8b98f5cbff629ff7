//! Transparency Log Service
//!
//! Client and wire types for the remote append-only log: public key lookup,
//! signed tree heads, entry lookup by index and entry submission.

pub mod client;
pub mod types;

pub use client::LogClient;
pub use types::{CreatedEntry, LogEntryPayload, LogInfo, RawEntry, SignedCommitment, SignedTreeHead};

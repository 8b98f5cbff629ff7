//! Persistent State
//!
//! The audit mode's identity and bounded history, and the atomic file writes
//! both modes use for their state files.

pub mod history;
pub mod persist;

pub use history::{AuditHistory, AuditStore, DEFAULT_CAPACITY};
pub use persist::{read_json, write_atomic, write_json, PersistedState};

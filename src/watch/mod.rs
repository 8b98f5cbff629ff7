//! Key Watch
//!
//! Incrementally tails the log and alerts when a watched public key shows up
//! in a new entry.

pub mod state;
pub mod tailer;
pub mod watcher;

pub use state::WatchState;
pub use tailer::{LogTailer, TailReport};
pub use watcher::{Alert, KeyMatcher, KeyWatcher, TickOutcome};

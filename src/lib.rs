pub mod api;
pub mod audit;
pub mod config;
pub mod crypto;
pub mod encoding;
pub mod entry;
pub mod error;
pub mod notify;
pub mod scheduler;
pub mod store;
pub mod tlog;
pub mod tsa;
pub mod verify;
pub mod watch;

pub use error::{MonitorError, Result};

//! Alert Notifications
//!
//! Side channel for telling a human that the watched key was used. Delivery
//! failures are logged by the caller and never stop the watcher.

pub mod email;

pub use email::EmailNotifier;

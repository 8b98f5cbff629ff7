pub mod identity;

pub use identity::{verify_signature, Identity};

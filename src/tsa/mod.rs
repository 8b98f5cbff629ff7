//! Trusted Timestamping
//!
//! Gets audit records independently timestamped by an RFC 3161 authority.

pub mod client;
pub mod request;

pub use client::{TimestampToken, TsaClient};
pub use request::TimestampRequest;

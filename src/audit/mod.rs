//! Self-Audit
//!
//! Periodically attests to the log's verified state: each record is
//! timestamped by a third party, signed locally and republished into the log.

pub mod auditor;
pub mod record;
pub mod recorder;

pub use auditor::Auditor;
pub use record::{AuditRecord, TimestampedAuditRecord};
pub use recorder::{signed_entry, AuditError, AuditRecorder, AuditStage};

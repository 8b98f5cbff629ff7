//! Audit Records
//!
//! Snapshot of verified log state, and the same snapshot bundled with the
//! timestamp authority's token. Both serialize deterministically: field order
//! is fixed by the struct definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::encoding::base64_bytes;
use crate::error::Result;
use crate::verify::VerifiedState;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditRecord {
    pub observed_at: DateTime<Utc>,
    pub tree_size: u64,
    #[serde(with = "base64_bytes")]
    pub root_hash: Vec<u8>,
}

impl AuditRecord {
    pub fn from_verified(state: &VerifiedState, observed_at: DateTime<Utc>) -> Self {
        Self {
            observed_at,
            tree_size: state.tree_size,
            root_hash: state.root_hash.clone(),
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimestampedAuditRecord {
    pub record: AuditRecord,
    #[serde(with = "base64_bytes")]
    pub external_timestamp: Vec<u8>,
    pub timestamp_authority: String,
}

impl TimestampedAuditRecord {
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    pub fn to_line(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// One-line description for logs
    pub fn summary(&self) -> String {
        format!(
            "tree_size={} root={} observed_at={}",
            self.record.tree_size,
            hex::encode(&self.record.root_hash),
            self.record.observed_at.to_rfc3339()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record() -> TimestampedAuditRecord {
        TimestampedAuditRecord {
            record: AuditRecord {
                observed_at: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
                tree_size: 42,
                root_hash: vec![1, 2, 3],
            },
            external_timestamp: vec![9, 9],
            timestamp_authority: "https://freetsa.org/tsr".to_string(),
        }
    }

    #[test]
    fn test_serialization_is_deterministic() {
        let a = record().to_bytes().unwrap();
        let b = record().to_bytes().unwrap();
        assert_eq!(a, b);
        assert_eq!(
            String::from_utf8(a).unwrap(),
            r#"{"record":{"observedAt":"2024-03-01T12:00:00Z","treeSize":42,"rootHash":"AQID"},"externalTimestamp":"CQk=","timestampAuthority":"https://freetsa.org/tsr"}"#
        );
    }

    #[test]
    fn test_summary_mentions_tree_size() {
        let summary = record().summary();
        assert!(summary.contains("tree_size=42"));
        assert!(summary.contains("root=010203"));
    }
}

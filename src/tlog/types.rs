//! Wire types for the transparency log's REST API.

use serde::{Deserialize, Serialize};

use crate::encoding;
use crate::error::{MonitorError, Result};

/// `GET /api/v1/log` response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogInfo {
    #[serde(default)]
    pub root_hash: Option<String>,
    #[serde(default)]
    pub tree_size: Option<u64>,
    pub signed_tree_head: SignedTreeHead,
}

/// Signed tree head as it appears on the wire, every field base64.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedTreeHead {
    #[serde(default)]
    pub key_hint: String,
    #[serde(default)]
    pub log_root: String,
    #[serde(default)]
    pub signature: String,
}

/// The log's signed commitment to its current size. Opaque until verified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedCommitment {
    pub key_hint: Vec<u8>,
    pub root_data: Vec<u8>,
    pub signature: Vec<u8>,
}

impl SignedCommitment {
    pub fn from_wire(sth: &SignedTreeHead) -> Result<Self> {
        let field = |name: &str, value: &str| -> Result<Vec<u8>> {
            if value.trim().is_empty() {
                return Err(MonitorError::malformed_commitment(format!("missing {}", name)));
            }
            encoding::decode(name, value)
                .map_err(|e| MonitorError::malformed_commitment(e.to_string()))
        };

        Ok(Self {
            key_hint: field("keyHint", &sth.key_hint)?,
            root_data: field("logRoot", &sth.log_root)?,
            signature: field("signature", &sth.signature)?,
        })
    }

    pub fn to_wire(&self) -> SignedTreeHead {
        SignedTreeHead {
            key_hint: encoding::encode(&self.key_hint),
            log_root: encoding::encode(&self.root_data),
            signature: encoding::encode(&self.signature),
        }
    }
}

/// One value of the `{uuid: entry}` map returned by entry lookups and creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntryPayload {
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub integrated_time: Option<i64>,
    #[serde(default, rename = "logID")]
    pub log_id: Option<String>,
    #[serde(default)]
    pub log_index: Option<u64>,
}

/// An entry fetched by index: the uuid and its base64 body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEntry {
    pub uuid: String,
    pub index: u64,
    pub body: String,
}

/// Result of submitting a proposed entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedEntry {
    pub uuid: String,
    pub log_index: Option<u64>,
}

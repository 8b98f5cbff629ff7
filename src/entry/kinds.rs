//! Kind-specific entry specs and the fields extracted from each.

use serde::{Deserialize, Serialize};

use crate::encoding::{base64_bytes, base64_bytes_option};

/// `rekord` and `hashedrekord` share the same signature/data layout.
pub const REKORD_KIND: &str = "rekord";
pub const HASHED_REKORD_KIND: &str = "hashedrekord";
pub const RPM_KIND: &str = "rpm";
pub const API_VERSION_V001: &str = "0.0.1";

/// `spec` of a signed-artifact entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedArtifactSpec {
    #[serde(default)]
    pub data: DataSpec,
    #[serde(default)]
    pub signature: SignatureSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hash: Option<HashSpec>,
    #[serde(
        default,
        with = "base64_bytes_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub content: Option<Vec<u8>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HashSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub algorithm: Option<String>,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(
        default,
        with = "base64_bytes_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub content: Option<Vec<u8>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key: Option<PublicKeySpec>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicKeySpec {
    #[serde(with = "base64_bytes")]
    pub content: Vec<u8>,
}

/// `spec` of a package entry. Only the signing key is of interest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackageSpec {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key: Option<PublicKeySpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package: Option<serde_json::Value>,
}

/// Key material pulled out of an entry. Any field may be absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtractedFields {
    pub public_key: Option<Vec<u8>>,
    pub signature: Option<Vec<u8>>,
    pub content_hash: Option<String>,
}

impl ExtractedFields {
    pub fn is_empty(&self) -> bool {
        self.public_key.is_none() && self.signature.is_none() && self.content_hash.is_none()
    }
}

impl SignedArtifactSpec {
    pub fn extract(&self) -> ExtractedFields {
        ExtractedFields {
            public_key: self.signature.public_key.as_ref().map(|k| k.content.clone()),
            signature: self.signature.content.clone(),
            content_hash: self.data.hash.as_ref().map(|h| h.value.clone()),
        }
    }
}

impl PackageSpec {
    pub fn extract(&self) -> ExtractedFields {
        ExtractedFields {
            public_key: self.public_key.as_ref().map(|k| k.content.clone()),
            ..ExtractedFields::default()
        }
    }
}

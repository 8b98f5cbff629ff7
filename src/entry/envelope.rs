//! Entry Decoder
//!
//! Turns a base64 entry body into a typed [`LogEntry`] by looking up its kind tag
//! in a [`KindRegistry`]. Kinds the registry does not know decode to
//! [`EntryBody::Unsupported`] and extract nothing.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

use crate::encoding;
use crate::entry::kinds::{
    ExtractedFields, PackageSpec, SignedArtifactSpec, API_VERSION_V001, HASHED_REKORD_KIND,
    REKORD_KIND, RPM_KIND,
};
use crate::error::{MonitorError, Result};
use crate::tlog::RawEntry;

/// The JSON envelope every entry body is wrapped in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope<T> {
    pub api_version: String,
    pub kind: String,
    pub spec: T,
}

/// Entry submitted to the log.
pub type ProposedEntry = Envelope<SignedArtifactSpec>;

impl Envelope<SignedArtifactSpec> {
    pub fn rekord(spec: SignedArtifactSpec) -> Self {
        Self {
            api_version: API_VERSION_V001.to_string(),
            kind: REKORD_KIND.to_string(),
            spec,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EntryKind {
    SignedArtifact,
    SignedDigest,
    Package,
    Unsupported { kind: String, api_version: String },
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryKind::SignedArtifact => write!(f, "{}/{}", REKORD_KIND, API_VERSION_V001),
            EntryKind::SignedDigest => write!(f, "{}/{}", HASHED_REKORD_KIND, API_VERSION_V001),
            EntryKind::Package => write!(f, "{}/{}", RPM_KIND, API_VERSION_V001),
            EntryKind::Unsupported { kind, api_version } => {
                write!(f, "unsupported:{}/{}", kind, api_version)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EntryBody {
    SignedArtifact(SignedArtifactSpec),
    SignedDigest(SignedArtifactSpec),
    Package(PackageSpec),
    Unsupported { kind: String, api_version: String },
}

impl EntryBody {
    pub fn kind(&self) -> EntryKind {
        match self {
            EntryBody::SignedArtifact(_) => EntryKind::SignedArtifact,
            EntryBody::SignedDigest(_) => EntryKind::SignedDigest,
            EntryBody::Package(_) => EntryKind::Package,
            EntryBody::Unsupported { kind, api_version } => EntryKind::Unsupported {
                kind: kind.clone(),
                api_version: api_version.clone(),
            },
        }
    }

    pub fn extract(&self) -> ExtractedFields {
        match self {
            EntryBody::SignedArtifact(spec) | EntryBody::SignedDigest(spec) => spec.extract(),
            EntryBody::Package(spec) => spec.extract(),
            EntryBody::Unsupported { .. } => ExtractedFields::default(),
        }
    }
}

/// A decoded log entry.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub index: u64,
    pub uuid: String,
    pub raw_body: Vec<u8>,
    pub body: EntryBody,
}

impl LogEntry {
    pub fn kind(&self) -> EntryKind {
        self.body.kind()
    }

    pub fn extract(&self) -> ExtractedFields {
        self.body.extract()
    }
}

type SpecDecoder = fn(Value) -> std::result::Result<EntryBody, serde_json::Error>;

struct KindDecoder {
    api_version: &'static str,
    decode: SpecDecoder,
}

/// Kind tag -> spec decoder.
pub struct KindRegistry {
    decoders: HashMap<&'static str, KindDecoder>,
}

impl Default for KindRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(REKORD_KIND, API_VERSION_V001, |spec| {
            serde_json::from_value(spec).map(EntryBody::SignedArtifact)
        });
        registry.register(HASHED_REKORD_KIND, API_VERSION_V001, |spec| {
            serde_json::from_value(spec).map(EntryBody::SignedDigest)
        });
        registry.register(RPM_KIND, API_VERSION_V001, |spec| {
            serde_json::from_value(spec).map(EntryBody::Package)
        });
        registry
    }
}

impl KindRegistry {
    pub fn empty() -> Self {
        Self {
            decoders: HashMap::new(),
        }
    }

    pub fn register(&mut self, kind: &'static str, api_version: &'static str, decode: SpecDecoder) {
        self.decoders.insert(kind, KindDecoder { api_version, decode });
    }

    pub fn supports(&self, kind: &str, api_version: &str) -> bool {
        self.decoders
            .get(kind)
            .map(|d| d.api_version == api_version)
            .unwrap_or(false)
    }

    /// Decode the JSON envelope of an entry body
    pub fn decode_body(&self, raw_body: &[u8]) -> Result<EntryBody> {
        let envelope: Envelope<Value> = serde_json::from_slice(raw_body)
            .map_err(|e| MonitorError::DecodeError(format!("invalid entry envelope: {}", e)))?;

        match self.decoders.get(envelope.kind.as_str()) {
            Some(decoder) if decoder.api_version == envelope.api_version => {
                (decoder.decode)(envelope.spec).map_err(|e| {
                    MonitorError::DecodeError(format!(
                        "invalid {} {} spec: {}",
                        envelope.kind, envelope.api_version, e
                    ))
                })
            }
            _ => Ok(EntryBody::Unsupported {
                kind: envelope.kind,
                api_version: envelope.api_version,
            }),
        }
    }

    /// Decode an entry fetched from the log
    pub fn decode(&self, raw: &RawEntry) -> Result<LogEntry> {
        let raw_body = encoding::decode("entry body", &raw.body)?;
        let body = self.decode_body(&raw_body)?;
        Ok(LogEntry {
            index: raw.index,
            uuid: raw.uuid.clone(),
            raw_body,
            body,
        })
    }
}

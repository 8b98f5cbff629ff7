//! Crash-safe state file writes.
//!
//! State is written to a temporary file in the destination directory, synced,
//! and renamed over the canonical path. A crash at any point leaves either the
//! old file or the new one, never a partial write.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::audit::TimestampedAuditRecord;
use crate::encoding::base64_bytes;
use crate::error::{MonitorError, Result};

/// On-disk form of the audit mode's state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedState {
    #[serde(with = "base64_bytes")]
    pub public_key: Vec<u8>,
    #[serde(with = "base64_bytes")]
    pub private_key: Vec<u8>,
    #[serde(default)]
    pub serialized_history: Vec<String>,
    #[serde(default)]
    pub history: Vec<TimestampedAuditRecord>,
}

/// Replace `path` with `bytes` atomically
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| {
        MonitorError::PersistenceError(format!(
            "Failed to rename state file into {}: {}",
            path.display(),
            e.error
        ))
    })?;

    debug!("Wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let bytes = serde_json::to_vec(value)
        .map_err(|e| MonitorError::PersistenceError(format!("Failed to serialize state: {}", e)))?;
    write_atomic(path, &bytes)
}

/// Read a JSON state file; `None` if it does not exist
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(MonitorError::PersistenceError(format!(
                "Failed to read {}: {}",
                path.display(),
                e
            )))
        }
    };

    serde_json::from_slice(&bytes).map(Some).map_err(|e| {
        MonitorError::ConfigError(format!("Corrupt state file {}: {}", path.display(), e))
    })
}

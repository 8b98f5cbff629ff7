//! Bounded Audit Store
//!
//! Keeps the last N timestamped audit records in two forms: structured for
//! in-process use and pre-serialized for the read interface. Both live behind
//! one lock and every mutation is persisted before it becomes visible.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::audit::TimestampedAuditRecord;
use crate::crypto::Identity;
use crate::error::{MonitorError, Result};
use crate::store::persist::{self, PersistedState};

pub const DEFAULT_CAPACITY: usize = 1000;

/// Structured and serialized history, mutated together.
#[derive(Debug, Clone, Default)]
pub struct AuditHistory {
    records: VecDeque<TimestampedAuditRecord>,
    serialized: VecDeque<String>,
}

impl AuditHistory {
    fn from_parts(records: Vec<TimestampedAuditRecord>, serialized: Vec<String>) -> Result<Self> {
        if records.len() != serialized.len() {
            return Err(MonitorError::ConfigError(format!(
                "Corrupt state: {} history records but {} serialized entries",
                records.len(),
                serialized.len()
            )));
        }
        Ok(Self {
            records: records.into(),
            serialized: serialized.into(),
        })
    }

    /// Append, evicting from the front while over capacity. Returns what was evicted.
    fn push(
        &mut self,
        record: TimestampedAuditRecord,
        line: String,
        capacity: usize,
    ) -> Vec<TimestampedAuditRecord> {
        self.records.push_back(record);
        self.serialized.push_back(line);

        let mut evicted = Vec::new();
        while self.records.len() > capacity {
            self.serialized.pop_front();
            if let Some(oldest) = self.records.pop_front() {
                evicted.push(oldest);
            }
        }
        evicted
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn latest(&self) -> Option<&TimestampedAuditRecord> {
        self.records.back()
    }
}

/// Identity plus bounded history, backed by a single state file.
#[derive(Debug)]
pub struct AuditStore {
    path: PathBuf,
    capacity: usize,
    identity: Identity,
    history: RwLock<AuditHistory>,
    /// Serializes appends so the history lock is only held for the swap
    writer: Mutex<()>,
}

impl AuditStore {
    /// Load the state file, or create it with a fresh identity if there is none
    pub fn open(path: impl AsRef<Path>, capacity: usize) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if capacity == 0 {
            return Err(MonitorError::ConfigError("history capacity must be at least 1".into()));
        }

        match persist::read_json::<PersistedState>(&path)? {
            Some(state) => Self::from_persisted(path, capacity, state),
            None => {
                let identity = Identity::generate()?;
                let store = Self {
                    path,
                    capacity,
                    identity,
                    history: RwLock::new(AuditHistory::default()),
                    writer: Mutex::new(()),
                };
                persist::write_json(&store.path, &store.state_for(&AuditHistory::default()))?;
                info!("Generated new identity, state written to {}", store.path.display());
                Ok(store)
            }
        }
    }

    fn from_persisted(path: PathBuf, capacity: usize, state: PersistedState) -> Result<Self> {
        let identity = Identity::from_keypair_bytes(&state.private_key).map_err(|e| {
            MonitorError::ConfigError(format!("Unusable identity in {}: {}", path.display(), e))
        })?;
        if identity.public_key() != state.public_key.as_slice() {
            return Err(MonitorError::ConfigError(format!(
                "Public key in {} does not match its private key",
                path.display()
            )));
        }

        let mut history = AuditHistory::from_parts(state.history, state.serialized_history)?;
        if history.len() > capacity {
            warn!(
                "State holds {} records, keeping the newest {}",
                history.len(),
                capacity
            );
            while history.len() > capacity {
                history.records.pop_front();
                history.serialized.pop_front();
            }
        }

        info!("Loaded identity and {} audit records from {}", history.len(), path.display());
        Ok(Self {
            path,
            capacity,
            identity,
            history: RwLock::new(history),
            writer: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// PEM bytes of the local public key
    pub fn public_key(&self) -> Vec<u8> {
        self.identity.public_key().to_vec()
    }

    /// Append a record. The in-memory history only changes once the new state is on disk;
    /// readers keep seeing the previous history while the file is written.
    pub async fn append(&self, record: TimestampedAuditRecord) -> Result<()> {
        let line = record.to_line()?;
        let _writer = self.writer.lock().await;

        let mut next = self.history.read().await.clone();
        for evicted in next.push(record, line, self.capacity) {
            debug!(
                "dropping entry from: {}",
                evicted.record.observed_at.to_rfc3339()
            );
        }

        let path = self.path.clone();
        let state = self.state_for(&next);
        tokio::task::spawn_blocking(move || persist::write_json(&path, &state))
            .await
            .map_err(|e| MonitorError::PersistenceError(format!("State write task failed: {}", e)))??;

        *self.history.write().await = next;
        Ok(())
    }

    /// Point-in-time copy of the serialized records, oldest first
    pub async fn snapshot(&self) -> Vec<String> {
        self.history.read().await.serialized.iter().cloned().collect()
    }

    /// Point-in-time copy of the structured records, oldest first
    pub async fn records(&self) -> Vec<TimestampedAuditRecord> {
        self.history.read().await.records.iter().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.history.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.history.read().await.is_empty()
    }

    pub async fn latest_record(&self) -> Option<TimestampedAuditRecord> {
        self.history.read().await.latest().cloned()
    }

    pub async fn latest_tree_size(&self) -> Option<u64> {
        self.history
            .read()
            .await
            .latest()
            .map(|r| r.record.tree_size)
    }

    fn state_for(&self, history: &AuditHistory) -> PersistedState {
        PersistedState {
            public_key: self.identity.public_key().to_vec(),
            private_key: self.identity.private_key_bytes().to_vec(),
            serialized_history: history.serialized.iter().cloned().collect(),
            history: history.records.iter().cloned().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::AuditRecord;
    use chrono::Utc;
    use tempfile::tempdir;

    fn record(tree_size: u64) -> TimestampedAuditRecord {
        TimestampedAuditRecord {
            record: AuditRecord {
                observed_at: Utc::now(),
                tree_size,
                root_hash: vec![tree_size as u8; 4],
            },
            external_timestamp: vec![1, 2, 3],
            timestamp_authority: "tsa".to_string(),
        }
    }

    #[tokio::test]
    async fn test_open_creates_identity_and_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        let store = AuditStore::open(&path, 5).unwrap();

        assert!(path.exists());
        assert!(store.is_empty().await);

        let reopened = AuditStore::open(&path, 5).unwrap();
        assert_eq!(store.public_key(), reopened.public_key());
    }

    #[tokio::test]
    async fn test_forms_stay_in_lockstep() {
        let dir = tempdir().unwrap();
        let store = AuditStore::open(dir.path().join("state.json"), 2).unwrap();
        for size in 1..=4 {
            store.append(record(size)).await.unwrap();
        }

        let records = store.records().await;
        let snapshot = store.snapshot().await;
        assert_eq!(records.len(), 2);
        assert_eq!(snapshot.len(), 2);
        for (record, line) in records.iter().zip(snapshot.iter()) {
            assert_eq!(&record.to_line().unwrap(), line);
        }
        assert_eq!(store.latest_tree_size().await, Some(4));
    }

    #[tokio::test]
    async fn test_mismatched_history_lengths_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        let identity = Identity::generate().unwrap();
        let state = PersistedState {
            public_key: identity.public_key().to_vec(),
            private_key: identity.private_key_bytes().to_vec(),
            serialized_history: vec!["{}".to_string()],
            history: vec![],
        };
        persist::write_json(&path, &state).unwrap();

        assert!(matches!(
            AuditStore::open(&path, 5),
            Err(MonitorError::ConfigError(_))
        ));
    }

    #[tokio::test]
    async fn test_mismatched_public_key_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        let identity = Identity::generate().unwrap();
        let other = Identity::generate().unwrap();
        let state = PersistedState {
            public_key: other.public_key().to_vec(),
            private_key: identity.private_key_bytes().to_vec(),
            serialized_history: vec![],
            history: vec![],
        };
        persist::write_json(&path, &state).unwrap();

        assert!(AuditStore::open(&path, 5).is_err());
    }

    #[tokio::test]
    async fn test_oversized_history_trimmed_on_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");
        {
            let store = AuditStore::open(&path, 10).unwrap();
            for size in 1..=6 {
                store.append(record(size)).await.unwrap();
            }
        }

        let store = AuditStore::open(&path, 3).unwrap();
        let sizes: Vec<u64> = store.records().await.iter().map(|r| r.record.tree_size).collect();
        assert_eq!(sizes, vec![4, 5, 6]);
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let dir = tempdir().unwrap();
        assert!(AuditStore::open(dir.path().join("state.json"), 0).is_err());
    }
}

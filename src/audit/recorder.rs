//! Audit Recorder
//!
//! One audit run: fetch and verify the log's signed commitment, build a record,
//! get it timestamped, sign the bundle with the local identity and republish it
//! into the log. Any failure aborts the run before history is touched.

use chrono::Utc;
use std::fmt;
use std::sync::Mutex;
use thiserror::Error;
use tracing::{debug, info};

use crate::audit::record::{AuditRecord, TimestampedAuditRecord};
use crate::crypto::Identity;
use crate::entry::{DataSpec, ProposedEntry, PublicKeySpec, SignatureSpec, SignedArtifactSpec};
use crate::error::MonitorError;
use crate::tlog::LogClient;
use crate::tsa::TsaClient;
use crate::verify::{CommitmentVerifier, ConsistencyGuard};

pub const SIGNATURE_FORMAT: &str = "x509";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditStage {
    Verify,
    Timestamp,
    Sign,
    Republish,
    Persist,
}

impl AuditStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditStage::Verify => "verify",
            AuditStage::Timestamp => "timestamp",
            AuditStage::Sign => "sign",
            AuditStage::Republish => "republish",
            AuditStage::Persist => "persist",
        }
    }
}

impl fmt::Display for AuditStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug)]
#[error("audit failed at {stage} stage: {source}")]
pub struct AuditError {
    pub stage: AuditStage,
    #[source]
    pub source: MonitorError,
    /// Signed record produced before a republish failure
    pub retained: Option<Box<TimestampedAuditRecord>>,
}

impl AuditError {
    pub fn new(stage: AuditStage, source: MonitorError) -> Self {
        Self {
            stage,
            source,
            retained: None,
        }
    }

    pub fn is_fatal_to_trust(&self) -> bool {
        self.source.is_fatal_to_trust()
    }
}

fn at(stage: AuditStage) -> impl FnOnce(MonitorError) -> AuditError {
    move |source| AuditError::new(stage, source)
}

/// Build the entry that republishes a signed audit record into the log
pub fn signed_entry(
    record: &TimestampedAuditRecord,
    identity: &Identity,
) -> Result<ProposedEntry, MonitorError> {
    let payload = record.to_bytes()?;
    let signature = identity.sign(&payload);

    Ok(ProposedEntry::rekord(SignedArtifactSpec {
        data: DataSpec {
            hash: None,
            content: Some(payload),
        },
        signature: SignatureSpec {
            format: Some(SIGNATURE_FORMAT.to_string()),
            content: Some(signature),
            public_key: Some(PublicKeySpec {
                content: identity.public_key().to_vec(),
            }),
        },
    }))
}

pub struct AuditRecorder {
    log: LogClient,
    verifier: CommitmentVerifier,
    tsa: TsaClient,
    guard: Mutex<ConsistencyGuard>,
}

impl AuditRecorder {
    pub fn new(log: LogClient, verifier: CommitmentVerifier, tsa: TsaClient) -> Self {
        Self {
            log,
            verifier,
            tsa,
            guard: Mutex::new(ConsistencyGuard::new()),
        }
    }

    /// Seed the consistency check with the newest log state already audited
    pub fn resume_from(self, latest: Option<&AuditRecord>) -> Self {
        let guard = ConsistencyGuard::starting_at(latest.map(|r| r.tree_size))
            .with_root_hash(latest.map(|r| r.root_hash.clone()));
        Self {
            guard: Mutex::new(guard),
            ..self
        }
    }

    pub fn last_tree_size(&self) -> Option<u64> {
        self.guard
            .lock()
            .map(|g| g.last_tree_size())
            .unwrap_or_else(|poisoned| poisoned.into_inner().last_tree_size())
    }

    pub async fn audit(&self, identity: &Identity) -> Result<TimestampedAuditRecord, AuditError> {
        // FetchCommitment + Verify
        let verified = self
            .verifier
            .fetch_verified(&self.log)
            .await
            .map_err(at(AuditStage::Verify))?;
        self.with_guard(|g| g.check(&verified))
            .map_err(at(AuditStage::Verify))?;

        // BuildRecord
        let record = AuditRecord::from_verified(&verified, Utc::now());
        debug!("Built audit record for tree size {}", record.tree_size);

        // ExternalTimestamp
        let record_bytes = record.to_bytes().map_err(at(AuditStage::Timestamp))?;
        let token = self
            .tsa
            .stamp(&record_bytes)
            .await
            .map_err(at(AuditStage::Timestamp))?;
        let stamped = TimestampedAuditRecord {
            record,
            external_timestamp: token.token,
            timestamp_authority: token.authority,
        };

        // Sign
        let entry = signed_entry(&stamped, identity).map_err(at(AuditStage::Sign))?;
        self.with_guard(|g| g.observe(&verified))
            .map_err(at(AuditStage::Verify))?;

        // Republish
        if let Err(e) = self.log.create_entry(&entry).await {
            return Err(AuditError {
                stage: AuditStage::Republish,
                source: e,
                retained: Some(Box::new(stamped)),
            });
        }

        info!("Audit published: {}", stamped.summary());
        Ok(stamped)
    }

    fn with_guard<T>(&self, f: impl FnOnce(&mut ConsistencyGuard) -> T) -> T {
        let mut guard = self
            .guard
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&mut guard)
    }
}

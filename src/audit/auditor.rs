//! Periodic audit tick: run the recorder and append its output to the store.

use std::sync::Arc;
use tracing::{error, info, warn};

use crate::audit::recorder::{AuditError, AuditRecorder, AuditStage};
use crate::audit::record::TimestampedAuditRecord;
use crate::store::AuditStore;

pub struct Auditor {
    recorder: AuditRecorder,
    store: Arc<AuditStore>,
}

impl Auditor {
    /// The recorder's consistency check starts from the newest stored record
    pub async fn new(recorder: AuditRecorder, store: Arc<AuditStore>) -> Self {
        let latest = store.latest_record().await;
        Self {
            recorder: recorder.resume_from(latest.as_ref().map(|r| &r.record)),
            store,
        }
    }

    pub fn store(&self) -> &Arc<AuditStore> {
        &self.store
    }

    pub async fn tick(&self) -> Result<TimestampedAuditRecord, AuditError> {
        match self.recorder.audit(self.store.identity()).await {
            Ok(record) => {
                self.store
                    .append(record.clone())
                    .await
                    .map_err(|e| AuditError::new(AuditStage::Persist, e))?;
                info!("audit recorded: {}", record.summary());
                Ok(record)
            }
            Err(mut err) => {
                error!(stage = %err.stage, "ERROR: {}", err);
                if let Some(record) = err.retained.take() {
                    // the record is signed and timestamped even though the log rejected it
                    warn!("keeping unpublished audit record: {}", record.summary());
                    if let Err(e) = self.store.append(*record).await {
                        error!("failed to persist unpublished audit record: {}", e);
                    }
                }
                Err(err)
            }
        }
    }
}

//! Log Tailer
//!
//! Scans an inclusive index range one entry at a time, decoding each entry and
//! handing it to the caller. Entries that fail to fetch or decode are logged and
//! skipped; they are not retried within the pass.

use tracing::{debug, warn};

use crate::entry::{EntryBody, ExtractedFields, KindRegistry, LogEntry};
use crate::tlog::LogClient;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TailReport {
    /// Indices handed to the callback
    pub processed: Vec<u64>,
    /// Indices that could not be fetched or decoded
    pub skipped: Vec<u64>,
}

impl TailReport {
    pub fn is_noop(&self) -> bool {
        self.processed.is_empty() && self.skipped.is_empty()
    }
}

pub struct LogTailer {
    log: LogClient,
    registry: KindRegistry,
}

impl LogTailer {
    pub fn new(log: LogClient) -> Self {
        Self::with_registry(log, KindRegistry::default())
    }

    pub fn with_registry(log: LogClient, registry: KindRegistry) -> Self {
        Self { log, registry }
    }

    /// Visit every index in `[from, to]` in increasing order. `to < from` does nothing.
    pub async fn tail<F>(&self, from: u64, to: u64, mut on_entry: F) -> TailReport
    where
        F: FnMut(&LogEntry, &ExtractedFields),
    {
        let mut report = TailReport::default();
        if to < from {
            debug!("nothing to scan: from={} to={}", from, to);
            return report;
        }

        for index in from..=to {
            let raw = match self.log.get_entry_by_index(index).await {
                Ok(raw) => raw,
                Err(e) => {
                    warn!(index, "failed to fetch entry: {}", e);
                    report.skipped.push(index);
                    continue;
                }
            };

            let entry = match self.registry.decode(&raw) {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(index, "failed to decode entry {}: {}", raw.uuid, e);
                    report.skipped.push(index);
                    continue;
                }
            };

            if let EntryBody::Unsupported { kind, api_version } = &entry.body {
                debug!(index, "no type found for {} {}", kind, api_version);
            }

            let fields = entry.extract();
            on_entry(&entry, &fields);
            report.processed.push(index);
        }

        report
    }
}

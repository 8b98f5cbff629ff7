//! Key Watcher
//!
//! Each tick verifies the log's current size, tails every entry added since the
//! previous tick and raises an alert for each entry signed by the watched key.

use std::path::PathBuf;
use tracing::{debug, info, warn};

use crate::encoding;
use crate::entry::{ExtractedFields, LogEntry};
use crate::error::{MonitorError, Result};
use crate::notify::EmailNotifier;
use crate::tlog::LogClient;
use crate::verify::{CommitmentVerifier, ConsistencyGuard};
use crate::watch::state::WatchState;
use crate::watch::tailer::{LogTailer, TailReport};

/// Matches extracted public keys against the watched key, ignoring surrounding whitespace.
#[derive(Debug, Clone)]
pub struct KeyMatcher {
    key: Vec<u8>,
}

impl KeyMatcher {
    pub fn new(key: impl AsRef<[u8]>) -> Result<Self> {
        let key = key.as_ref().trim_ascii();
        if key.is_empty() {
            return Err(MonitorError::ConfigError("watched key is empty".into()));
        }
        Ok(Self { key: key.to_vec() })
    }

    pub fn matches(&self, fields: &ExtractedFields) -> bool {
        fields
            .public_key
            .as_deref()
            .map(|pk| pk.trim_ascii() == self.key.as_slice())
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub index: u64,
    pub uuid: String,
    pub content_hash: Option<String>,
    /// base64 signature
    pub signature: Option<String>,
}

impl Alert {
    fn new(entry: &LogEntry, fields: &ExtractedFields) -> Self {
        Self {
            index: entry.index,
            uuid: entry.uuid.clone(),
            content_hash: fields.content_hash.clone(),
            signature: fields.signature.as_ref().map(|sig| encoding::encode(sig)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickOutcome {
    pub tree_size: u64,
    /// Inclusive range scanned this tick
    pub scanned: Option<(u64, u64)>,
    pub report: TailReport,
    pub alerts: Vec<Alert>,
}

pub struct KeyWatcher {
    log: LogClient,
    verifier: CommitmentVerifier,
    tailer: LogTailer,
    matcher: KeyMatcher,
    notifier: Option<EmailNotifier>,
    state: WatchState,
    guard: ConsistencyGuard,
    state_path: Option<PathBuf>,
}

impl KeyWatcher {
    pub fn new(log: LogClient, verifier: CommitmentVerifier, matcher: KeyMatcher, state: WatchState) -> Self {
        Self {
            tailer: LogTailer::new(log.clone()),
            guard: ConsistencyGuard::starting_at(state.verified_tree_size)
                .with_root_hash(state.verified_root_hash.clone()),
            log,
            verifier,
            matcher,
            notifier: None,
            state,
            state_path: None,
        }
    }

    /// Resume from `state_path` if it exists, otherwise start at the newest entry
    /// of the log's current verified size.
    pub async fn start(
        log: LogClient,
        verifier: CommitmentVerifier,
        matcher: KeyMatcher,
        state_path: Option<PathBuf>,
    ) -> Result<Self> {
        let persisted = match &state_path {
            Some(path) => WatchState::load(path)?,
            None => None,
        };

        let state = match persisted {
            Some(state) => {
                info!("Resuming watch at index {}", state.next_index());
                state
            }
            None => {
                let verified = verifier.fetch_verified(&log).await?;
                let mut state = WatchState::starting_at(verified.tree_size.saturating_sub(1));
                state.verified_tree_size = Some(verified.tree_size);
                state.verified_root_hash = Some(verified.root_hash.clone());
                info!("Starting watch at tree size {}", verified.tree_size);
                state
            }
        };

        let mut watcher = Self::new(log, verifier, matcher, state);
        watcher.state_path = state_path;
        Ok(watcher)
    }

    pub fn with_notifier(mut self, notifier: EmailNotifier) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn with_state_path(mut self, path: PathBuf) -> Self {
        self.state_path = Some(path);
        self
    }

    pub fn state(&self) -> &WatchState {
        &self.state
    }

    pub async fn tick(&mut self) -> Result<TickOutcome> {
        info!("performing check at index {}", self.state.next_index());

        let verified = self.verifier.fetch_verified(&self.log).await?;
        self.guard.observe(&verified)?;
        self.state.verified_tree_size = Some(verified.tree_size);
        self.state.verified_root_hash = Some(verified.root_hash.clone());

        let mut outcome = TickOutcome {
            tree_size: verified.tree_size,
            ..TickOutcome::default()
        };

        let from = self.state.next_index();
        let to = match verified.last_index() {
            Some(to) if to >= from => to,
            _ => {
                debug!("no new entries (tree size {})", verified.tree_size);
                self.save_state();
                return Ok(outcome);
            }
        };

        let matcher = &self.matcher;
        let mut alerts = Vec::new();
        let report = self
            .tailer
            .tail(from, to, |entry, fields| {
                if matcher.matches(fields) {
                    warn!(uuid = %entry.uuid, "found watched key at index {}", entry.index);
                    alerts.push(Alert::new(entry, fields));
                }
            })
            .await;

        if !report.skipped.is_empty() {
            warn!("skipped {} entries in [{}, {}]", report.skipped.len(), from, to);
        }

        // alerts go out before the cursor is persisted, so a crash re-alerts instead of losing one
        for alert in &alerts {
            self.notify(alert).await;
        }

        self.state.last_index_seen = Some(to);
        self.save_state();

        outcome.scanned = Some((from, to));
        outcome.report = report;
        outcome.alerts = alerts;
        Ok(outcome)
    }

    async fn notify(&self, alert: &Alert) {
        match &self.notifier {
            Some(notifier) => {
                if let Err(e) = notifier.send(alert).await {
                    warn!("failed to send alert for index {}: {}", alert.index, e);
                }
            }
            None => info!("no notifier configured, alert for index {} not sent", alert.index),
        }
    }

    fn save_state(&self) {
        if let Some(path) = &self.state_path {
            if let Err(e) = self.state.save(path) {
                warn!("failed to persist watch state to {}: {}", path.display(), e);
            }
        }
    }
}

//! Monotonic tracking of verified log state across commitments.

use tracing::error;

use crate::error::{MonitorError, Result};
use crate::verify::VerifiedState;

/// Remembers the newest verified tree size and its root hash. An append-only log
/// can never shrink, and two verified commitments to the same size must commit to
/// the same root; anything else means the log forked or was rewritten.
#[derive(Debug, Clone, Default)]
pub struct ConsistencyGuard {
    last_tree_size: Option<u64>,
    last_root_hash: Option<Vec<u8>>,
}

impl ConsistencyGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_at(tree_size: Option<u64>) -> Self {
        Self {
            last_tree_size: tree_size,
            last_root_hash: None,
        }
    }

    /// Root hash committed to at the starting size, when it is known
    pub fn with_root_hash(mut self, root_hash: Option<Vec<u8>>) -> Self {
        self.last_root_hash = root_hash;
        self
    }

    pub fn last_tree_size(&self) -> Option<u64> {
        self.last_tree_size
    }

    pub fn last_root_hash(&self) -> Option<&[u8]> {
        self.last_root_hash.as_deref()
    }

    /// Check `state` against the last verified state without recording it
    pub fn check(&self, state: &VerifiedState) -> Result<()> {
        let Some(previous) = self.last_tree_size else {
            return Ok(());
        };

        if state.tree_size < previous {
            error!(
                "verified tree size decreased from {} to {}: log is inconsistent",
                previous, state.tree_size
            );
            return Err(MonitorError::ConsistencyViolation {
                previous,
                current: state.tree_size,
            });
        }

        if state.tree_size == previous {
            if let Some(root) = &self.last_root_hash {
                if root != &state.root_hash {
                    error!(
                        "two verified roots for tree size {}: {} and {}",
                        previous,
                        hex::encode(root),
                        hex::encode(&state.root_hash)
                    );
                    return Err(MonitorError::ConsistencyViolation {
                        previous,
                        current: state.tree_size,
                    });
                }
            }
        }

        Ok(())
    }

    /// Check and record `state`
    pub fn observe(&mut self, state: &VerifiedState) -> Result<()> {
        self.check(state)?;
        self.last_tree_size = Some(state.tree_size);
        self.last_root_hash = Some(state.root_hash.clone());
        Ok(())
    }
}

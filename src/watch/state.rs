use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::encoding::base64_bytes_option;
use crate::error::Result;
use crate::store::persist;

/// Tailing cursor. Advances only past indices whose decode and match were attempted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchState {
    pub last_index_seen: Option<u64>,
    #[serde(default)]
    pub verified_tree_size: Option<u64>,
    #[serde(
        default,
        with = "base64_bytes_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub verified_root_hash: Option<Vec<u8>>,
}

impl WatchState {
    /// State whose next scan starts at `next_index`
    pub fn starting_at(next_index: u64) -> Self {
        Self {
            last_index_seen: next_index.checked_sub(1),
            verified_tree_size: None,
            verified_root_hash: None,
        }
    }

    pub fn next_index(&self) -> u64 {
        self.last_index_seen.map(|i| i + 1).unwrap_or(0)
    }

    pub fn load(path: &Path) -> Result<Option<Self>> {
        persist::read_json(path)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        persist::write_json(path, self)
    }
}

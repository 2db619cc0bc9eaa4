//! Cross-run baseline: the set of repositories synced by the last run.
//!
//! Persists a [`SyncState`] JSON document at `<home>/.docmirror/state.json`.
//! Writes use the same atomic `.tmp` + rename pattern as the config file.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::{docmirror_root, home};
use crate::error::{io_err, ConfigError};

/// On-disk sync state payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SyncState {
    /// `owner/repo` identities written by the last completed run.
    #[serde(default)]
    pub last_synced_repo_ids: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_sync_time: Option<DateTime<Utc>>,
}

impl SyncState {
    /// Replace the baseline with the identities of a completed run.
    pub fn record_run(&mut self, repo_ids: BTreeSet<String>, finished_at: DateTime<Utc>) {
        self.last_synced_repo_ids = repo_ids;
        self.last_sync_time = Some(finished_at);
    }
}

/// `~/.docmirror/state.json`
pub fn state_path_at(home: &Path) -> PathBuf {
    docmirror_root(home).join("state.json")
}

/// Load the sync state. Returns an empty baseline if the file does not exist.
pub fn load_at(home: &Path) -> Result<SyncState, ConfigError> {
    let path = state_path_at(home);
    if !path.exists() {
        return Ok(SyncState::default());
    }
    let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
    serde_json::from_str(&contents).map_err(|e| ConfigError::State { path, source: e })
}

/// `load_at` convenience wrapper.
pub fn load() -> Result<SyncState, ConfigError> {
    load_at(&home()?)
}

/// Save the sync state atomically.
///
/// Writes to `<path>.tmp` then renames to `<path>`.
pub fn save_at(home: &Path, state: &SyncState) -> Result<(), ConfigError> {
    let path = state_path_at(home);
    let dir = docmirror_root(home);
    std::fs::create_dir_all(&dir).map_err(|e| io_err(&dir, e))?;

    let json = serde_json::to_string_pretty(state).map_err(|e| ConfigError::State {
        path: path.clone(),
        source: e,
    })?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, &json).map_err(|e| io_err(&tmp, e))?;
    std::fs::rename(&tmp, &path).map_err(|e| io_err(&path, e))?;
    Ok(())
}

/// `save_at` convenience wrapper.
pub fn save(state: &SyncState) -> Result<(), ConfigError> {
    save_at(&home()?, state)
}

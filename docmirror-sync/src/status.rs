//! Offline status: last run time and what is on disk per tracked repository.

use std::collections::BTreeSet;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;

use docmirror_core::types::repo_root;
use docmirror_core::{MirrorConfig, RepoId, SyncState};
use docmirror_remote::classify::{is_markdown_path, is_media_path};

use crate::error::SyncError;
use crate::store::LocalStore;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepoStatus {
    pub id: String,
    /// Whether `<base>/<owner>/<repo>` exists.
    pub present: bool,
    pub markdown_files: usize,
    pub media_files: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    pub last_sync_time: Option<DateTime<Utc>>,
    pub repos: Vec<RepoStatus>,
}

fn count_files<S: LocalStore + ?Sized>(
    store: &S,
    folder: &Path,
    status: &mut RepoStatus,
) -> Result<(), SyncError> {
    for child in store.list_children(folder)? {
        if child.is_folder {
            count_files(store, &child.path, status)?;
            continue;
        }
        let name = child.path.to_string_lossy();
        if is_markdown_path(&name) {
            status.markdown_files += 1;
        } else if is_media_path(&name) {
            status.media_files += 1;
        }
    }
    Ok(())
}

/// Status for the baseline repositories plus manually configured ones.
pub fn collect<S: LocalStore + ?Sized>(
    config: &MirrorConfig,
    state: &SyncState,
    store: &S,
) -> Result<StatusReport, SyncError> {
    let mut ids: BTreeSet<RepoId> = state
        .last_synced_repo_ids
        .iter()
        .map(|id| RepoId::from(id.as_str()))
        .collect();
    ids.extend(config.manual_repos()?.iter().map(|r| r.id()));

    let base = config.base_folder_path();
    let mut repos = Vec::with_capacity(ids.len());
    for id in ids {
        let Some((owner, repo)) = id.split() else {
            continue;
        };
        let root = repo_root(&base, owner, repo);
        let mut status = RepoStatus {
            id: id.to_string(),
            present: store.is_folder(&root),
            markdown_files: 0,
            media_files: 0,
        };
        if status.present {
            count_files(store, &root, &mut status)?;
        }
        repos.push(status);
    }
    Ok(StatusReport {
        last_sync_time: state.last_sync_time,
        repos,
    })
}

/// Format age from a chrono timestamp (`last_sync_time`).
pub fn format_datetime_age(timestamp: DateTime<Utc>) -> String {
    let now = Utc::now();
    let age = now.signed_duration_since(timestamp).num_seconds().max(0) as u64;
    format_seconds(age)
}

fn format_seconds(seconds: u64) -> String {
    if seconds < 60 {
        return format!("{seconds}s");
    }
    if seconds < 60 * 60 {
        return format!("{}m", seconds / 60);
    }
    if seconds < 60 * 60 * 24 {
        return format!("{}h", seconds / (60 * 60));
    }
    format!("{}d", seconds / (60 * 60 * 24))
}

//! File reconciler: bring local copies in line with the remote listing.
//!
//! Markdown goes through the annotation pipeline and is written only when the
//! result differs from what is on disk (ignoring the header timestamp).
//! Media is copied verbatim. Per-file failures are logged and collected.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use docmirror_annotate::{annotate, same_ignoring_timestamp};
use docmirror_core::types::local_path;
use docmirror_core::{FileMetadata, RepoId, RepoRef, Toggles};
use docmirror_remote::{backlink_target, FileKind, RemoteSource, SyncableFile};

use crate::error::SyncError;
use crate::store::{ensure_folders, LocalStore};

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Outcome of an individual file write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteResult {
    /// File was written (content changed or did not previously exist).
    Written { path: PathBuf },
    /// Local copy already matches.
    Unchanged { path: PathBuf },
    /// `--dry-run` mode: the file *would* have been written.
    WouldWrite { path: PathBuf },
}

impl WriteResult {
    pub fn path(&self) -> &Path {
        match self {
            WriteResult::Written { path }
            | WriteResult::Unchanged { path }
            | WriteResult::WouldWrite { path } => path,
        }
    }
}

/// A file that could not be fetched or written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFailure {
    pub path: PathBuf,
    pub reason: String,
}

/// Outcome of reconciling one repository.
#[derive(Debug, Clone)]
pub struct RepoSyncResult {
    pub repo: RepoId,
    pub writes: Vec<WriteResult>,
    pub failures: Vec<FileFailure>,
    /// Store-relative paths written, confirmed current, or still listed
    /// remotely but failed this run. Pruning keeps everything in this set.
    pub synced: BTreeSet<PathBuf>,
}

impl RepoSyncResult {
    pub fn new(repo: RepoId) -> Self {
        Self {
            repo,
            writes: Vec::new(),
            failures: Vec::new(),
            synced: BTreeSet::new(),
        }
    }

    pub fn written(&self) -> usize {
        self.writes
            .iter()
            .filter(|w| matches!(w, WriteResult::Written { .. } | WriteResult::WouldWrite { .. }))
            .count()
    }

    pub fn unchanged(&self) -> usize {
        self.writes
            .iter()
            .filter(|w| matches!(w, WriteResult::Unchanged { .. }))
            .count()
    }
}

// ---------------------------------------------------------------------------
// Context
// ---------------------------------------------------------------------------

/// Per-run settings shared by every file.
#[derive(Debug, Clone)]
pub struct ReconcileOptions {
    /// Base folder relative to the store root.
    pub base_folder: PathBuf,
    pub toggles: Toggles,
    pub dry_run: bool,
    pub now: DateTime<Utc>,
}

impl ReconcileOptions {
    /// Base folder as written into backlink targets (`/`-separated).
    pub fn base_folder_link(&self) -> String {
        self.base_folder
            .iter()
            .map(|s| s.to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }
}

// ---------------------------------------------------------------------------
// Reconciliation
// ---------------------------------------------------------------------------

/// Annotated document for a remote Markdown file.
pub fn render_markdown(
    repo: &RepoRef,
    remote_path: &str,
    body: &str,
    opts: &ReconcileOptions,
) -> String {
    let meta = FileMetadata::for_file(repo, remote_path);
    let target = backlink_target(&opts.base_folder_link(), &repo.owner, &repo.repo, remote_path);
    annotate(body, &meta, Some(&target), &opts.toggles, opts.now)
}

fn write_file<S: LocalStore + ?Sized>(
    store: &S,
    path: &Path,
    contents: &[u8],
    dry_run: bool,
) -> Result<WriteResult, SyncError> {
    if dry_run {
        tracing::info!("[dry-run] would write: {}", path.display());
        return Ok(WriteResult::WouldWrite {
            path: path.to_path_buf(),
        });
    }
    if let Some(parent) = path.parent() {
        for folder in ensure_folders(store, parent)? {
            tracing::debug!("created folder {}", folder.display());
        }
    }
    store.write(path, contents)?;
    tracing::info!("wrote: {}", path.display());
    Ok(WriteResult::Written {
        path: path.to_path_buf(),
    })
}

/// Fetch one file and write it if the local copy differs.
pub fn reconcile_file<R, S>(
    source: &R,
    store: &S,
    repo: &RepoRef,
    file: &SyncableFile,
    opts: &ReconcileOptions,
) -> Result<WriteResult, SyncError>
where
    R: RemoteSource + ?Sized,
    S: LocalStore + ?Sized,
{
    let path = local_path(&opts.base_folder, repo, file.path());
    let bytes = source.fetch_blob(&repo.owner, &repo.repo, &file.entry)?;

    let contents = match file.kind {
        FileKind::Media => bytes,
        FileKind::Markdown => {
            let body = String::from_utf8(bytes).map_err(|_| SyncError::NotUtf8 {
                path: file.path().to_string(),
            })?;
            render_markdown(repo, file.path(), &body, opts).into_bytes()
        }
    };

    if store.exists(&path) && !store.is_folder(&path) {
        let current = store.read(&path)?;
        let same = match file.kind {
            FileKind::Media => current == contents,
            FileKind::Markdown => {
                match (std::str::from_utf8(&current), std::str::from_utf8(&contents)) {
                    (Ok(a), Ok(b)) => same_ignoring_timestamp(a, b),
                    _ => false,
                }
            }
        };
        if same {
            tracing::debug!("unchanged: {}", path.display());
            return Ok(WriteResult::Unchanged { path });
        }
    }

    write_file(store, &path, &contents, opts.dry_run)
}

/// Reconcile every listed file of one repository, continuing past failures.
pub fn reconcile_repo<R, S>(
    source: &R,
    store: &S,
    repo: &RepoRef,
    files: &[SyncableFile],
    opts: &ReconcileOptions,
) -> RepoSyncResult
where
    R: RemoteSource + ?Sized,
    S: LocalStore + ?Sized,
{
    let mut result = RepoSyncResult::new(repo.id());
    for file in files {
        let path = local_path(&opts.base_folder, repo, file.path());
        match reconcile_file(source, store, repo, file, opts) {
            Ok(write) => {
                result.synced.insert(write.path().to_path_buf());
                result.writes.push(write);
            }
            Err(e) => {
                tracing::error!("{}: failed to sync {}: {e}", repo.id(), file.path());
                result.synced.insert(path.clone());
                result.failures.push(FileFailure {
                    path,
                    reason: e.to_string(),
                });
            }
        }
    }
    result
}

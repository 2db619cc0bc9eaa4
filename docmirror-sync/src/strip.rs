//! Bulk removal of annotations from mirrored Markdown.
//!
//! Turns system-owned files back into plain copies of their remote source.
//! Files without a provenance header are never touched.

use std::path::{Path, PathBuf};

use docmirror_annotate::{extract_metadata, strip};
use docmirror_core::types::repo_root;
use docmirror_core::RepoId;
use docmirror_remote::classify::is_markdown_path;

use crate::error::SyncError;
use crate::store::LocalStore;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StripReport {
    /// Files whose annotations were (or would be) removed.
    pub stripped: Vec<PathBuf>,
    /// Markdown files left alone because they are not ours.
    pub skipped: usize,
    pub failed: Vec<(PathBuf, String)>,
}

fn markdown_files<S: LocalStore + ?Sized>(
    store: &S,
    folder: &Path,
    out: &mut Vec<PathBuf>,
) -> Result<(), SyncError> {
    for child in store.list_children(folder)? {
        if child.is_folder {
            markdown_files(store, &child.path, out)?;
        } else if is_markdown_path(&child.path.to_string_lossy()) {
            out.push(child.path);
        }
    }
    Ok(())
}

fn strip_file<S: LocalStore + ?Sized>(
    store: &S,
    path: &Path,
    only: Option<&RepoId>,
    dry_run: bool,
) -> Result<bool, SyncError> {
    let text = store.read_text(path)?;
    let Some(meta) = extract_metadata(&text) else {
        return Ok(false);
    };
    if only.is_some_and(|id| *id != meta.repo_id()) {
        return Ok(false);
    }
    let plain = strip(&text);
    if !dry_run && plain != text {
        store.write(path, plain.as_bytes())?;
    }
    Ok(true)
}

/// Strip every system-owned Markdown file under the base folder, or under
/// one repository's folder when `only` is given.
pub fn strip_tree<S: LocalStore + ?Sized>(
    store: &S,
    base_folder: &Path,
    only: Option<&RepoId>,
    dry_run: bool,
) -> Result<StripReport, SyncError> {
    let root = match only.and_then(RepoId::split) {
        Some((owner, repo)) => repo_root(base_folder, owner, repo),
        None => base_folder.to_path_buf(),
    };
    let mut report = StripReport::default();
    if !store.is_folder(&root) {
        return Ok(report);
    }

    let mut files = Vec::new();
    markdown_files(store, &root, &mut files)?;
    for path in files {
        match strip_file(store, &path, only, dry_run) {
            Ok(true) => {
                tracing::info!(
                    "{}stripped {}",
                    if dry_run { "[dry-run] " } else { "" },
                    path.display()
                );
                report.stripped.push(path);
            }
            Ok(false) => report.skipped += 1,
            Err(e) => {
                tracing::warn!("cannot strip {}: {e}", path.display());
                report.failed.push((path, e.to_string()));
            }
        }
    }
    Ok(report)
}

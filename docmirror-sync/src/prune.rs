//! Pruning: remove files of a repository that the remote no longer lists.
//!
//! Only files that are provably ours are deleted. Markdown must carry a
//! provenance header naming this repository; media must sit inside the
//! repository folder. Anything else is left alone. Folders emptied by
//! pruning are removed, the repository root never is.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use docmirror_annotate::extract_metadata;
use docmirror_core::types::repo_root;
use docmirror_core::RepoRef;
use docmirror_remote::classify::{is_markdown_path, is_media_path};

use crate::error::SyncError;
use crate::store::{depth, LocalStore};

/// What pruning did (or, in a dry run, would do).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PruneReport {
    pub deleted_files: Vec<PathBuf>,
    pub deleted_folders: Vec<PathBuf>,
    /// Files absent from the synced set that were not ours to delete.
    pub kept: Vec<PathBuf>,
}

struct Pruner<'a, S: LocalStore + ?Sized> {
    store: &'a S,
    repo: &'a RepoRef,
    synced: &'a BTreeSet<PathBuf>,
    media_min_depth: usize,
    dry_run: bool,
    report: PruneReport,
}

impl<S: LocalStore + ?Sized> Pruner<'_, S> {
    fn owns_markdown(&self, path: &Path) -> bool {
        match self.store.read_text(path) {
            Ok(text) => extract_metadata(&text).is_some_and(|meta| {
                meta.owner == self.repo.owner && meta.repo == self.repo.repo
            }),
            Err(e) => {
                tracing::warn!("cannot inspect {}: {e}", path.display());
                false
            }
        }
    }

    fn should_delete(&self, path: &Path) -> bool {
        let name = path.to_string_lossy();
        if is_markdown_path(&name) {
            self.owns_markdown(path)
        } else if is_media_path(&name) {
            depth(path) >= self.media_min_depth
        } else {
            false
        }
    }

    fn delete_file(&mut self, path: &Path) -> bool {
        if !self.dry_run {
            if let Err(e) = self.store.delete_file(path) {
                tracing::error!("failed to prune {}: {e}", path.display());
                return false;
            }
        }
        tracing::info!("{}pruned {}", dry_run_prefix(self.dry_run), path.display());
        self.report.deleted_files.push(path.to_path_buf());
        true
    }

    /// Prune `folder`; returns whether it ends up (or would end up) empty.
    fn walk(&mut self, folder: &Path) -> Result<bool, SyncError> {
        let mut remaining = 0usize;
        for child in self.store.list_children(folder)? {
            if child.is_folder {
                if self.walk(&child.path)? && self.delete_folder(&child.path) {
                    continue;
                }
                remaining += 1;
            } else if self.synced.contains(&child.path) {
                remaining += 1;
            } else if self.should_delete(&child.path) {
                if !self.delete_file(&child.path) {
                    remaining += 1;
                }
            } else {
                self.report.kept.push(child.path.clone());
                remaining += 1;
            }
        }
        Ok(remaining == 0)
    }

    fn delete_folder(&mut self, path: &Path) -> bool {
        if !self.dry_run {
            if let Err(e) = self.store.delete_folder(path) {
                tracing::warn!("could not remove emptied folder {}: {e}", path.display());
                return false;
            }
        }
        tracing::debug!("{}removed empty folder {}", dry_run_prefix(self.dry_run), path.display());
        self.report.deleted_folders.push(path.to_path_buf());
        true
    }
}

fn dry_run_prefix(dry_run: bool) -> &'static str {
    if dry_run {
        "[dry-run] "
    } else {
        ""
    }
}

/// Delete files under the repository root that are not in `synced` and are
/// provably ours.
pub fn prune_repo<S: LocalStore + ?Sized>(
    store: &S,
    base_folder: &Path,
    repo: &RepoRef,
    synced: &BTreeSet<PathBuf>,
    dry_run: bool,
) -> Result<PruneReport, SyncError> {
    let root = repo_root(base_folder, &repo.owner, &repo.repo);
    if !store.is_folder(&root) {
        return Ok(PruneReport::default());
    }
    let mut pruner = Pruner {
        store,
        repo,
        synced,
        media_min_depth: depth(base_folder) + 3,
        dry_run,
        report: PruneReport::default(),
    };
    pruner.walk(&root)?;
    Ok(pruner.report)
}

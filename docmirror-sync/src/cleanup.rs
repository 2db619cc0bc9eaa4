//! Cross-run cleanup: delete mirrors of repositories that left the
//! configuration.
//!
//! A repository is removed when it was synced last run but is not current,
//! or when its folder exists under `<base>/<owner>/<repo>` without being
//! current. Owners whose namespace failed discovery this run are protected.

use std::collections::BTreeSet;
use std::path::Path;

use docmirror_core::types::repo_root;
use docmirror_core::RepoId;

use crate::error::SyncError;
use crate::store::LocalStore;

/// What cleanup did (or, in a dry run, would do).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub removed: Vec<RepoId>,
    pub failed: Vec<(RepoId, String)>,
}

/// Inputs for one cleanup pass.
#[derive(Debug, Clone, Copy)]
pub struct CleanupScope<'a> {
    pub base_folder: &'a Path,
    /// Baseline persisted by the previous run.
    pub previous: &'a BTreeSet<String>,
    /// Identities resolved by this run.
    pub current: &'a BTreeSet<RepoId>,
    /// Owners whose namespace listing failed this run.
    pub protected_owners: &'a [String],
    pub dry_run: bool,
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .map(|n| n.to_string_lossy().starts_with('.'))
        .unwrap_or(false)
}

fn name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Every `<owner>/<repo>` folder currently under the base folder.
pub fn scan_existing<S: LocalStore + ?Sized>(
    store: &S,
    base_folder: &Path,
) -> Result<BTreeSet<RepoId>, SyncError> {
    let mut found = BTreeSet::new();
    if !store.is_folder(base_folder) {
        return Ok(found);
    }
    for owner in store.list_children(base_folder)? {
        if !owner.is_folder || is_hidden(&owner.path) {
            continue;
        }
        for repo in store.list_children(&owner.path)? {
            if repo.is_folder && !is_hidden(&repo.path) {
                found.insert(RepoId::new(&name_of(&owner.path), &name_of(&repo.path)));
            }
        }
    }
    Ok(found)
}

/// `(previous − current) ∪ (existing − current)`, minus protected owners.
pub fn removed_repositories(
    previous: &BTreeSet<String>,
    existing: &BTreeSet<RepoId>,
    current: &BTreeSet<RepoId>,
    protected_owners: &[String],
) -> BTreeSet<RepoId> {
    previous
        .iter()
        .map(|id| RepoId::from(id.as_str()))
        .chain(existing.iter().cloned())
        .filter(|id| !current.contains(id))
        .filter(|id| {
            let owner = id.split().map(|(o, _)| o).unwrap_or_default();
            !protected_owners
                .iter()
                .any(|p| p.eq_ignore_ascii_case(owner))
        })
        .collect()
}

/// Delete a folder and everything beneath it, files first, depth-first.
pub fn delete_tree<S: LocalStore + ?Sized>(store: &S, path: &Path) -> Result<(), SyncError> {
    for child in store.list_children(path)? {
        if child.is_folder {
            delete_tree(store, &child.path)?;
        } else {
            store.delete_file(&child.path)?;
        }
    }
    store.delete_folder(path)
}

fn remove_repository<S: LocalStore + ?Sized>(
    store: &S,
    base_folder: &Path,
    id: &RepoId,
) -> Result<(), SyncError> {
    let Some((owner, repo)) = id.split() else {
        tracing::warn!("ignoring malformed repository id {id:?} in baseline");
        return Ok(());
    };
    let root = repo_root(base_folder, owner, repo);
    if store.is_folder(&root) {
        delete_tree(store, &root)?;
    }
    let owner_dir = base_folder.join(owner);
    if store.is_folder(&owner_dir) && store.list_children(&owner_dir)?.is_empty() {
        store.delete_folder(&owner_dir)?;
    }
    Ok(())
}

/// Remove every repository that is no longer current.
pub fn cleanup<S: LocalStore + ?Sized>(
    store: &S,
    scope: CleanupScope<'_>,
) -> Result<CleanupReport, SyncError> {
    let existing = scan_existing(store, scope.base_folder)?;
    let removed = removed_repositories(
        scope.previous,
        &existing,
        scope.current,
        scope.protected_owners,
    );

    let mut report = CleanupReport::default();
    for id in removed {
        if scope.dry_run {
            tracing::info!("[dry-run] would remove {id}");
            report.removed.push(id);
            continue;
        }
        match remove_repository(store, scope.base_folder, &id) {
            Ok(()) => {
                tracing::info!("removed {id}");
                report.removed.push(id);
            }
            Err(e) => {
                tracing::error!("failed to remove {id}: {e}");
                report.failed.push((id, e.to_string()));
            }
        }
    }
    Ok(report)
}

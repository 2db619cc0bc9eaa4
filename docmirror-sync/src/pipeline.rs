//! Sync orchestrator: one full run from configuration to persisted baseline.
//!
//! Order of operations:
//! 1. Resolve repositories (manual + discovery).
//! 2. Clean up repositories that are no longer current.
//! 3. For each repository: list, reconcile, prune. Failures stay local.
//! 4. Persist the current identity set as the next baseline.

use std::collections::BTreeSet;
use std::path::Path;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;

use docmirror_core::{config, state, ConfigError, MirrorConfig, RepoId, RepoRef};
use docmirror_remote::{list_syncable, GithubClient, RemoteSource};

use crate::cleanup::{cleanup, CleanupReport, CleanupScope};
use crate::error::SyncError;
use crate::lock::RunLock;
use crate::prune::{prune_repo, PruneReport};
use crate::reconcile::{reconcile_repo, ReconcileOptions, RepoSyncResult};
use crate::resolver::resolve;
use crate::store::{FsStore, LocalStore};

/// Knobs for a single run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Report what would change without touching the store or the baseline.
    pub dry_run: bool,
}

/// Result of one repository within a run.
#[derive(Debug, Clone)]
pub struct RepoOutcome {
    pub repo: RepoRef,
    pub sync: RepoSyncResult,
    pub prune: PruneReport,
    /// Listing or pruning error that stopped this repository.
    pub error: Option<String>,
}

impl RepoOutcome {
    pub fn succeeded(&self) -> bool {
        self.error.is_none() && self.sync.failures.is_empty()
    }
}

/// Aggregate result of a run.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub repos: Vec<RepoOutcome>,
    pub cleanup: CleanupReport,
    pub dry_run: bool,
    pub started_at: DateTime<Utc>,
    pub duration: Duration,
}

/// Flat counters for logs, CLI output and the daemon protocol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunCounts {
    pub succeeded: usize,
    pub failed: usize,
    pub removed: usize,
    pub written: usize,
    pub unchanged: usize,
    pub pruned: usize,
    pub file_failures: usize,
    pub dry_run: bool,
    pub duration_ms: u128,
}

impl RunSummary {
    pub fn succeeded(&self) -> usize {
        self.repos.iter().filter(|r| r.succeeded()).count()
    }

    pub fn failed(&self) -> usize {
        self.repos.len() - self.succeeded()
    }

    pub fn removed(&self) -> usize {
        self.cleanup.removed.len()
    }

    pub fn written(&self) -> usize {
        self.repos.iter().map(|r| r.sync.written()).sum()
    }

    pub fn unchanged(&self) -> usize {
        self.repos.iter().map(|r| r.sync.unchanged()).sum()
    }

    pub fn pruned(&self) -> usize {
        self.repos.iter().map(|r| r.prune.deleted_files.len()).sum()
    }

    pub fn counts(&self) -> RunCounts {
        RunCounts {
            succeeded: self.succeeded(),
            failed: self.failed(),
            removed: self.removed(),
            written: self.written(),
            unchanged: self.unchanged(),
            pruned: self.pruned(),
            file_failures: self.repos.iter().map(|r| r.sync.failures.len()).sum(),
            dry_run: self.dry_run,
            duration_ms: self.duration.as_millis(),
        }
    }
}

fn sync_one<R, S>(
    source: &R,
    store: &S,
    repo: &RepoRef,
    opts: &ReconcileOptions,
) -> RepoOutcome
where
    R: RemoteSource + ?Sized,
    S: LocalStore + ?Sized,
{
    let mut outcome = RepoOutcome {
        repo: repo.clone(),
        sync: RepoSyncResult::new(repo.id()),
        prune: PruneReport::default(),
        error: None,
    };

    let files = match list_syncable(source, repo, opts.toggles.sync_media) {
        Ok(files) => files,
        Err(e) => {
            tracing::error!("{}@{}: listing failed: {e}", repo.id(), repo.branch);
            outcome.error = Some(e.to_string());
            return outcome;
        }
    };

    outcome.sync = reconcile_repo(source, store, repo, &files, opts);

    match prune_repo(store, &opts.base_folder, repo, &outcome.sync.synced, opts.dry_run) {
        Ok(report) => outcome.prune = report,
        Err(e) => {
            tracing::error!("{}: pruning failed: {e}", repo.id());
            outcome.error = Some(e.to_string());
        }
    }

    tracing::info!(
        "{}: {} written, {} unchanged, {} pruned, {} failed",
        repo.id(),
        outcome.sync.written(),
        outcome.sync.unchanged(),
        outcome.prune.deleted_files.len(),
        outcome.sync.failures.len()
    );
    outcome
}

/// Run against explicit collaborators. `home` locates the persisted baseline.
pub fn run_with<R, S>(
    config: &MirrorConfig,
    source: &R,
    store: &S,
    home: &Path,
    options: RunOptions,
) -> Result<RunSummary, SyncError>
where
    R: RemoteSource + ?Sized,
    S: LocalStore + ?Sized,
{
    let started = Instant::now();
    let started_at = Utc::now();

    if config.manual_repos()?.is_empty() && config.discovery_namespaces().is_empty() {
        return Err(ConfigError::NothingToSync.into());
    }

    let resolved = resolve(config, source)?;
    if resolved.repos.is_empty() {
        return Err(SyncError::NoRepositories);
    }
    let current: BTreeSet<RepoId> = resolved.repos.iter().map(RepoRef::id).collect();
    tracing::info!("resolved {} repositories", current.len());

    let opts = ReconcileOptions {
        base_folder: config.base_folder_path(),
        toggles: config.toggles,
        dry_run: options.dry_run,
        now: started_at,
    };

    let mut baseline = state::load_at(home)?;
    let cleanup_report = cleanup(
        store,
        CleanupScope {
            base_folder: &opts.base_folder,
            previous: &baseline.last_synced_repo_ids,
            current: &current,
            protected_owners: &resolved.failed_namespaces,
            dry_run: options.dry_run,
        },
    )?;

    let repos: Vec<RepoOutcome> = resolved
        .repos
        .iter()
        .map(|repo| sync_one(source, store, repo, &opts))
        .collect();

    if !options.dry_run {
        let ids = current.iter().map(|id| id.0.clone()).collect();
        baseline.record_run(ids, Utc::now());
        state::save_at(home, &baseline)?;
    }

    let summary = RunSummary {
        repos,
        cleanup: cleanup_report,
        dry_run: options.dry_run,
        started_at,
        duration: started.elapsed(),
    };
    let counts = summary.counts();
    tracing::info!(
        "sync finished: {} succeeded, {} failed, {} removed ({} written, {} unchanged, {} pruned) in {} ms",
        counts.succeeded,
        counts.failed,
        counts.removed,
        counts.written,
        counts.unchanged,
        counts.pruned,
        counts.duration_ms
    );
    Ok(summary)
}

/// Load the config at `home`, wire the GitHub client and filesystem store,
/// and run while holding the run lock.
pub fn run_from_config(home: &Path, options: RunOptions) -> Result<RunSummary, SyncError> {
    let config = config::load_at(home)?;
    config.validate()?;
    let token = config.resolved_token().ok_or(ConfigError::MissingToken)?;
    if !config.base_path.is_dir() {
        return Err(SyncError::StoreRootMissing {
            path: config.base_path.clone(),
        });
    }

    let _lock = RunLock::acquire(home)?;
    let client = GithubClient::new(&config.api_url, &token);
    let store = FsStore::new(&config.base_path);
    run_with(&config, &client, &store, home, options)
}

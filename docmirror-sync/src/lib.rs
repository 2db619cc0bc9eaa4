//! # docmirror-sync
//!
//! Reconciliation engine: resolve repositories, mirror their Markdown (and
//! optionally media) into a local store, prune what the remote dropped and
//! remove repositories that left the configuration.
//!
//! Call [`run_from_config`] for a complete run against GitHub and the
//! filesystem, or [`run_with`] to supply your own [`RemoteSource`] and
//! [`LocalStore`].
//!
//! [`RemoteSource`]: docmirror_remote::RemoteSource

pub mod cleanup;
pub mod error;
pub mod lock;
pub mod pipeline;
pub mod prune;
pub mod reconcile;
pub mod resolver;
pub mod status;
pub mod store;
pub mod strip;

#[cfg(test)]
mod testing;

pub use cleanup::CleanupReport;
pub use error::SyncError;
pub use lock::RunLock;
pub use pipeline::{run_from_config, run_with, RepoOutcome, RunCounts, RunOptions, RunSummary};
pub use prune::PruneReport;
pub use reconcile::{RepoSyncResult, WriteResult};
pub use status::{RepoStatus, StatusReport};
pub use store::{FsStore, LocalStore, StoreEntry};
pub use strip::StripReport;

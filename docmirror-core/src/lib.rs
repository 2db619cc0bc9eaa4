//! docmirror core library — domain types, configuration, sync state, errors.
//!
//! - [`types`] — repository identities, tree entries, file provenance
//! - [`config`] — `~/.docmirror/config.yaml` load / save / init
//! - [`state`] — cross-run baseline persisted as JSON
//! - [`error`] — [`ConfigError`]

pub mod config;
pub mod error;
pub mod state;
pub mod types;

pub use config::{DiscoveryFilters, ManualRepo, MirrorConfig, Toggles};
pub use error::ConfigError;
pub use state::SyncState;
pub use types::{
    EntryKind, FileMetadata, NamespaceKind, RemoteRepo, RepoId, RepoOrigin, RepoRef, TreeEntry,
};

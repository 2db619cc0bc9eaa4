//! Error types for docmirror-sync.

use std::path::PathBuf;

use thiserror::Error;

use docmirror_core::ConfigError;
use docmirror_remote::RemoteError;

/// All errors that can arise from a sync run.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Invalid or unreadable configuration / state.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A remote request failed.
    #[error("remote error: {0}")]
    Remote(#[from] RemoteError),

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// JSON serialization/deserialization error (run lock).
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Remote Markdown that is not valid UTF-8.
    #[error("{path} is not valid UTF-8")]
    NotUtf8 { path: String },

    /// Neither manual entries nor discovery produced a repository.
    #[error("no repositories to sync")]
    NoRepositories,

    /// The configured store root is not an existing folder.
    #[error("store root {path} does not exist or is not a folder")]
    StoreRootMissing { path: PathBuf },

    /// Another run holds the run lock.
    #[error("another sync run is in progress (lock at {path})")]
    RunInProgress { path: PathBuf },
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}

//! Error types for docmirror-core.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise from configuration and state persistence.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Underlying I/O failure, with the path that was being accessed.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML serialization error (save path).
    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// YAML parse error on load; includes file path and line context from serde_yaml.
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// JSON error reading or writing the sync state.
    #[error("sync state JSON error at {path}: {source}")]
    State {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// `dirs::home_dir()` returned `None`, so we cannot locate `~/.docmirror/`.
    #[error("cannot determine home directory; set $HOME or equivalent")]
    HomeNotFound,

    /// The config file did not exist at the expected path.
    #[error("config not found at {path}; run `docmirror init` first")]
    ConfigNotFound { path: PathBuf },

    /// No token in the config file or the environment.
    #[error("no access token configured (set `token` in config.yaml or DOCMIRROR_TOKEN)")]
    MissingToken,

    /// Neither explicit repositories nor discovery namespaces are configured.
    #[error("no repositories configured: add `repositories` or `namespaces` to config.yaml")]
    NothingToSync,

    /// A `repositories` entry is not of the form `owner/repo`.
    #[error("invalid repository '{spec}': expected owner/repo")]
    InvalidRepo { spec: String },

    /// `base_folder` must be a relative path inside the store.
    #[error("invalid base_folder '{value}': must be a non-empty relative path")]
    InvalidBaseFolder { value: String },
}

/// Convenience constructor for [`ConfigError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> ConfigError {
    ConfigError::Io {
        path: path.into(),
        source,
    }
}

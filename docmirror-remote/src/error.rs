//! Error types for docmirror-remote.

use thiserror::Error;

/// Failures talking to the remote repository host.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The resource (namespace, repository, branch, blob) does not exist or
    /// is not visible with the configured token.
    #[error("not found: {url}")]
    NotFound { url: String },

    /// Any other non-success HTTP status.
    #[error("HTTP {code} from {url}")]
    Status { code: u16, url: String },

    /// Connection, TLS or timeout failure.
    #[error("transport error for {url}: {message}")]
    Transport { url: String, message: String },

    /// The response body did not have the expected shape.
    #[error("unexpected response from {url}: {message}")]
    Decode { url: String, message: String },

    /// A namespace could be listed neither as a user nor as an organization.
    #[error("namespace {namespace} is neither a user nor an organization: {source}")]
    Namespace {
        namespace: String,
        #[source]
        source: Box<RemoteError>,
    },
}

impl RemoteError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, RemoteError::NotFound { .. })
    }
}

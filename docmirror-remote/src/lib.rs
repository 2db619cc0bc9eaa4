//! Remote listing for docmirror: the [`RemoteSource`] capability, a GitHub
//! implementation, and the helpers that turn a repository into the list of
//! files to mirror.

pub mod backlink;
pub mod classify;
pub mod error;
pub mod github;
pub mod source;

pub use backlink::backlink_target;
pub use classify::{classify, FileKind, SyncableFile};
pub use error::RemoteError;
pub use github::GithubClient;
pub use source::{list_all_repos, list_namespace_repos, list_syncable, RemoteSource, PER_PAGE};

//! The remote capability and the listing logic built on top of it.
//!
//! [`RemoteSource`] exposes single requests; pagination, the user → org
//! namespace fallback and file selection live here so they behave the same
//! for the GitHub client and for test doubles.

use docmirror_core::{NamespaceKind, RemoteRepo, RepoRef, TreeEntry};

use crate::classify::{select_syncable, SyncableFile};
use crate::error::RemoteError;

/// Page size used for namespace discovery.
pub const PER_PAGE: usize = 100;

/// Read-only access to a repository host.
pub trait RemoteSource {
    /// One page (1-based) of repositories in a namespace.
    fn list_repos_page(
        &self,
        namespace: &str,
        kind: NamespaceKind,
        page: u32,
        per_page: usize,
    ) -> Result<Vec<RemoteRepo>, RemoteError>;

    /// Commit SHA at the head of `branch`.
    fn resolve_branch_head(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
    ) -> Result<String, RemoteError>;

    /// Every entry of the tree at `commit_sha`, recursively.
    fn list_tree(
        &self,
        owner: &str,
        repo: &str,
        commit_sha: &str,
    ) -> Result<Vec<TreeEntry>, RemoteError>;

    /// Raw bytes of a blob.
    fn fetch_blob(
        &self,
        owner: &str,
        repo: &str,
        entry: &TreeEntry,
    ) -> Result<Vec<u8>, RemoteError>;
}

impl<T: RemoteSource + ?Sized> RemoteSource for &T {
    fn list_repos_page(
        &self,
        namespace: &str,
        kind: NamespaceKind,
        page: u32,
        per_page: usize,
    ) -> Result<Vec<RemoteRepo>, RemoteError> {
        (**self).list_repos_page(namespace, kind, page, per_page)
    }

    fn resolve_branch_head(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
    ) -> Result<String, RemoteError> {
        (**self).resolve_branch_head(owner, repo, branch)
    }

    fn list_tree(
        &self,
        owner: &str,
        repo: &str,
        commit_sha: &str,
    ) -> Result<Vec<TreeEntry>, RemoteError> {
        (**self).list_tree(owner, repo, commit_sha)
    }

    fn fetch_blob(
        &self,
        owner: &str,
        repo: &str,
        entry: &TreeEntry,
    ) -> Result<Vec<u8>, RemoteError> {
        (**self).fetch_blob(owner, repo, entry)
    }
}

/// Concatenate pages until one comes back empty or short.
pub fn list_all_repos<S: RemoteSource + ?Sized>(
    source: &S,
    namespace: &str,
    kind: NamespaceKind,
) -> Result<Vec<RemoteRepo>, RemoteError> {
    let mut repos = Vec::new();
    let mut page = 1;
    loop {
        let batch = source.list_repos_page(namespace, kind, page, PER_PAGE)?;
        let len = batch.len();
        repos.extend(batch);
        if len < PER_PAGE {
            break;
        }
        page += 1;
    }
    tracing::debug!(
        "namespace {namespace} ({kind}): {} repositories over {page} page(s)",
        repos.len()
    );
    Ok(repos)
}

/// List a namespace as a user, falling back to an organization.
pub fn list_namespace_repos<S: RemoteSource + ?Sized>(
    source: &S,
    namespace: &str,
) -> Result<Vec<RemoteRepo>, RemoteError> {
    match list_all_repos(source, namespace, NamespaceKind::User) {
        Ok(repos) => Ok(repos),
        Err(user_err) => {
            tracing::debug!("namespace {namespace} is not a user ({user_err}); trying as org");
            list_all_repos(source, namespace, NamespaceKind::Org).map_err(|org_err| {
                RemoteError::Namespace {
                    namespace: namespace.to_string(),
                    source: Box::new(org_err),
                }
            })
        }
    }
}

/// Resolve the branch head, fetch the tree and keep the files worth mirroring.
pub fn list_syncable<S: RemoteSource + ?Sized>(
    source: &S,
    repo: &RepoRef,
    include_media: bool,
) -> Result<Vec<SyncableFile>, RemoteError> {
    let head = source.resolve_branch_head(&repo.owner, &repo.repo, &repo.branch)?;
    let entries = source.list_tree(&repo.owner, &repo.repo, &head)?;
    let total = entries.len();
    let files = select_syncable(entries, include_media);
    tracing::debug!(
        "{}@{} ({head}): {} of {total} entries selected",
        repo.id(),
        repo.branch,
        files.len()
    );
    Ok(files)
}

//! Domain types shared by every docmirror crate.
//!
//! Remote paths are slash-separated `String`s relative to a repository root.
//! Local paths are `PathBuf`s relative to the local store root.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Web root used to build `remote_url` links for mirrored files.
pub const GITHUB_WEB_URL: &str = "https://github.com";

/// Branch used when neither the configuration nor the remote names one.
pub const DEFAULT_BRANCH: &str = "main";

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// Repository identity: `owner/repo`. The branch is not part of identity.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RepoId(pub String);

impl RepoId {
    pub fn new(owner: &str, repo: &str) -> Self {
        Self(format!("{owner}/{repo}"))
    }

    /// Split into `(owner, repo)`. `None` unless exactly one `/` separates
    /// two non-empty segments.
    pub fn split(&self) -> Option<(&str, &str)> {
        let (owner, repo) = self.0.split_once('/')?;
        if owner.is_empty() || repo.is_empty() || repo.contains('/') {
            return None;
        }
        Some((owner, repo))
    }
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for RepoId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for RepoId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Where a resolved repository came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RepoOrigin {
    #[default]
    Manual,
    Auto,
}

impl fmt::Display for RepoOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RepoOrigin::Manual => write!(f, "manual"),
            RepoOrigin::Auto => write!(f, "auto"),
        }
    }
}

/// Remote tree entry type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Blob,
    Tree,
    /// Submodule pointers and anything else the remote reports.
    #[serde(other)]
    Other,
}

/// Namespace flavour used for discovery listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamespaceKind {
    User,
    Org,
}

impl fmt::Display for NamespaceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NamespaceKind::User => write!(f, "user"),
            NamespaceKind::Org => write!(f, "org"),
        }
    }
}

// ---------------------------------------------------------------------------
// Domain structs
// ---------------------------------------------------------------------------

/// A repository selected for mirroring in the current run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoRef {
    pub owner: String,
    pub repo: String,
    pub branch: String,
    pub origin: RepoOrigin,
}

impl RepoRef {
    pub fn new(owner: &str, repo: &str, branch: &str, origin: RepoOrigin) -> Self {
        Self {
            owner: owner.to_owned(),
            repo: repo.to_owned(),
            branch: branch.to_owned(),
            origin,
        }
    }

    /// Parse `owner/repo`, optionally suffixed with `@branch`.
    ///
    /// `default_branch` applies when no `@branch` suffix is present.
    pub fn parse(spec: &str, default_branch: &str, origin: RepoOrigin) -> Option<Self> {
        let spec = spec.trim();
        let (id, branch) = match spec.split_once('@') {
            Some((id, branch)) if !branch.trim().is_empty() => (id, branch.trim()),
            Some(_) => return None,
            None => (spec, default_branch),
        };
        let id = RepoId::from(id.trim());
        let (owner, repo) = id.split()?;
        Some(Self::new(owner, repo, branch, origin))
    }

    pub fn id(&self) -> RepoId {
        RepoId::new(&self.owner, &self.repo)
    }
}

/// One item of a recursive remote tree listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeEntry {
    pub path: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    pub sha: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

impl TreeEntry {
    pub fn blob(path: &str, sha: &str) -> Self {
        Self {
            path: path.to_owned(),
            kind: EntryKind::Blob,
            sha: sha.to_owned(),
            size: None,
        }
    }

    pub fn tree(path: &str, sha: &str) -> Self {
        Self {
            path: path.to_owned(),
            kind: EntryKind::Tree,
            sha: sha.to_owned(),
            size: None,
        }
    }
}

/// One repository as reported by namespace discovery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteRepo {
    pub name: String,
    pub owner: String,
    #[serde(default)]
    pub private: bool,
    #[serde(default)]
    pub fork: bool,
    #[serde(default)]
    pub archived: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_branch: Option<String>,
}

/// Provenance of a mirrored file, embedded in its annotation header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetadata {
    pub owner: String,
    pub repo: String,
    pub branch: String,
    pub path: String,
    pub remote_url: String,
}

impl FileMetadata {
    /// Metadata for `path` inside `repo`, linking to the GitHub web view.
    pub fn for_file(repo: &RepoRef, path: &str) -> Self {
        Self {
            owner: repo.owner.clone(),
            repo: repo.repo.clone(),
            branch: repo.branch.clone(),
            path: path.to_owned(),
            remote_url: format!(
                "{GITHUB_WEB_URL}/{}/{}/blob/{}/{}",
                repo.owner, repo.repo, repo.branch, path
            ),
        }
    }

    pub fn repo_id(&self) -> RepoId {
        RepoId::new(&self.owner, &self.repo)
    }
}

// ---------------------------------------------------------------------------
// Local layout
// ---------------------------------------------------------------------------

/// `<base_folder>/<owner>/<repo>`, the root of one repository's mirror.
pub fn repo_root(base_folder: &Path, owner: &str, repo: &str) -> PathBuf {
    base_folder.join(owner).join(repo)
}

/// `<base_folder>/<owner>/<repo>/<remote_path>` with the remote path's
/// slash-separated segments joined natively.
pub fn local_path(base_folder: &Path, repo: &RepoRef, remote_path: &str) -> PathBuf {
    let mut path = repo_root(base_folder, &repo.owner, &repo.repo);
    for segment in remote_path.split('/').filter(|s| !s.is_empty()) {
        path.push(segment);
    }
    path
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repo_id_display_and_split() {
        let id = RepoId::new("octo", "docs");
        assert_eq!(id.to_string(), "octo/docs");
        assert_eq!(id.split(), Some(("octo", "docs")));
        assert_eq!(RepoId::from("nope").split(), None);
        assert_eq!(RepoId::from("a/b/c").split(), None);
        assert_eq!(RepoId::from("/b").split(), None);
    }

    #[test]
    fn repo_ref_parse_with_and_without_branch() {
        let plain = RepoRef::parse("octo/docs", DEFAULT_BRANCH, RepoOrigin::Manual).unwrap();
        assert_eq!(plain.branch, "main");
        assert_eq!(plain.id(), RepoId::from("octo/docs"));

        let pinned = RepoRef::parse(" octo/docs@develop ", "main", RepoOrigin::Manual).unwrap();
        assert_eq!(pinned.branch, "develop");
        assert_eq!(pinned.repo, "docs");

        assert!(RepoRef::parse("octo/docs@", "main", RepoOrigin::Manual).is_none());
        assert!(RepoRef::parse("octo", "main", RepoOrigin::Manual).is_none());
    }

    #[test]
    fn metadata_builds_blob_url() {
        let repo = RepoRef::new("octo", "docs", "main", RepoOrigin::Auto);
        let meta = FileMetadata::for_file(&repo, "guides/setup.md");
        assert_eq!(
            meta.remote_url,
            "https://github.com/octo/docs/blob/main/guides/setup.md"
        );
        assert_eq!(meta.repo_id().to_string(), "octo/docs");
    }

    #[test]
    fn local_path_nests_under_owner_and_repo() {
        let repo = RepoRef::new("octo", "docs", "main", RepoOrigin::Manual);
        let path = local_path(Path::new("GitHub"), &repo, "a/b/c.md");
        assert_eq!(path, PathBuf::from("GitHub/octo/docs/a/b/c.md"));
    }

    #[test]
    fn tree_entry_deserializes_github_shape() {
        let json = r#"{"path":"docs","mode":"040000","type":"tree","sha":"abc"}"#;
        let entry: TreeEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.kind, EntryKind::Tree);
        assert_eq!(entry.size, None);

        let json = r#"{"path":"m","type":"commit","sha":"def"}"#;
        let entry: TreeEntry = serde_json::from_str(json).unwrap();
        assert_eq!(entry.kind, EntryKind::Other);
    }

    #[test]
    fn origin_display() {
        assert_eq!(RepoOrigin::Manual.to_string(), "manual");
        assert_eq!(NamespaceKind::Org.to_string(), "org");
    }
}

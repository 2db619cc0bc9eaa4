//! Blocking GitHub REST client.

use std::sync::OnceLock;
use std::time::Duration;

use base64::Engine;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use docmirror_core::{NamespaceKind, RemoteRepo, TreeEntry};

use crate::error::RemoteError;
use crate::source::RemoteSource;

pub const USER_AGENT: &str = concat!("docmirror/", env!("CARGO_PKG_VERSION"));
pub const ACCEPT: &str = "application/vnd.github+json";
pub const API_VERSION: &str = "2022-11-28";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

// ---------------------------------------------------------------------------
// Wire shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ApiOwner {
    login: String,
}

#[derive(Debug, Deserialize)]
struct ApiRepo {
    name: String,
    owner: ApiOwner,
    #[serde(default)]
    private: bool,
    #[serde(default)]
    fork: bool,
    #[serde(default)]
    archived: bool,
    #[serde(default)]
    default_branch: Option<String>,
}

impl From<ApiRepo> for RemoteRepo {
    fn from(api: ApiRepo) -> Self {
        RemoteRepo {
            name: api.name,
            owner: api.owner.login,
            private: api.private,
            fork: api.fork,
            archived: api.archived,
            default_branch: api.default_branch,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiUser {
    login: String,
}

#[derive(Debug, Deserialize)]
struct ApiCommitRef {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct ApiBranch {
    commit: ApiCommitRef,
}

#[derive(Debug, Deserialize)]
struct ApiTree {
    tree: Vec<TreeEntry>,
    #[serde(default)]
    truncated: bool,
}

#[derive(Debug, Deserialize)]
struct ApiBlob {
    content: String,
    #[serde(default)]
    encoding: String,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Token-authenticated client for one API root.
pub struct GithubClient {
    agent: ureq::Agent,
    api_url: String,
    token: String,
    /// Login of the token owner, looked up on first discovery.
    viewer: OnceLock<Option<String>>,
}

impl GithubClient {
    pub fn new(api_url: &str, token: &str) -> Self {
        Self::with_timeout(api_url, token, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(api_url: &str, token: &str, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build();
        Self {
            agent,
            api_url: api_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            viewer: OnceLock::new(),
        }
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Login behind the token; `None` if `GET /user` fails.
    fn viewer_login(&self) -> Option<&str> {
        self.viewer
            .get_or_init(|| match self.get_json::<ApiUser>(&self.url("/user")) {
                Ok(user) => Some(user.login),
                Err(e) => {
                    tracing::debug!("cannot resolve token owner: {e}");
                    None
                }
            })
            .as_deref()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }

    fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, RemoteError> {
        tracing::debug!("GET {url}");
        let response = self
            .agent
            .get(url)
            .set("Authorization", &format!("Bearer {}", self.token))
            .set("Accept", ACCEPT)
            .set("X-GitHub-Api-Version", API_VERSION)
            .call()
            .map_err(|e| map_ureq_error(url, e))?;
        response.into_json::<T>().map_err(|e| RemoteError::Decode {
            url: url.to_string(),
            message: e.to_string(),
        })
    }
}

fn map_ureq_error(url: &str, err: ureq::Error) -> RemoteError {
    match err {
        ureq::Error::Status(404, _) => RemoteError::NotFound {
            url: url.to_string(),
        },
        ureq::Error::Status(code, _) => RemoteError::Status {
            code,
            url: url.to_string(),
        },
        ureq::Error::Transport(transport) => RemoteError::Transport {
            url: url.to_string(),
            message: transport.to_string(),
        },
    }
}

/// Path (with query) of one discovery page.
///
/// The public `/users/{ns}/repos` listing never includes private
/// repositories, so the token owner's own namespace goes through `/user/repos`.
pub(crate) fn repos_page_path(
    namespace: &str,
    kind: NamespaceKind,
    viewer: Option<&str>,
    page: u32,
    per_page: usize,
) -> String {
    match kind {
        NamespaceKind::User if viewer.is_some_and(|v| v.eq_ignore_ascii_case(namespace)) => {
            format!("/user/repos?affiliation=owner&visibility=all&per_page={per_page}&page={page}")
        }
        NamespaceKind::User => {
            format!("/users/{namespace}/repos?type=owner&per_page={per_page}&page={page}")
        }
        NamespaceKind::Org => {
            format!("/orgs/{namespace}/repos?type=all&per_page={per_page}&page={page}")
        }
    }
}

/// Decode a blob payload. Base64 content arrives wrapped at 60 columns.
pub(crate) fn decode_blob(content: &str, encoding: &str) -> Result<Vec<u8>, String> {
    match encoding {
        "base64" | "" => {
            let compact: String = content.chars().filter(|c| !c.is_ascii_whitespace()).collect();
            base64::engine::general_purpose::STANDARD
                .decode(compact)
                .map_err(|e| e.to_string())
        }
        "utf-8" => Ok(content.as_bytes().to_vec()),
        other => Err(format!("unsupported blob encoding {other:?}")),
    }
}

impl RemoteSource for GithubClient {
    fn list_repos_page(
        &self,
        namespace: &str,
        kind: NamespaceKind,
        page: u32,
        per_page: usize,
    ) -> Result<Vec<RemoteRepo>, RemoteError> {
        let viewer = match kind {
            NamespaceKind::User => self.viewer_login(),
            NamespaceKind::Org => None,
        };
        let url = self.url(&repos_page_path(namespace, kind, viewer, page, per_page));
        let repos: Vec<ApiRepo> = self.get_json(&url)?;
        Ok(repos.into_iter().map(RemoteRepo::from).collect())
    }

    fn resolve_branch_head(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
    ) -> Result<String, RemoteError> {
        let url = self.url(&format!("/repos/{owner}/{repo}/branches/{branch}"));
        let branch: ApiBranch = self.get_json(&url)?;
        Ok(branch.commit.sha)
    }

    fn list_tree(
        &self,
        owner: &str,
        repo: &str,
        commit_sha: &str,
    ) -> Result<Vec<TreeEntry>, RemoteError> {
        let url = self.url(&format!("/repos/{owner}/{repo}/git/trees/{commit_sha}?recursive=1"));
        let tree: ApiTree = self.get_json(&url)?;
        if tree.truncated {
            tracing::warn!(
                "tree listing for {owner}/{repo} was truncated; only {} entries received",
                tree.tree.len()
            );
        }
        Ok(tree.tree)
    }

    fn fetch_blob(
        &self,
        owner: &str,
        repo: &str,
        entry: &TreeEntry,
    ) -> Result<Vec<u8>, RemoteError> {
        let url = self.url(&format!("/repos/{owner}/{repo}/git/blobs/{}", entry.sha));
        let blob: ApiBlob = self.get_json(&url)?;
        decode_blob(&blob.content, &blob.encoding)
            .map_err(|message| RemoteError::Decode { url, message })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discovery_paths() {
        assert_eq!(
            repos_page_path("octo", NamespaceKind::User, None, 2, 100),
            "/users/octo/repos?type=owner&per_page=100&page=2"
        );
        assert_eq!(
            repos_page_path("octo", NamespaceKind::User, Some("someone-else"), 1, 100),
            "/users/octo/repos?type=owner&per_page=100&page=1"
        );
        assert_eq!(
            repos_page_path("acme", NamespaceKind::Org, Some("acme"), 1, 100),
            "/orgs/acme/repos?type=all&per_page=100&page=1"
        );
    }

    #[test]
    fn token_owner_namespace_lists_private_repos() {
        assert_eq!(
            repos_page_path("Octo", NamespaceKind::User, Some("octo"), 3, 100),
            "/user/repos?affiliation=owner&visibility=all&per_page=100&page=3"
        );
    }

    #[test]
    fn user_payload_yields_login() {
        let user: ApiUser = serde_json::from_str(r#"{"login":"octo","id":1}"#).unwrap();
        assert_eq!(user.login, "octo");
    }

    #[test]
    fn blob_decoding_ignores_line_wrapping() {
        let wrapped = "IyBIZWxs\nbyB3b3Js\nZAo=\n";
        assert_eq!(decode_blob(wrapped, "base64").unwrap(), b"# Hello world\n");
        assert_eq!(decode_blob("plain", "utf-8").unwrap(), b"plain");
        assert!(decode_blob("x", "rot13").is_err());
        assert!(decode_blob("!!!", "base64").is_err());
    }

    #[test]
    fn repo_payload_maps_owner_login() {
        let json = r#"[{"name":"docs","owner":{"login":"octo","id":1},
            "private":true,"fork":false,"archived":false,"default_branch":"trunk"}]"#;
        let repos: Vec<ApiRepo> = serde_json::from_str(json).unwrap();
        let repo = RemoteRepo::from(repos.into_iter().next().unwrap());
        assert_eq!(repo.owner, "octo");
        assert!(repo.private);
        assert_eq!(repo.default_branch.as_deref(), Some("trunk"));
    }

    #[test]
    fn tree_payload_reports_truncation() {
        let json = r#"{"sha":"c0ffee","tree":[{"path":"a.md","mode":"100644",
            "type":"blob","sha":"1","size":3}],"truncated":true}"#;
        let tree: ApiTree = serde_json::from_str(json).unwrap();
        assert!(tree.truncated);
        assert_eq!(tree.tree[0].size, Some(3));
    }

    #[test]
    fn api_root_trailing_slash_is_trimmed() {
        let client = GithubClient::new("https://ghe.example.com/api/v3/", "t");
        assert_eq!(client.url("/x"), "https://ghe.example.com/api/v3/x");
    }
}

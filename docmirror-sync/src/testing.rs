//! In-memory remote for unit tests.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};

use docmirror_core::{NamespaceKind, RemoteRepo, TreeEntry};
use docmirror_remote::{RemoteError, RemoteSource};

pub(crate) fn remote_repo(owner: &str, name: &str) -> RemoteRepo {
    RemoteRepo {
        name: name.to_string(),
        owner: owner.to_string(),
        private: false,
        fork: false,
        archived: false,
        default_branch: None,
    }
}

#[derive(Default)]
struct FakeRepo {
    branches: HashMap<String, String>,
    tree: Vec<TreeEntry>,
}

#[derive(Default)]
pub(crate) struct FakeRemote {
    users: HashMap<String, Vec<RemoteRepo>>,
    orgs: HashMap<String, Vec<RemoteRepo>>,
    repos: HashMap<String, FakeRepo>,
    blobs: HashMap<String, Vec<u8>>,
    failing_blobs: HashSet<String>,
    page_requests: RefCell<Vec<(String, NamespaceKind, u32)>>,
    blob_fetches: RefCell<usize>,
}

impl FakeRemote {
    pub fn add_user(&mut self, namespace: &str, repos: Vec<RemoteRepo>) {
        self.users.insert(namespace.to_string(), repos);
    }

    pub fn add_org(&mut self, namespace: &str, repos: Vec<RemoteRepo>) {
        self.orgs.insert(namespace.to_string(), repos);
    }

    /// Replace the tree of `owner/repo@branch` with `files`.
    pub fn set_files(&mut self, owner: &str, repo: &str, branch: &str, files: &[(&str, &[u8])]) {
        let id = format!("{owner}/{repo}");
        let fake = self.repos.entry(id.clone()).or_default();
        let head = format!("{id}@{branch}");
        fake.branches.insert(branch.to_string(), head);
        fake.tree.clear();
        for (path, contents) in files {
            let sha = format!("{id}:{path}");
            fake.tree.push(TreeEntry::blob(path, &sha));
            self.blobs.insert(sha, contents.to_vec());
        }
    }

    pub fn fail_blob(&mut self, owner: &str, repo: &str, path: &str) {
        self.failing_blobs.insert(format!("{owner}/{repo}:{path}"));
    }

    pub fn page_requests(&self) -> Vec<(String, NamespaceKind, u32)> {
        self.page_requests.borrow().clone()
    }

    pub fn blob_fetches(&self) -> usize {
        *self.blob_fetches.borrow()
    }
}

fn not_found(what: String) -> RemoteError {
    RemoteError::NotFound { url: what }
}

impl RemoteSource for FakeRemote {
    fn list_repos_page(
        &self,
        namespace: &str,
        kind: NamespaceKind,
        page: u32,
        per_page: usize,
    ) -> Result<Vec<RemoteRepo>, RemoteError> {
        self.page_requests
            .borrow_mut()
            .push((namespace.to_string(), kind, page));
        let listing = match kind {
            NamespaceKind::User => self.users.get(namespace),
            NamespaceKind::Org => self.orgs.get(namespace),
        }
        .ok_or_else(|| not_found(format!("{kind}/{namespace}")))?;
        let start = (page as usize - 1) * per_page;
        Ok(listing.iter().skip(start).take(per_page).cloned().collect())
    }

    fn resolve_branch_head(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
    ) -> Result<String, RemoteError> {
        self.repos
            .get(&format!("{owner}/{repo}"))
            .and_then(|r| r.branches.get(branch))
            .cloned()
            .ok_or_else(|| not_found(format!("{owner}/{repo}@{branch}")))
    }

    fn list_tree(
        &self,
        owner: &str,
        repo: &str,
        _commit_sha: &str,
    ) -> Result<Vec<TreeEntry>, RemoteError> {
        self.repos
            .get(&format!("{owner}/{repo}"))
            .map(|r| r.tree.clone())
            .ok_or_else(|| not_found(format!("{owner}/{repo}")))
    }

    fn fetch_blob(
        &self,
        _owner: &str,
        _repo: &str,
        entry: &TreeEntry,
    ) -> Result<Vec<u8>, RemoteError> {
        *self.blob_fetches.borrow_mut() += 1;
        if self.failing_blobs.contains(&entry.sha) {
            return Err(RemoteError::Status {
                code: 500,
                url: entry.sha.clone(),
            });
        }
        self.blobs
            .get(&entry.sha)
            .cloned()
            .ok_or_else(|| not_found(entry.sha.clone()))
    }
}

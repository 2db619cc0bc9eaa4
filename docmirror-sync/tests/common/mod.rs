#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use docmirror_core::{ManualRepo, MirrorConfig, NamespaceKind, RemoteRepo, TreeEntry};
use docmirror_remote::{RemoteError, RemoteSource};
use docmirror_sync::{run_with, FsStore, RunOptions, RunSummary};
use tempfile::TempDir;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A mutable in-memory GitHub: namespaces, branches and file contents.
#[derive(Default)]
pub struct MemoryRemote {
    namespaces: HashMap<String, Vec<RemoteRepo>>,
    files: HashMap<String, Vec<(String, Vec<u8>)>>,
    pub blob_fetches: RefCell<usize>,
}

impl MemoryRemote {
    pub fn namespace(&mut self, name: &str, repos: Vec<RemoteRepo>) {
        self.namespaces.insert(name.to_string(), repos);
    }

    pub fn put(&mut self, repo_id: &str, path: &str, contents: &str) {
        let files = self.files.entry(repo_id.to_string()).or_default();
        files.retain(|(p, _)| p != path);
        files.push((path.to_string(), contents.as_bytes().to_vec()));
    }

    pub fn put_bytes(&mut self, repo_id: &str, path: &str, contents: &[u8]) {
        let files = self.files.entry(repo_id.to_string()).or_default();
        files.retain(|(p, _)| p != path);
        files.push((path.to_string(), contents.to_vec()));
    }

    pub fn remove(&mut self, repo_id: &str, path: &str) {
        if let Some(files) = self.files.get_mut(repo_id) {
            files.retain(|(p, _)| p != path);
        }
    }
}

pub fn public_repo(owner: &str, name: &str) -> RemoteRepo {
    RemoteRepo {
        name: name.to_string(),
        owner: owner.to_string(),
        private: false,
        fork: false,
        archived: false,
        default_branch: Some("main".to_string()),
    }
}

impl RemoteSource for MemoryRemote {
    fn list_repos_page(
        &self,
        namespace: &str,
        kind: NamespaceKind,
        page: u32,
        per_page: usize,
    ) -> Result<Vec<RemoteRepo>, RemoteError> {
        if kind == NamespaceKind::Org {
            return Err(RemoteError::NotFound {
                url: namespace.to_string(),
            });
        }
        let repos = self
            .namespaces
            .get(namespace)
            .ok_or_else(|| RemoteError::NotFound {
                url: namespace.to_string(),
            })?;
        let start = (page as usize - 1) * per_page;
        Ok(repos.iter().skip(start).take(per_page).cloned().collect())
    }

    fn resolve_branch_head(
        &self,
        owner: &str,
        repo: &str,
        branch: &str,
    ) -> Result<String, RemoteError> {
        let id = format!("{owner}/{repo}");
        if self.files.contains_key(&id) {
            Ok(format!("{id}@{branch}"))
        } else {
            Err(RemoteError::NotFound { url: id })
        }
    }

    fn list_tree(
        &self,
        owner: &str,
        repo: &str,
        _commit_sha: &str,
    ) -> Result<Vec<TreeEntry>, RemoteError> {
        let id = format!("{owner}/{repo}");
        let files = self
            .files
            .get(&id)
            .ok_or_else(|| RemoteError::NotFound { url: id.clone() })?;
        Ok(files
            .iter()
            .map(|(path, _)| TreeEntry::blob(path, &format!("{id}:{path}")))
            .collect())
    }

    fn fetch_blob(
        &self,
        owner: &str,
        repo: &str,
        entry: &TreeEntry,
    ) -> Result<Vec<u8>, RemoteError> {
        *self.blob_fetches.borrow_mut() += 1;
        let id = format!("{owner}/{repo}");
        self.files
            .get(&id)
            .and_then(|files| files.iter().find(|(p, _)| *p == entry.path))
            .map(|(_, bytes)| bytes.clone())
            .ok_or_else(|| RemoteError::NotFound {
                url: entry.sha.clone(),
            })
    }
}

/// Temporary home + vault with a config pointing at the vault.
pub struct Scenario {
    pub home: TempDir,
    pub vault: TempDir,
    pub config: MirrorConfig,
    pub remote: MemoryRemote,
}

impl Scenario {
    pub fn new() -> Self {
        init_logging();
        let home = TempDir::new().expect("home");
        let vault = TempDir::new().expect("vault");
        let config = MirrorConfig::new(vault.path().to_path_buf());
        Self {
            home,
            vault,
            config,
            remote: MemoryRemote::default(),
        }
    }

    pub fn manual(&mut self, repo: &str) {
        self.config.repositories.push(ManualRepo {
            repo: repo.to_string(),
            branch: None,
        });
    }

    pub fn run(&self) -> RunSummary {
        self.run_with(RunOptions::default())
    }

    pub fn run_with(&self, options: RunOptions) -> RunSummary {
        let store = FsStore::new(self.vault.path());
        run_with(&self.config, &self.remote, &store, self.home.path(), options).expect("run")
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.vault.path().join(rel)
    }

    pub fn read(&self, rel: &str) -> String {
        std::fs::read_to_string(self.path(rel)).expect("read mirrored file")
    }

    pub fn exists(&self, rel: &str) -> bool {
        Path::new(&self.path(rel)).exists()
    }
}

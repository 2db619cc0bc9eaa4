use std::cell::RefCell;
use std::collections::HashMap;

use docmirror_core::{NamespaceKind, RemoteRepo, RepoOrigin, RepoRef, TreeEntry};
use docmirror_remote::{
    list_all_repos, list_namespace_repos, list_syncable, FileKind, RemoteError, RemoteSource,
    PER_PAGE,
};

/// Serves canned pages and records every page request.
#[derive(Default)]
struct ScriptedRemote {
    user_pages: HashMap<String, Vec<usize>>,
    org_pages: HashMap<String, Vec<usize>>,
    tree: Vec<TreeEntry>,
    requests: RefCell<Vec<(String, NamespaceKind, u32)>>,
}

impl ScriptedRemote {
    fn page_sizes(&self, namespace: &str, kind: NamespaceKind) -> Option<&Vec<usize>> {
        match kind {
            NamespaceKind::User => self.user_pages.get(namespace),
            NamespaceKind::Org => self.org_pages.get(namespace),
        }
    }
}

fn repo(owner: &str, name: &str) -> RemoteRepo {
    RemoteRepo {
        name: name.to_string(),
        owner: owner.to_string(),
        private: false,
        fork: false,
        archived: false,
        default_branch: None,
    }
}

impl RemoteSource for ScriptedRemote {
    fn list_repos_page(
        &self,
        namespace: &str,
        kind: NamespaceKind,
        page: u32,
        _per_page: usize,
    ) -> Result<Vec<RemoteRepo>, RemoteError> {
        self.requests
            .borrow_mut()
            .push((namespace.to_string(), kind, page));
        let sizes = self.page_sizes(namespace, kind).ok_or(RemoteError::NotFound {
            url: format!("{kind}/{namespace}"),
        })?;
        let size = sizes.get(page as usize - 1).copied().unwrap_or(0);
        Ok((0..size)
            .map(|i| repo(namespace, &format!("r{page}-{i}")))
            .collect())
    }

    fn resolve_branch_head(
        &self,
        _owner: &str,
        _repo: &str,
        branch: &str,
    ) -> Result<String, RemoteError> {
        if branch == "main" {
            Ok("c0ffee".to_string())
        } else {
            Err(RemoteError::NotFound {
                url: format!("branches/{branch}"),
            })
        }
    }

    fn list_tree(
        &self,
        _owner: &str,
        _repo: &str,
        commit_sha: &str,
    ) -> Result<Vec<TreeEntry>, RemoteError> {
        assert_eq!(commit_sha, "c0ffee");
        Ok(self.tree.clone())
    }

    fn fetch_blob(
        &self,
        _owner: &str,
        _repo: &str,
        _entry: &TreeEntry,
    ) -> Result<Vec<u8>, RemoteError> {
        Ok(Vec::new())
    }
}

#[test]
fn full_page_then_empty_page_stops_after_two_requests() {
    let mut remote = ScriptedRemote::default();
    remote
        .user_pages
        .insert("octo".into(), vec![PER_PAGE, 0, PER_PAGE]);

    let repos = list_all_repos(&remote, "octo", NamespaceKind::User).unwrap();
    assert_eq!(repos.len(), PER_PAGE);
    assert_eq!(remote.requests.borrow().len(), 2);
}

#[test]
fn short_page_stops_immediately() {
    let mut remote = ScriptedRemote::default();
    remote.user_pages.insert("octo".into(), vec![7, PER_PAGE]);

    let repos = list_all_repos(&remote, "octo", NamespaceKind::User).unwrap();
    assert_eq!(repos.len(), 7);
    assert_eq!(remote.requests.borrow().len(), 1);
}

#[test]
fn pages_are_concatenated_in_order() {
    let mut remote = ScriptedRemote::default();
    remote
        .user_pages
        .insert("octo".into(), vec![PER_PAGE, PER_PAGE, 3]);

    let repos = list_all_repos(&remote, "octo", NamespaceKind::User).unwrap();
    assert_eq!(repos.len(), 2 * PER_PAGE + 3);
    assert_eq!(repos[0].name, "r1-0");
    assert_eq!(repos[PER_PAGE].name, "r2-0");
    assert_eq!(repos.last().unwrap().name, "r3-2");
}

#[test]
fn org_listing_is_tried_when_user_listing_fails() {
    let mut remote = ScriptedRemote::default();
    remote.org_pages.insert("acme".into(), vec![2]);

    let repos = list_namespace_repos(&remote, "acme").unwrap();
    assert_eq!(repos.len(), 2);
    let kinds: Vec<NamespaceKind> = remote.requests.borrow().iter().map(|r| r.1).collect();
    assert_eq!(kinds, [NamespaceKind::User, NamespaceKind::Org]);
}

#[test]
fn user_listing_success_skips_org() {
    let mut remote = ScriptedRemote::default();
    remote.user_pages.insert("octo".into(), vec![1]);
    remote.org_pages.insert("octo".into(), vec![5]);

    let repos = list_namespace_repos(&remote, "octo").unwrap();
    assert_eq!(repos.len(), 1);
    assert_eq!(remote.requests.borrow().len(), 1);
}

#[test]
fn unknown_namespace_reports_both_attempts_failed() {
    let remote = ScriptedRemote::default();
    let err = list_namespace_repos(&remote, "ghost").unwrap_err();
    assert!(matches!(err, RemoteError::Namespace { ref namespace, .. } if namespace == "ghost"));
}

#[test]
fn syncable_listing_filters_tree() {
    let remote = ScriptedRemote {
        tree: vec![
            TreeEntry::blob("README.md", "1"),
            TreeEntry::tree("docs", "2"),
            TreeEntry::blob("docs/arch.svg", "3"),
            TreeEntry::blob("src/lib.rs", "4"),
        ],
        ..ScriptedRemote::default()
    };
    let main = RepoRef::new("octo", "docs", "main", RepoOrigin::Manual);

    let without_media = list_syncable(&remote, &main, false).unwrap();
    assert_eq!(without_media.len(), 1);
    assert_eq!(without_media[0].kind, FileKind::Markdown);

    let with_media = list_syncable(&remote, &main, true).unwrap();
    let paths: Vec<&str> = with_media.iter().map(|f| f.path()).collect();
    assert_eq!(paths, ["README.md", "docs/arch.svg"]);

    let missing = RepoRef::new("octo", "docs", "gone", RepoOrigin::Manual);
    assert!(list_syncable(&remote, &missing, false)
        .unwrap_err()
        .is_not_found());
}

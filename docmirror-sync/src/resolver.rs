//! Repository resolution: manual entries plus namespace discovery.

use std::collections::HashSet;

use docmirror_core::{DiscoveryFilters, MirrorConfig, RemoteRepo, RepoId, RepoOrigin, RepoRef};
use docmirror_core::types::DEFAULT_BRANCH;
use docmirror_remote::{list_namespace_repos, RemoteSource};

use crate::error::SyncError;

/// `*` matches any run, `?` one character. Case-insensitive.
pub fn glob_match(pattern: &str, text: &str) -> bool {
    let p: Vec<char> = pattern.to_lowercase().chars().collect();
    let t: Vec<char> = text.to_lowercase().chars().collect();
    let (mut pi, mut ti) = (0usize, 0usize);
    let mut star_pi: Option<usize> = None;
    let mut star_ti = 0usize;

    while ti < t.len() {
        if pi < p.len() && (p[pi] == t[ti] || p[pi] == '?') {
            pi += 1;
            ti += 1;
            continue;
        }
        if pi < p.len() && p[pi] == '*' {
            star_pi = Some(pi);
            pi += 1;
            star_ti = ti;
            continue;
        }
        if let Some(sp) = star_pi {
            pi = sp + 1;
            star_ti += 1;
            ti = star_ti;
            continue;
        }
        return false;
    }

    while pi < p.len() && p[pi] == '*' {
        pi += 1;
    }
    pi == p.len()
}

/// Visibility, fork, archive and name filters for a discovered repository.
pub fn passes_filters(repo: &RemoteRepo, filters: &DiscoveryFilters) -> bool {
    if repo.private && !filters.include_private {
        return false;
    }
    if repo.fork && !filters.include_forks {
        return false;
    }
    if repo.archived && !filters.include_archived {
        return false;
    }
    let glob = filters.name_glob.trim();
    glob.is_empty() || glob == "*" || glob_match(glob, &repo.name)
}

/// Repositories found by discovery plus the namespaces that failed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Discovery {
    pub repos: Vec<RepoRef>,
    pub failed_namespaces: Vec<String>,
}

/// Outcome of [`resolve`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Resolved {
    /// Manual entries first, then discovered ones.
    pub repos: Vec<RepoRef>,
    /// Namespaces whose listing failed this run. Their folders must not be
    /// treated as removed.
    pub failed_namespaces: Vec<String>,
}

/// Discover repositories across namespaces. A namespace that cannot be
/// listed is logged and skipped.
pub fn discover<S: RemoteSource + ?Sized>(
    source: &S,
    namespaces: &[String],
    filters: &DiscoveryFilters,
) -> Discovery {
    let mut seen = HashSet::<RepoId>::new();
    let mut found = Discovery::default();
    for namespace in namespaces {
        let repos = match list_namespace_repos(source, namespace) {
            Ok(repos) => repos,
            Err(e) => {
                tracing::warn!("skipping namespace {namespace}: {e}");
                found.failed_namespaces.push(namespace.clone());
                continue;
            }
        };
        let total = repos.len();
        let mut kept = 0usize;
        for repo in repos.iter().filter(|r| passes_filters(r, filters)) {
            let branch = repo
                .default_branch
                .as_deref()
                .filter(|b| !b.is_empty())
                .unwrap_or(DEFAULT_BRANCH);
            let resolved = RepoRef::new(&repo.owner, &repo.name, branch, RepoOrigin::Auto);
            if seen.insert(resolved.id()) {
                found.repos.push(resolved);
                kept += 1;
            }
        }
        tracing::info!("namespace {namespace}: {kept} of {total} repositories selected");
    }
    found
}

/// Manual entries first; an auto entry is dropped when a manual one shares
/// its identity.
pub fn merge(manual: Vec<RepoRef>, auto: Vec<RepoRef>) -> Vec<RepoRef> {
    let mut seen: HashSet<RepoId> = manual.iter().map(RepoRef::id).collect();
    let mut out = manual;
    for repo in auto {
        if seen.insert(repo.id()) {
            out.push(repo);
        } else {
            tracing::debug!("{} configured manually; ignoring discovered entry", repo.id());
        }
    }
    out
}

/// Resolve the full repository list for a run.
pub fn resolve<S: RemoteSource + ?Sized>(
    config: &MirrorConfig,
    source: &S,
) -> Result<Resolved, SyncError> {
    let manual = config.manual_repos()?;
    let namespaces = config.discovery_namespaces();
    let discovery = if namespaces.is_empty() {
        Discovery::default()
    } else {
        discover(source, &namespaces, &config.filters)
    };
    Ok(Resolved {
        repos: merge(manual, discovery.repos),
        failed_namespaces: discovery.failed_namespaces,
    })
}

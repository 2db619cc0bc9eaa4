//! `docmirror init --base-path <dir> [--token ..] [--namespace ..]... [--repo ..]...`

use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};
use clap::Args;

use docmirror_core::{
    config::{self, config_path_at},
    types::{RepoOrigin, RepoRef},
    ManualRepo, MirrorConfig,
};

/// `owner/repo` with an optional `@branch` suffix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoArg(pub ManualRepo);

impl FromStr for RepoArg {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (spec, branch) = match s.split_once('@') {
            Some((spec, branch)) if !branch.trim().is_empty() => {
                (spec, Some(branch.trim().to_string()))
            }
            Some(_) => return Err(format!("empty branch in '{s}'")),
            None => (s, None),
        };
        if RepoRef::parse(spec, "main", RepoOrigin::Manual).is_none() {
            return Err(format!("invalid repository '{spec}'; expected owner/repo"));
        }
        Ok(Self(ManualRepo {
            repo: spec.trim().to_string(),
            branch,
        }))
    }
}

/// Create the docmirror configuration.
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Local folder that holds the mirror (created if missing).
    #[arg(long)]
    pub base_path: PathBuf,

    /// GitHub access token; `DOCMIRROR_TOKEN` overrides it at run time.
    #[arg(long)]
    pub token: Option<String>,

    /// User or organization whose repositories are discovered automatically.
    #[arg(long = "namespace", value_name = "NAMESPACE")]
    pub namespaces: Vec<String>,

    /// Explicit repository, `owner/repo` or `owner/repo@branch`.
    #[arg(long = "repo", value_name = "OWNER/REPO[@BRANCH]")]
    pub repos: Vec<RepoArg>,
}

impl InitArgs {
    pub fn run(self) -> Result<()> {
        let home = super::home_dir()?;

        if !self.base_path.exists() {
            fs::create_dir_all(&self.base_path)
                .with_context(|| format!("cannot create '{}'", self.base_path.display()))?;
        }
        let base_path = self
            .base_path
            .canonicalize()
            .with_context(|| format!("cannot resolve path '{}'", self.base_path.display()))?;

        let existed = config_path_at(&home).exists();
        let mut cfg = MirrorConfig::new(base_path);
        cfg.token = self.token;
        cfg.namespaces = self.namespaces;
        cfg.repositories = self.repos.into_iter().map(|r| r.0).collect();

        let saved = config::init_at(&home, cfg).context("failed to write configuration")?;
        if existed {
            println!(
                "Configuration already exists at {}; left unchanged",
                config_path_at(&home).display()
            );
            return Ok(());
        }

        println!("✓ Wrote {}", config_path_at(&home).display());
        println!(
            "  Mirror folder: {}",
            saved.base_path.join(&saved.base_folder).display()
        );
        println!(
            "  namespaces: {}, explicit repositories: {}",
            saved.namespaces.len(),
            saved.repositories.len()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repo_arg_with_and_without_branch() {
        let plain: RepoArg = "octo/docs".parse().unwrap();
        assert_eq!(plain.0.repo, "octo/docs");
        assert_eq!(plain.0.branch, None);

        let pinned: RepoArg = "octo/docs@release".parse().unwrap();
        assert_eq!(pinned.0.branch.as_deref(), Some("release"));
    }

    #[test]
    fn repo_arg_rejects_malformed_input() {
        assert!("octo".parse::<RepoArg>().is_err());
        assert!("octo/docs@".parse::<RepoArg>().is_err());
        assert!("/docs".parse::<RepoArg>().is_err());
    }
}

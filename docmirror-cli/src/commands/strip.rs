//! `docmirror strip` — remove mirror annotations from local files.

use anyhow::{bail, Context, Result};
use clap::Args;

use docmirror_core::{config, RepoId};
use docmirror_sync::{strip::strip_tree, FsStore};

/// Arguments for `docmirror strip`.
#[derive(Args, Debug)]
pub struct StripArgs {
    /// Only strip files of this repository (`owner/repo`).
    #[arg(long, value_name = "OWNER/REPO")]
    pub repo: Option<String>,

    /// List the files that would change without rewriting them.
    #[arg(long)]
    pub dry_run: bool,
}

impl StripArgs {
    pub fn run(self) -> Result<()> {
        let home = super::home_dir()?;
        let cfg = config::load_at(&home)
            .context("failed to load configuration — run `docmirror init` first")?;

        let only = match self.repo.as_deref() {
            Some(spec) => {
                let id = RepoId::from(spec.trim());
                if id.split().is_none() {
                    bail!("invalid repository '{spec}': expected owner/repo");
                }
                Some(id)
            }
            None => None,
        };

        let store = FsStore::new(&cfg.base_path);
        let report = strip_tree(&store, &cfg.base_folder_path(), only.as_ref(), self.dry_run)
            .context("strip failed")?;

        let prefix = if self.dry_run { "[dry-run] " } else { "" };
        for path in &report.stripped {
            println!("{prefix}  ✎  {}", path.display());
        }
        for (path, reason) in &report.failed {
            println!("{prefix}  !  {}: {reason}", path.display());
        }
        println!(
            "{prefix}{} stripped, {} skipped, {} failed",
            report.stripped.len(),
            report.skipped,
            report.failed.len()
        );

        if !report.failed.is_empty() {
            bail!("{} files could not be stripped", report.failed.len());
        }
        Ok(())
    }
}

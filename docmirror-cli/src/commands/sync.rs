//! `docmirror sync` — one reconciliation run in the foreground.

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;

use docmirror_daemon::init_tracing;
use docmirror_sync::{run_from_config, RepoOutcome, RunOptions, RunSummary, WriteResult};

/// Arguments for `docmirror sync`.
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Report what would change without writing, deleting or saving state.
    #[arg(long)]
    pub dry_run: bool,

    /// List every file, including unchanged ones.
    #[arg(long, short)]
    pub verbose: bool,
}

impl SyncArgs {
    pub fn run(self) -> Result<()> {
        init_tracing();
        let home = super::home_dir()?;

        let summary = run_from_config(
            &home,
            RunOptions {
                dry_run: self.dry_run,
            },
        )
        .context("sync failed")?;

        print_summary(&summary, self.verbose);

        let failed = summary.failed();
        if failed > 0 {
            bail!("{failed} of {} repositories failed", summary.repos.len());
        }
        Ok(())
    }
}

fn print_summary(summary: &RunSummary, verbose: bool) {
    let prefix = if summary.dry_run { "[dry-run] " } else { "" };

    for outcome in &summary.repos {
        print_repo(prefix, outcome, verbose);
    }
    for id in &summary.cleanup.removed {
        println!("{prefix}{} '{id}' removed (no longer configured)", "✗".yellow());
    }
    for (id, reason) in &summary.cleanup.failed {
        println!("{prefix}{} could not remove '{id}': {reason}", "!".red());
    }

    let counts = summary.counts();
    println!(
        "{prefix}{} synced, {} failed, {} removed | {} written, {} unchanged, {} pruned ({} ms)",
        counts.succeeded,
        counts.failed,
        counts.removed,
        counts.written,
        counts.unchanged,
        counts.pruned,
        counts.duration_ms,
    );
}

fn print_repo(prefix: &str, outcome: &RepoOutcome, verbose: bool) {
    let id = outcome.repo.id();
    if let Some(err) = &outcome.error {
        println!("{prefix}{} '{id}' failed: {err}", "✗".red());
        return;
    }

    let mark = if outcome.succeeded() {
        "✓".green()
    } else {
        "!".yellow()
    };
    println!(
        "{prefix}{mark} '{id}' ({} written, {} unchanged, {} pruned)",
        outcome.sync.written(),
        outcome.sync.unchanged(),
        outcome.prune.deleted_files.len(),
    );

    for write in &outcome.sync.writes {
        match write {
            WriteResult::Written { path } => println!("  ✎  {}", path.display()),
            WriteResult::WouldWrite { path } => println!("  ~  {}", path.display()),
            WriteResult::Unchanged { path } if verbose => println!("  ·  {}", path.display()),
            WriteResult::Unchanged { .. } => {}
        }
    }
    for path in &outcome.prune.deleted_files {
        println!("  -  {}", path.display());
    }
    for failure in &outcome.sync.failures {
        println!("  {}  {}: {}", "!".red(), failure.path.display(), failure.reason);
    }
}

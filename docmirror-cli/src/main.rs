//! docmirror — mirror Markdown from GitHub repositories into a local folder.
//!
//! # Usage
//!
//! ```text
//! docmirror init --base-path <dir> [--token <t>] [--namespace <ns>]... [--repo owner/repo[@branch]]...
//! docmirror sync [--dry-run]
//! docmirror status [--json]
//! docmirror strip [--repo owner/repo] [--dry-run]
//! docmirror daemon start|stop|status|sync
//! ```

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{
    daemon::DaemonCommand, init::InitArgs, status::StatusArgs, strip::StripArgs, sync::SyncArgs,
};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "docmirror",
    version,
    about = "Mirror Markdown documentation from GitHub into a local notes folder",
    long_about = None,
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write ~/.docmirror/config.yaml.
    Init(InitArgs),

    /// Reconcile the local mirror with the configured repositories.
    Sync(SyncArgs),

    /// Show the last sync and what is mirrored locally.
    Status(StatusArgs),

    /// Remove mirror annotations from local Markdown files.
    Strip(StripArgs),

    /// Run or talk to the background sync daemon.
    Daemon {
        #[command(subcommand)]
        command: DaemonCommand,
    },
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Init(args) => args.run(),
        Commands::Sync(args) => args.run(),
        Commands::Status(args) => args.run(),
        Commands::Strip(args) => args.run(),
        Commands::Daemon { command } => commands::daemon::run(command),
    }
}

//! `docmirror status` — last sync and local mirror contents.

use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use docmirror_core::{config, state};
use docmirror_sync::{
    status::{self, format_datetime_age},
    FsStore, StatusReport,
};

/// Arguments for `docmirror status`.
#[derive(Args, Debug)]
pub struct StatusArgs {
    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Tabled)]
struct StatusTableRow {
    #[tabled(rename = "repository")]
    repository: String,
    #[tabled(rename = "local folder")]
    present: String,
    #[tabled(rename = "markdown")]
    markdown: usize,
    #[tabled(rename = "media")]
    media: usize,
}

impl StatusArgs {
    pub fn run(self) -> Result<()> {
        let home = super::home_dir()?;
        let cfg = config::load_at(&home)
            .context("failed to load configuration — run `docmirror init` first")?;
        let baseline = state::load_at(&home).context("failed to load sync state")?;
        let store = FsStore::new(&cfg.base_path);

        let report =
            status::collect(&cfg, &baseline, &store).context("failed to inspect mirror folder")?;

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&report).context("failed to serialize status JSON")?
            );
            return Ok(());
        }

        print_table(&cfg.base_path.join(&cfg.base_folder).display().to_string(), report);
        Ok(())
    }
}

fn print_table(mirror: &str, report: StatusReport) {
    let last_sync = match report.last_sync_time {
        Some(at) => format!("{} ({})", at.to_rfc3339(), format_datetime_age(at)),
        None => "never".to_string(),
    };
    println!(
        "docmirror v{} | {} | last sync: {}",
        env!("CARGO_PKG_VERSION"),
        mirror,
        last_sync
    );

    if report.repos.is_empty() {
        println!("No repositories tracked yet.");
        return;
    }

    let missing = report.repos.iter().filter(|r| !r.present).count();
    let rows: Vec<StatusTableRow> = report
        .repos
        .into_iter()
        .map(|r| StatusTableRow {
            repository: r.id,
            present: if r.present {
                "■ present".green().to_string()
            } else {
                "■ missing".red().to_string()
            },
            markdown: r.markdown_files,
            media: r.media_files,
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");

    if missing > 0 {
        println!("Run 'docmirror sync' to fetch {missing} missing repositories.");
    }
}

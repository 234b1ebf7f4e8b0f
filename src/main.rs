//! `repro-check`: readiness checks for reproduction branches
//!
//! Validates each selected `repro/<id>` branch against its devcontainer
//! descriptor and the registry, prints one line item per branch and a
//! summary, and exits 1 if any branch failed.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{ArgGroup, Parser};
use pruva_branches::readiness::DEFAULT_LATEST;
use pruva_branches::{App, ReadinessOptions, ReadinessValidator, Selection};

#[derive(Parser, Debug)]
#[command(name = "repro-check")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Check that reproduction branches are ready to run", long_about = None)]
#[command(group(ArgGroup::new("selection").args(["latest", "all", "branch", "repro_ids"])))]
struct Cli {
    /// Check the N most recently committed reproduction branches
    #[arg(long, value_name = "N")]
    latest: Option<usize>,

    /// Check every reproduction branch
    #[arg(long)]
    all: bool,

    /// Check a single branch (a bare id is mapped to repro/<id>)
    #[arg(long, value_name = "NAME")]
    branch: Option<String>,

    /// Check the branches of these ids
    #[arg(long, value_name = "IDS", value_delimiter = ',')]
    repro_ids: Option<Vec<String>>,

    /// Skip downloading the reproduction script
    #[arg(long)]
    no_download: bool,

    /// Registry base URL
    #[arg(long, value_name = "URL")]
    api_url: Option<String>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn selection(&self) -> Selection {
        if let Some(branch) = &self.branch {
            Selection::Branch(branch.clone())
        } else if let Some(ids) = &self.repro_ids {
            Selection::Ids(ids.clone())
        } else if self.all {
            Selection::All
        } else {
            Selection::Latest(self.latest.unwrap_or(DEFAULT_LATEST))
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let app = App::bootstrap("repro-check", cli.verbose, cli.api_url.clone())?;

    let mut options = ReadinessOptions::from_config(&app.config);
    if cli.no_download {
        options = options.without_download();
    }

    let report = ReadinessValidator::new(&app.repo, &app.registry, options)
        .run(&cli.selection())
        .await
        .context("Could not list reproduction branches")?;

    if cli.json {
        println!("{}", report.to_json()?);
    } else {
        print!("{}", report.render_text());
    }

    tracing::info!(
        total = report.summary.total,
        failed = report.summary.failed,
        "Readiness run finished"
    );

    Ok(if report.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

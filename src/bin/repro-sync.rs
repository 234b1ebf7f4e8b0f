//! `repro-sync`: create a `repro/<id>` branch for every reproduction the
//! registry knows about. Best effort: problems are reported per id and the
//! exit status is always 0.

use anyhow::Result;
use clap::Parser;
use pruva_branches::{sync_from_registry, App};

#[derive(Parser, Debug)]
#[command(name = "repro-sync")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Create missing reproduction branches from the registry", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let app = match App::bootstrap("repro-sync", cli.verbose, None) {
        Ok(app) => app,
        Err(err) => {
            eprintln!("repro-sync: {err:#}");
            return Ok(());
        }
    };

    println!("Syncing reproduction branches from {}", app.config.api_url);
    match sync_from_registry(&app.repo, &app.registry).await {
        Ok(report) => {
            for item in &report.items {
                println!("{item}");
            }
            println!("{}", report.summary_line());
        }
        Err(err) => {
            tracing::error!(error = %err, "Sync aborted");
            eprintln!("repro-sync: {err}");
        }
    }

    Ok(())
}

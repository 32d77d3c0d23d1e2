use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tracing::error;

use sales_ledger::{logging, pipeline, Config};

#[derive(Parser)]
#[command(name = "sales_ledger")]
#[command(about = "Merge regional order files into a validated sales ledger")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to a TOML config file (defaults to ./config.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print the run summary as JSON instead of the text report
    #[arg(long)]
    json: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load environment variables
    dotenv::dotenv().ok();

    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    let _log_guard = logging::init_logging(&config.logging);

    let summary = match pipeline::run(&config) {
        Ok(summary) => summary,
        Err(e) => {
            error!("Sales ledger run failed: {}", e);
            return Err(e).context("Sales ledger run failed");
        }
    };

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("{}", summary.report);
    }
    Ok(())
}

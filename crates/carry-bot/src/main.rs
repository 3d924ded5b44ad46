//! Funding-carry executor entry point.
//!
//! Shorts deeply negative funding across each settlement window:
//! scan, enter, protect, hold, flatten, on a schedule aligned to the
//! funding reset cadence.

use anyhow::Result;
use clap::Parser;
use tracing::info;

/// Funding-rate carry executor
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via CARRY_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    carry_telemetry::init_logging()?;

    info!("Starting carry-bot v{}", env!("CARGO_PKG_VERSION"));

    // Config resolution: CLI arg wins, otherwise CARRY_CONFIG env var
    // or the default path with a fallback to built-in defaults.
    let config = match args.config {
        Some(path) => {
            info!(config_path = %path, "Loading configuration");
            carry_bot::AppConfig::from_file(&path)?
        }
        None => carry_bot::AppConfig::load()?,
    };

    let app = carry_bot::Application::new(config)?;

    info!("Loading venue metadata...");
    app.run_preflight().await?;

    app.run().await?;

    Ok(())
}

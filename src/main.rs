//! Reelcast CLI
//!
//! Batch media transcoder built on ffmpeg and ffprobe.
//!
//! # Usage
//!
//! ```bash
//! reelcast -d ~/videos -r display
//! reelcast -f movie.mkv convert --streams 0,1,3 --crf 20 --subtitle movie.srt
//! reelcast convert --dry-run
//! ```

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use tracing::info;

use reelcast::cli::{commands, Cli, Commands};
use reelcast::config_initialization::{initialize_configuration_hierarchy, CliOverrides};
use reelcast::utils::logging::init_logging;

/// Main entry point for the Reelcast CLI application
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.log_level, cli.log_format)
        .map_err(|e| anyhow!("Failed to initialize logging: {}", e))?;
    info!("Starting Reelcast");

    let overrides = CliOverrides {
        ffmpeg_path: cli.ffmpeg.clone(),
        ffprobe_path: cli.ffprobe.clone(),
    };
    let config = initialize_configuration_hierarchy(cli.config.as_deref(), &overrides)
        .context("Failed to load configuration")?;

    match &cli.command {
        Commands::Display(args) => {
            info!("Executing display command");
            commands::display(&cli, args, &config).await?;
        }
        Commands::Convert(args) => {
            info!("Executing convert command");
            commands::convert(&cli, args, config, ctrl_c()).await?;
        }
    }

    info!("Reelcast completed successfully");
    Ok(())
}

/// Resolves on Ctrl-C; never resolves if the handler cannot be installed
async fn ctrl_c() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}

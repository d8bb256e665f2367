//! gapcut
//!
//! Removes dead air and advertisement breaks from recorded video.
//!
//! # Usage
//!
//! ```bash
//! gapcut scan ~/Recordings
//! gapcut remove --keep-backup "show.mkv"
//! gapcut plan --gap 50-60 --gap 2:00-2:10 --no-snap "show.mkv"
//! ```

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use gapcut_cli::cli::{commands, Cli, Commands};
use gapcut_cli::initialize_configuration_hierarchy;
use gapcut_cli::utils::logging::init_logging;

/// Main entry point for the gapcut CLI application
#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    init_logging(cli.log_level.as_deref(), cli.log_format, cli.log_file.as_deref())?;
    info!("Starting gapcut");

    let cwd = std::env::current_dir().context("Failed to read the working directory")?;
    let config = initialize_configuration_hierarchy(&cli.config, &cwd)?;

    let code = match cli.command {
        Commands::Scan(args) => {
            info!("Executing scan command");
            commands::scan(args, &config).await?
        }
        Commands::Remove(args) => {
            info!("Executing remove command");
            commands::remove(args, &config).await?
        }
        Commands::Plan(args) => {
            info!("Executing plan command");
            commands::plan(args, &config).await?
        }
    };

    info!("gapcut finished");
    Ok(code)
}

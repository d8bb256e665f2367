//! CLI module for gapcut
//!
//! This module handles command-line argument parsing and command execution.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::utils::logging::LogFormat;

pub mod args;
pub mod commands;

/// gapcut - remove frozen, silent and advertisement stretches from recordings
///
/// Finds regions where the picture is frozen and the sound silent at the same
/// time, plus chapters titled as advertisements, and splices them out with a
/// lossless stream copy whose cuts land on keyframes.
#[derive(Parser, Debug)]
#[command(name = "gapcut")]
#[command(about = "Remove dead air and advertisement breaks from recorded video")]
#[command(version)]
pub struct Cli {
    /// Logging level (trace, debug, info, warn, error)
    #[arg(long, global = true, env = "GAPCUT_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Pretty, global = true)]
    pub log_format: LogFormat,

    /// Write logs to this file instead of stderr
    #[arg(long, global = true)]
    pub log_file: Option<PathBuf>,

    #[command(flatten)]
    pub config: args::ConfigArgs,

    /// The command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Find gaps and print the keep-segment plan; never modifies media
    Scan(args::ScanArgs),
    /// Find gaps and splice them out, replacing the original file
    Remove(args::RemoveArgs),
    /// Build a keep-segment plan from explicit removal ranges
    Plan(args::PlanArgs),
}

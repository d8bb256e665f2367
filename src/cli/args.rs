//! Command-line argument definitions

use std::path::PathBuf;

use clap::Args;

/// Overrides layered on top of the config file and environment
#[derive(Args, Debug, Default, Clone)]
pub struct ConfigArgs {
    /// Configuration file (default: ./gapcut.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// ffmpeg executable to try; repeat to give fallbacks in order
    #[arg(long = "ffmpeg", value_name = "PATH", global = true)]
    pub ffmpeg: Vec<PathBuf>,

    /// ffprobe executable to try; repeat to give fallbacks in order
    #[arg(long = "ffprobe", value_name = "PATH", global = true)]
    pub ffprobe: Vec<PathBuf>,

    /// Seconds kept clear of each gap at a splice point
    #[arg(long, value_name = "SECONDS", global = true)]
    pub margin: Option<f64>,

    /// Noise tolerance handed to freezedetect
    #[arg(long, value_name = "RATIO", global = true)]
    pub freeze_noise: Option<f64>,

    /// Hide the console progress line
    #[arg(long, global = true)]
    pub no_progress: bool,
}

/// Arguments for the scan command
#[derive(Args, Debug)]
pub struct ScanArgs {
    /// Video file or directory to scan
    pub path: PathBuf,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the remove command
#[derive(Args, Debug)]
pub struct RemoveArgs {
    /// Video file or directory to process
    pub path: PathBuf,

    /// Keep the original next to the result as `<name>.backup`
    #[arg(long)]
    pub keep_backup: bool,

    /// Analyze and plan, but do not splice or replace anything
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the plan command
#[derive(Args, Debug)]
pub struct PlanArgs {
    /// Video file the ranges refer to
    pub file: PathBuf,

    /// Range to remove as START-END (seconds, MM:SS or HH:MM:SS); repeatable
    #[arg(long = "gap", value_name = "START-END", required = true)]
    pub gaps: Vec<String>,

    /// Do not probe for keyframes; use the raw times as in-points
    #[arg(long)]
    pub no_snap: bool,

    /// Write the concat list to this file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

//! Command implementations

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::app::{AppContainer, DefaultAppContainer, FileOutcome, RunMode, RunSummary, ScanResult};
use crate::cli::args::{PlanArgs, RemoveArgs, ScanArgs};
use crate::config_initialization::GapCutConfig;
use crate::domain::model::{Interval, IntervalSet};
use crate::error::GapCutError;
use crate::planner::{EditPlan, EditPlanBuilder};
use crate::ports::{KeyframePort, PassthroughKeyframes};
use crate::utils::time::TimeParser;

/// Execute the scan command
pub async fn scan(args: ScanArgs, config: &GapCutConfig) -> Result<ExitCode> {
    info!("Starting scan of {}", args.path.display());

    let container =
        DefaultAppContainer::from_config(config).context("Failed to set up ffmpeg adapters")?;
    let interactor = container.gap_interactor();
    let files = interactor
        .paths()
        .discover_video_files(&args.path)
        .with_context(|| format!("Failed to collect videos from {}", args.path.display()))?;

    let summary = interactor.run(&files, RunMode::Scan).await?;
    report(&summary, args.json, true)
}

/// Execute the remove command
pub async fn remove(args: RemoveArgs, config: &GapCutConfig) -> Result<ExitCode> {
    info!("Starting gap removal under {}", args.path.display());

    let mut config = config.clone();
    config.keep_backup |= args.keep_backup;

    let container =
        DefaultAppContainer::from_config(&config).context("Failed to set up ffmpeg adapters")?;
    let interactor = container.gap_interactor();
    let files = interactor
        .paths()
        .discover_video_files(&args.path)
        .with_context(|| format!("Failed to collect videos from {}", args.path.display()))?;

    let mode = RunMode::Remove { dry_run: args.dry_run };
    let summary = interactor.run(&files, mode).await?;
    report(&summary, false, false)
}

/// Execute the plan command
pub async fn plan(args: PlanArgs, config: &GapCutConfig) -> Result<ExitCode> {
    if !args.file.is_file() {
        return Err(GapCutError::InputNotFound {
            path: args.file.display().to_string(),
        }
        .into());
    }

    let removal = parse_gaps(&args)?;

    let keyframes: Arc<dyn KeyframePort> = if args.no_snap {
        Arc::new(PassthroughKeyframes)
    } else {
        DefaultAppContainer::from_config(config)
            .context("Failed to set up keyframe probing")?
            .keyframe_port()
    };

    let builder = EditPlanBuilder::new(config.splice_margin);
    let plan = builder
        .build(&removal, &args.file, keyframes.as_ref())
        .await
        .context("No gaps given")?;

    if args.json {
        let json =
            serde_json::to_string_pretty(&plan).context("Failed to serialize edit plan to JSON")?;
        println!("{}", json);
    } else if let Some(output) = &args.output {
        plan.write_concat_list(output)
            .await
            .with_context(|| format!("Failed to write concat list to {}", output.display()))?;
        info!("Concat list written to {}", output.display());
    } else {
        print!("{}", plan.to_concat_list());
    }

    Ok(ExitCode::SUCCESS)
}

fn parse_gaps(args: &PlanArgs) -> Result<IntervalSet> {
    let parser = TimeParser::new();
    let mut removal = IntervalSet::new(args.file.display().to_string(), "removal");

    for gap in &args.gaps {
        let (start, end) = parser
            .parse_range(gap)
            .with_context(|| format!("Invalid gap '{}'", gap))?;
        let interval = Interval::new(start, end, gap.as_str())
            .with_context(|| format!("Invalid gap '{}'", gap))?;
        removal.add_interval(interval)?;
    }

    Ok(removal)
}

fn report(summary: &RunSummary, json: bool, list_all: bool) -> Result<ExitCode> {
    if json {
        let json = serde_json::to_string_pretty(summary)
            .context("Failed to serialize scan results to JSON")?;
        println!("{}", json);
    } else {
        display_summary(summary, list_all);
    }

    let unresolved = summary.unresolved();
    if unresolved.is_empty() {
        return Ok(ExitCode::SUCCESS);
    }

    warn!("{} file(s) could not be processed", unresolved.len());
    Ok(ExitCode::FAILURE)
}

/// Display run results in human-readable format.
///
/// Gaps are listed one by one when `list_all` is set or the removal estimate
/// is over the configured threshold.
fn display_summary(summary: &RunSummary, list_all: bool) {
    for outcome in &summary.outcomes {
        match outcome {
            FileOutcome::NoGaps { file } => {
                println!("{}: no gaps", file.display());
            }
            FileOutcome::Planned { scan } => {
                println!("{}: planned", scan.file.display());
                display_scan(scan, list_all);
            }
            FileOutcome::Removed { scan, backup } => {
                println!("{}: gaps removed", scan.file.display());
                display_scan(scan, list_all);
                if let Some(backup) = backup {
                    println!("  Original kept as {}", backup.display());
                }
            }
            FileOutcome::Unresolved { file, reason } => {
                println!("{}: UNRESOLVED ({})", file.display(), reason);
            }
        }
    }

    println!();
    println!(
        "{} with gaps, {} without, {} unresolved",
        summary.processed(),
        summary.skipped(),
        summary.unresolved().len()
    );
    for file in summary.unresolved() {
        println!("  unresolved: {}", file.display());
    }
}

fn display_scan(scan: &ScanResult, list_all: bool) {
    let parser = TimeParser::new();
    let report = &scan.report;
    println!(
        "  Removing about {} ({} freeze(s), {} silence(s), {} commercial(s))",
        parser.format_time(scan.estimated_removal),
        report.video_freezes.len(),
        report.audio_silences.len(),
        report.commercials.len()
    );

    if list_all || scan.list_gaps {
        for gap in &report.removal {
            println!(
                "    {} - {}  {}",
                parser.format_time(gap.start()),
                parser.format_time(gap.end()),
                gap.label()
            );
        }
    }

    if let Some(plan) = &scan.plan {
        display_plan(plan);
    }
}

fn display_plan(plan: &EditPlan) {
    let parser = TimeParser::new();
    println!("  Keep-segments:");
    for segment in &plan.segments {
        match segment.outpoint {
            Some(out) => println!(
                "    {} -> {}",
                parser.format_time(segment.inpoint),
                parser.format_time(out)
            ),
            None => println!("    {} -> end", parser.format_time(segment.inpoint)),
        }
    }
}

// Gap interactor - Orchestrates the find-plan-splice-replace use case

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::config_initialization::GapCutConfig;
use crate::domain::rules::GapReport;
use crate::error::GapCutResult;
use crate::planner::{EditPlan, EditPlanBuilder};
use crate::ports::{AnalyzePort, KeyframePort, SplicePort};
use crate::utils::path::{replace_file, PathUtils};

/// Knobs the interactor needs out of the full configuration
#[derive(Debug, Clone)]
pub struct InteractorSettings {
    pub splice_margin: f64,
    pub duration_pad: f64,
    pub list_gaps_over: f64,
    pub keep_backup: bool,
    pub extensions: Vec<String>,
}

impl From<&GapCutConfig> for InteractorSettings {
    fn from(config: &GapCutConfig) -> Self {
        Self {
            splice_margin: config.splice_margin,
            duration_pad: config.duration_pad,
            list_gaps_over: config.list_gaps_over,
            keep_backup: config.keep_backup,
            extensions: config.extensions.clone(),
        }
    }
}

impl Default for InteractorSettings {
    fn default() -> Self {
        Self::from(&GapCutConfig::default())
    }
}

/// Analysis of one file and the plan that would remove its gaps
#[derive(Debug, Clone, Serialize)]
pub struct ScanResult {
    pub file: PathBuf,
    pub report: GapReport,
    /// Padded estimate of the removed time, for display
    pub estimated_removal: f64,
    /// Whether the estimate is large enough to list every gap
    pub list_gaps: bool,
    pub plan: Option<EditPlan>,
}

impl ScanResult {
    pub fn has_gaps(&self) -> bool {
        self.report.has_gaps()
    }
}

/// What happened to one file
#[derive(Debug, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum FileOutcome {
    /// Nothing to remove
    NoGaps { file: PathBuf },
    /// Gaps found and planned, media untouched
    Planned { scan: ScanResult },
    /// Gaps spliced out and the original replaced
    Removed {
        scan: ScanResult,
        backup: Option<PathBuf>,
    },
    /// Processing failed; the file is left as it was
    Unresolved { file: PathBuf, reason: String },
}

impl FileOutcome {
    pub fn file(&self) -> &Path {
        match self {
            FileOutcome::NoGaps { file } | FileOutcome::Unresolved { file, .. } => file,
            FileOutcome::Planned { scan } | FileOutcome::Removed { scan, .. } => &scan.file,
        }
    }
}

/// How far to take each file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// Analyze and plan only
    Scan,
    /// Analyze, plan, splice and replace; `dry_run` stops after planning
    Remove { dry_run: bool },
}

/// Outcome of a run over many files, in processing order
#[derive(Debug, Default, Serialize)]
pub struct RunSummary {
    pub outcomes: Vec<FileOutcome>,
}

impl RunSummary {
    /// Files with gaps, planned or removed
    pub fn processed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, FileOutcome::Planned { .. } | FileOutcome::Removed { .. }))
            .count()
    }

    /// Files without gaps
    pub fn skipped(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, FileOutcome::NoGaps { .. }))
            .count()
    }

    pub fn unresolved(&self) -> Vec<&Path> {
        self.outcomes
            .iter()
            .filter(|o| matches!(o, FileOutcome::Unresolved { .. }))
            .map(FileOutcome::file)
            .collect()
    }

    pub fn is_clean(&self) -> bool {
        self.unresolved().is_empty()
    }
}

/// Interactor for the gap removal use case
pub struct GapInteractor {
    analyze_port: Arc<dyn AnalyzePort>,
    keyframe_port: Arc<dyn KeyframePort>,
    splice_port: Arc<dyn SplicePort>,
    settings: InteractorSettings,
    paths: PathUtils,
    builder: EditPlanBuilder,
}

impl GapInteractor {
    /// Create new gap interactor with injected ports
    pub fn new(
        analyze_port: Arc<dyn AnalyzePort>,
        keyframe_port: Arc<dyn KeyframePort>,
        splice_port: Arc<dyn SplicePort>,
        settings: InteractorSettings,
    ) -> Self {
        let paths = PathUtils::new(&settings.extensions);
        let builder = EditPlanBuilder::new(settings.splice_margin);
        Self {
            analyze_port,
            keyframe_port,
            splice_port,
            settings,
            paths,
            builder,
        }
    }

    pub fn paths(&self) -> &PathUtils {
        &self.paths
    }

    /// Analyze one file and plan the removal of its gaps
    pub async fn scan_file(&self, file: &Path) -> GapCutResult<ScanResult> {
        let report = self.analyze_port.analyze(file).await?;
        let estimated_removal = report
            .removal
            .total_duration_with_pad(self.settings.duration_pad);
        let list_gaps = estimated_removal > self.settings.list_gaps_over;

        if report.has_gaps() {
            info!(
                "Removing {:.1} seconds of gaps (commercials and freezes) from {}",
                estimated_removal,
                file.display()
            );
            for gap in &report.removal {
                debug!("  gap {:.1}-{:.1}: {}", gap.start(), gap.end(), gap.label());
            }
        } else {
            info!("Found no gaps to remove in {}", file.display());
        }

        let plan = self
            .builder
            .build(&report.removal, file, self.keyframe_port.as_ref())
            .await;

        Ok(ScanResult {
            file: file.to_path_buf(),
            report,
            estimated_removal,
            list_gaps,
            plan,
        })
    }

    /// Run the full pipeline on one file
    pub async fn remove_gaps(&self, file: &Path, dry_run: bool) -> GapCutResult<FileOutcome> {
        let temp_output = self.paths.temp_output_path(file)?;
        let scan = self.scan_file(file).await?;

        let plan = match &scan.plan {
            Some(plan) if scan.has_gaps() => plan,
            _ => {
                return Ok(FileOutcome::NoGaps {
                    file: file.to_path_buf(),
                })
            }
        };

        if dry_run {
            info!("Dry run: leaving {} untouched", file.display());
            return Ok(FileOutcome::Planned { scan });
        }

        if let Err(e) = self.splice_port.splice(plan, &temp_output).await {
            discard_partial_output(&temp_output);
            return Err(e);
        }

        let backup = match replace_file(file, &temp_output, self.settings.keep_backup) {
            Ok(backup) => backup,
            Err(e) => {
                discard_partial_output(&temp_output);
                return Err(e);
            }
        };
        info!("Gap removal complete for {}", file.display());

        Ok(FileOutcome::Removed { scan, backup })
    }

    /// Process one file; per-file failures become `Unresolved`
    pub async fn process(&self, file: &Path, mode: RunMode) -> GapCutResult<FileOutcome> {
        info!("Finding gaps in: {}", file.display());

        let result = match mode {
            RunMode::Scan => self.scan_file(file).await.map(|scan| {
                if scan.has_gaps() {
                    FileOutcome::Planned { scan }
                } else {
                    FileOutcome::NoGaps {
                        file: file.to_path_buf(),
                    }
                }
            }),
            RunMode::Remove { dry_run } => self.remove_gaps(file, dry_run).await,
        };

        match result {
            Ok(outcome) => Ok(outcome),
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => {
                error!("Could not process {}: {}", file.display(), e);
                Ok(FileOutcome::Unresolved {
                    file: file.to_path_buf(),
                    reason: e.to_string(),
                })
            }
        }
    }

    /// Process every file in order
    pub async fn run(&self, files: &[PathBuf], mode: RunMode) -> GapCutResult<RunSummary> {
        let mut summary = RunSummary::default();
        for file in files {
            let outcome = self.process(file, mode).await?;
            summary.outcomes.push(outcome);
        }

        info!(
            "Run complete: {} processed, {} without gaps, {} unresolved",
            summary.processed(),
            summary.skipped(),
            summary.unresolved().len()
        );
        Ok(summary)
    }
}

fn discard_partial_output(path: &Path) {
    if path.exists() {
        if let Err(e) = std::fs::remove_file(path) {
            warn!("Could not remove partial output {}: {}", path.display(), e);
        }
    }
}

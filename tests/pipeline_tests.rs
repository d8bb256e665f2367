//! End-to-end pipeline tests with in-memory ports

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tempfile::TempDir;

use gapcut_cli::app::{AppContainer, DefaultAppContainer, FileOutcome, InteractorSettings, RunMode};
use gapcut_cli::ports::{AnalyzePort, PassthroughKeyframes, SplicePort};
use gapcut_cli::utils::path::backup_path;
use gapcut_cli::*;

// Test utilities

/// Replays a fixed event stream per file name
#[derive(Default)]
struct ScriptedAnalyzer {
    scripts: HashMap<String, Vec<GapEvent>>,
}

impl ScriptedAnalyzer {
    fn with(mut self, name: &str, events: Vec<GapEvent>) -> Self {
        self.scripts.insert(name.to_string(), events);
        self
    }
}

#[async_trait]
impl AnalyzePort for ScriptedAnalyzer {
    async fn analyze(&self, file: &Path) -> GapCutResult<GapReport> {
        let name = file.file_name().unwrap().to_string_lossy().to_string();
        match self.scripts.get(&name) {
            Some(events) => Ok(GapCollector::collect(name, events.clone())?),
            None => Err(GapCutError::ToolFailed {
                program: "ffmpeg".to_string(),
                status: "exit status: 1".to_string(),
                message: format!("{}: Invalid data found when processing input", name),
            }),
        }
    }
}

/// Writes the concat list as the "spliced" output and records every plan
#[derive(Default)]
struct RecordingSplicer {
    plans: Mutex<Vec<EditPlan>>,
    fail: bool,
}

#[async_trait]
impl SplicePort for RecordingSplicer {
    async fn splice(&self, plan: &EditPlan, output: &Path) -> GapCutResult<()> {
        self.plans.lock().unwrap().push(plan.clone());
        std::fs::write(output, plan.to_concat_list())?;
        if self.fail {
            return Err(GapCutError::ToolFailed {
                program: "ffmpeg".to_string(),
                status: "exit status: 1".to_string(),
                message: "Error writing trailer".to_string(),
            });
        }
        Ok(())
    }
}

fn gap_at_100() -> Vec<GapEvent> {
    vec![
        GapEvent::FreezeStart(100.0),
        GapEvent::SilenceStart(100.0),
        GapEvent::SilenceEnd(105.0),
        GapEvent::FreezeEnd(105.0),
    ]
}

fn container(
    analyzer: ScriptedAnalyzer,
    splicer: Arc<RecordingSplicer>,
    keep_backup: bool,
) -> DefaultAppContainer {
    let settings = InteractorSettings {
        keep_backup,
        ..InteractorSettings::default()
    };
    DefaultAppContainer::with_ports(
        Arc::new(analyzer),
        Arc::new(PassthroughKeyframes),
        splicer,
        settings,
    )
}

fn write_video(dir: &TempDir, name: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, b"original media").unwrap();
    path
}

#[tokio::test]
async fn test_remove_replaces_file_with_spliced_output() {
    let dir = TempDir::new().unwrap();
    let movie = write_video(&dir, "movie.mkv");
    let splicer = Arc::new(RecordingSplicer::default());
    let app = container(
        ScriptedAnalyzer::default().with("movie.mkv", gap_at_100()),
        Arc::clone(&splicer),
        false,
    );

    let outcome = app
        .gap_interactor()
        .process(&movie, RunMode::Remove { dry_run: false })
        .await
        .unwrap();

    let (scan, backup) = match outcome {
        FileOutcome::Removed { scan, backup } => (scan, backup),
        other => panic!("expected Removed, got {:?}", other),
    };
    assert_eq!(backup, None);
    assert_eq!(scan.estimated_removal, 5.75);

    let plans = splicer.plans.lock().unwrap();
    let segments: Vec<_> = plans[0].segments.iter().map(|s| (s.inpoint, s.outpoint)).collect();
    assert_eq!(segments, vec![(0.0, Some(99.25)), (104.25, None)]);

    let replaced = std::fs::read_to_string(&movie).unwrap();
    assert!(replaced.starts_with("ffconcat version 1.0\n"));
    assert!(!dir.path().join("movie.gapcut-tmp.mkv").exists());
    assert!(!backup_path(&movie).exists());
}

#[tokio::test]
async fn test_remove_keeps_backup_when_asked() {
    let dir = TempDir::new().unwrap();
    let movie = write_video(&dir, "movie.mkv");
    let app = container(
        ScriptedAnalyzer::default().with("movie.mkv", gap_at_100()),
        Arc::new(RecordingSplicer::default()),
        true,
    );

    let outcome = app
        .gap_interactor()
        .process(&movie, RunMode::Remove { dry_run: false })
        .await
        .unwrap();

    let backup = match outcome {
        FileOutcome::Removed { backup: Some(backup), .. } => backup,
        other => panic!("expected a kept backup, got {:?}", other),
    };
    assert_eq!(std::fs::read(&backup).unwrap(), b"original media");
}

#[tokio::test]
async fn test_dry_run_leaves_media_untouched() {
    let dir = TempDir::new().unwrap();
    let movie = write_video(&dir, "movie.mkv");
    let splicer = Arc::new(RecordingSplicer::default());
    let app = container(
        ScriptedAnalyzer::default().with("movie.mkv", gap_at_100()),
        Arc::clone(&splicer),
        false,
    );

    let outcome = app
        .gap_interactor()
        .process(&movie, RunMode::Remove { dry_run: true })
        .await
        .unwrap();

    assert!(matches!(outcome, FileOutcome::Planned { .. }));
    assert!(splicer.plans.lock().unwrap().is_empty());
    assert_eq!(std::fs::read(&movie).unwrap(), b"original media");
}

#[tokio::test]
async fn test_file_without_gaps_is_not_spliced() {
    let dir = TempDir::new().unwrap();
    let movie = write_video(&dir, "movie.mkv");
    let splicer = Arc::new(RecordingSplicer::default());
    let app = container(
        ScriptedAnalyzer::default().with(
            "movie.mkv",
            vec![GapEvent::FreezeStart(10.0), GapEvent::FreezeEnd(20.0)],
        ),
        Arc::clone(&splicer),
        false,
    );

    let outcome = app
        .gap_interactor()
        .process(&movie, RunMode::Remove { dry_run: false })
        .await
        .unwrap();

    assert!(matches!(outcome, FileOutcome::NoGaps { .. }));
    assert!(splicer.plans.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_failed_splice_keeps_original_and_cleans_up() {
    let dir = TempDir::new().unwrap();
    let movie = write_video(&dir, "movie.mkv");
    let splicer = Arc::new(RecordingSplicer {
        fail: true,
        ..RecordingSplicer::default()
    });
    let app = container(
        ScriptedAnalyzer::default().with("movie.mkv", gap_at_100()),
        splicer,
        false,
    );

    let outcome = app
        .gap_interactor()
        .process(&movie, RunMode::Remove { dry_run: false })
        .await
        .unwrap();

    assert!(matches!(outcome, FileOutcome::Unresolved { .. }));
    assert_eq!(std::fs::read(&movie).unwrap(), b"original media");
    assert!(!dir.path().join("movie.gapcut-tmp.mkv").exists());
}

#[tokio::test]
async fn test_run_continues_past_unresolved_files() {
    let dir = TempDir::new().unwrap();
    let broken = write_video(&dir, "a-broken.mkv");
    let movie = write_video(&dir, "b-movie.mkv");
    let quiet = write_video(&dir, "c-quiet.mp4");
    let app = container(
        ScriptedAnalyzer::default()
            .with("b-movie.mkv", gap_at_100())
            .with("c-quiet.mp4", vec![]),
        Arc::new(RecordingSplicer::default()),
        false,
    );

    let interactor = app.gap_interactor();
    let files = interactor.paths().discover_video_files(dir.path()).unwrap();
    assert_eq!(files, vec![broken.clone(), movie, quiet]);

    let summary = interactor.run(&files, RunMode::Scan).await.unwrap();

    assert_eq!(summary.processed(), 1);
    assert_eq!(summary.skipped(), 1);
    assert_eq!(summary.unresolved(), vec![broken.as_path()]);
    assert!(!summary.is_clean());
}

#[tokio::test]
async fn test_protocol_violation_marks_file_unresolved() {
    let dir = TempDir::new().unwrap();
    let movie = write_video(&dir, "movie.mkv");
    let app = container(
        ScriptedAnalyzer::default().with(
            "movie.mkv",
            vec![GapEvent::FreezeStart(1.0), GapEvent::FreezeStart(2.0)],
        ),
        Arc::new(RecordingSplicer::default()),
        false,
    );

    let outcome = app.gap_interactor().process(&movie, RunMode::Scan).await.unwrap();

    let reason = match outcome {
        FileOutcome::Unresolved { reason, .. } => reason,
        other => panic!("expected Unresolved, got {:?}", other),
    };
    assert!(reason.contains("consecutive"));
}

#[tokio::test]
async fn test_scan_summary_serializes_with_outcome_tags() {
    let dir = TempDir::new().unwrap();
    let movie = write_video(&dir, "movie.mkv");
    let app = container(
        ScriptedAnalyzer::default().with("movie.mkv", gap_at_100()),
        Arc::new(RecordingSplicer::default()),
        false,
    );

    let summary = app.gap_interactor().run(&[movie], RunMode::Scan).await.unwrap();
    let json = serde_json::to_value(&summary).unwrap();

    assert_eq!(json["outcomes"][0]["outcome"], "planned");
    assert_eq!(json["outcomes"][0]["scan"]["plan"]["segments"][1]["inpoint"], 104.25);
}

/// Hands back sets that belong to another file
struct InconsistentAnalyzer;

#[async_trait]
impl AnalyzePort for InconsistentAnalyzer {
    async fn analyze(&self, _file: &Path) -> GapCutResult<GapReport> {
        let ours = IntervalSet::new("movie.mkv", "video");
        let theirs = IntervalSet::new("other.mkv", "audio");
        ours.intersection(&theirs)?;
        unreachable!("sets of different files must not intersect")
    }
}

#[tokio::test]
async fn test_internal_algebra_failure_stops_the_run() {
    let dir = TempDir::new().unwrap();
    let movie = write_video(&dir, "movie.mkv");
    let app = DefaultAppContainer::with_ports(
        Arc::new(InconsistentAnalyzer),
        Arc::new(PassthroughKeyframes),
        Arc::new(RecordingSplicer::default()),
        InteractorSettings::default(),
    );

    let err = app
        .gap_interactor()
        .run(&[movie], RunMode::Scan)
        .await
        .unwrap_err();

    assert!(err.is_fatal());
    assert!(matches!(err, GapCutError::Domain(DomainError::MismatchedFile { .. })));
}

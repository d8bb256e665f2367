//! FFmpeg execution adapter
//!
//! Runs the gap analysis (freezedetect + silencedetect over a null muxer) and
//! the stream-copy splice of an edit plan.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, BufReader};
use tokio::process::{Child, Command};
use tracing::{debug, error, info, warn};

use crate::adapters::ffmpeg_output::{FfmpegOutputParser, OutputLines, ParsedLine};
use crate::domain::model::COMMERCIAL_CHAPTER_TITLE;
use crate::domain::rules::{GapCollector, GapReport};
use crate::error::{GapCutError, GapCutResult};
use crate::planner::EditPlan;
use crate::ports::{AnalyzePort, SplicePort};
use crate::utils::ProgressReporter;

/// Stderr lines kept for the error message of a failed run
const TAIL_LINES: usize = 8;

/// Ordered executables to try for one external tool.
///
/// A candidate that cannot be found falls through to the next one; any other
/// launch failure stops the search.
#[derive(Debug, Clone)]
pub struct ToolCandidates {
    programs: Vec<PathBuf>,
}

impl ToolCandidates {
    pub fn new<I, P>(programs: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            programs: programs.into_iter().map(Into::into).collect(),
        }
    }

    pub fn programs(&self) -> &[PathBuf] {
        &self.programs
    }

    /// Display name used in errors
    pub fn display_name(&self) -> String {
        self.programs
            .first()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "<none>".to_string())
    }

    /// Spawn the first candidate that launches.
    ///
    /// `configure` sets up stdio on each attempt. The child is killed if its
    /// handle is dropped before it exits.
    pub fn spawn<F>(&self, args: &[String], configure: F) -> GapCutResult<(Child, PathBuf)>
    where
        F: Fn(&mut Command),
    {
        let mut last_error = String::from("no candidate executables configured");

        for program in &self.programs {
            let mut cmd = Command::new(program);
            cmd.args(args).kill_on_drop(true);
            configure(&mut cmd);

            match cmd.spawn() {
                Ok(child) => {
                    debug!("Launched {} {}", program.display(), args.join(" "));
                    return Ok((child, program.clone()));
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    debug!("{} not found, trying next candidate", program.display());
                    last_error = format!("{}: {}", program.display(), e);
                }
                Err(e) => {
                    return Err(GapCutError::ToolLaunch {
                        program: program.display().to_string(),
                        message: e.to_string(),
                    });
                }
            }
        }

        Err(GapCutError::ToolLaunch {
            program: self.display_name(),
            message: last_error,
        })
    }
}

/// State of one analysis run while its stderr is drained
pub struct AnalysisSession {
    parser: FfmpegOutputParser,
    collector: GapCollector,
    progress: ProgressReporter,
    tail: VecDeque<String>,
}

impl AnalysisSession {
    pub fn new(collector: GapCollector, progress: ProgressReporter) -> Self {
        Self {
            parser: FfmpegOutputParser::new(),
            collector,
            progress,
            tail: VecDeque::with_capacity(TAIL_LINES),
        }
    }

    /// Read the stream to its end, feeding every event to the collector.
    ///
    /// Stops at the first protocol violation.
    pub async fn drain<R>(&mut self, reader: R) -> GapCutResult<()>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut lines = OutputLines::new(reader);
        while let Some(line) = lines.next_line().await? {
            match self.parser.parse_line(&line)? {
                ParsedLine::Event(event) => self.collector.observe(event)?,
                ParsedLine::Duration(total) => {
                    debug!("Input duration {:.2}s", total);
                    self.progress.set_total(total);
                }
                ParsedLine::Progress(position) => self.progress.update(position),
            }
            remember(&mut self.tail, line);
        }
        Ok(())
    }

    /// Last few stderr lines, oldest first
    pub fn tail(&self) -> String {
        self.tail.iter().cloned().collect::<Vec<_>>().join("\n")
    }

    /// Close the run and compute the gap report
    pub fn finish(mut self) -> GapCutResult<GapReport> {
        self.progress.finish();
        Ok(self.collector.finish()?)
    }
}

fn remember(tail: &mut VecDeque<String>, line: String) {
    if tail.len() == TAIL_LINES {
        tail.pop_front();
    }
    tail.push_back(line);
}

/// Gap analysis through `ffmpeg -vf freezedetect -af silencedetect -f null -`
#[derive(Debug, Clone)]
pub struct FfmpegAnalyzer {
    ffmpeg: ToolCandidates,
    freeze_noise: f64,
    commercial_title: String,
    show_progress: bool,
}

impl FfmpegAnalyzer {
    pub fn new(ffmpeg: ToolCandidates, freeze_noise: f64) -> Self {
        Self {
            ffmpeg,
            freeze_noise,
            commercial_title: COMMERCIAL_CHAPTER_TITLE.to_string(),
            show_progress: false,
        }
    }

    pub fn with_commercial_title(mut self, title: impl Into<String>) -> Self {
        self.commercial_title = title.into();
        self
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Arguments for one analysis pass over `file`
    pub fn analysis_args(&self, file: &Path) -> Vec<String> {
        vec![
            "-nostdin".to_string(),
            "-hide_banner".to_string(),
            "-i".to_string(),
            file.display().to_string(),
            "-vf".to_string(),
            format!("freezedetect=n={}", self.freeze_noise),
            "-map".to_string(),
            "0:v:0".to_string(),
            "-af".to_string(),
            "silencedetect".to_string(),
            "-map".to_string(),
            "0:a:0?".to_string(),
            "-f".to_string(),
            "null".to_string(),
            "-".to_string(),
        ]
    }
}

#[async_trait]
impl AnalyzePort for FfmpegAnalyzer {
    async fn analyze(&self, file: &Path) -> GapCutResult<GapReport> {
        info!("Searching for gaps in {}", file.display());

        let args = self.analysis_args(file);
        let (mut child, program) = self.ffmpeg.spawn(&args, |cmd| {
            cmd.stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::piped());
        })?;

        let stderr = child.stderr.take().ok_or_else(|| GapCutError::ToolLaunch {
            program: program.display().to_string(),
            message: "stderr was not captured".to_string(),
        })?;

        let collector = GapCollector::new(file.display().to_string())
            .with_commercial_title(self.commercial_title.clone());
        let mut session =
            AnalysisSession::new(collector, ProgressReporter::new("Searching", self.show_progress));

        if let Err(e) = session.drain(BufReader::new(stderr)).await {
            error!("Analysis of {} aborted: {}", file.display(), e);
            if let Err(kill_err) = child.kill().await {
                warn!("Failed to stop {}: {}", program.display(), kill_err);
            }
            return Err(e);
        }

        let status = child.wait().await?;
        if !status.success() {
            return Err(GapCutError::ToolFailed {
                program: program.display().to_string(),
                status: status.to_string(),
                message: session.tail(),
            });
        }

        session.finish()
    }
}

/// Stream-copy splice through ffmpeg's concat demuxer
#[derive(Debug, Clone)]
pub struct FfmpegSplicer {
    ffmpeg: ToolCandidates,
    show_progress: bool,
}

impl FfmpegSplicer {
    pub fn new(ffmpeg: ToolCandidates) -> Self {
        Self {
            ffmpeg,
            show_progress: false,
        }
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    /// Arguments joining the segments listed in `list` into `output`
    pub fn splice_args(&self, list: &Path, output: &Path) -> Vec<String> {
        vec![
            "-nostdin".to_string(),
            "-hide_banner".to_string(),
            "-y".to_string(),
            "-safe".to_string(),
            "0".to_string(),
            "-f".to_string(),
            "concat".to_string(),
            "-i".to_string(),
            list.display().to_string(),
            "-map".to_string(),
            "0".to_string(),
            "-c".to_string(),
            "copy".to_string(),
            output.display().to_string(),
        ]
    }
}

#[async_trait]
impl SplicePort for FfmpegSplicer {
    async fn splice(&self, plan: &EditPlan, output: &Path) -> GapCutResult<()> {
        let list = tempfile::Builder::new()
            .prefix("gapcut-")
            .suffix(".ffconcat")
            .tempfile()?;
        plan.write_concat_list(list.path()).await?;

        info!(
            "Splicing {} segment(s) of {} into {}",
            plan.segments.len(),
            plan.file.display(),
            output.display()
        );

        let args = self.splice_args(list.path(), output);
        let (mut child, program) = self.ffmpeg.spawn(&args, |cmd| {
            cmd.stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::piped());
        })?;

        let stderr = child.stderr.take().ok_or_else(|| GapCutError::ToolLaunch {
            program: program.display().to_string(),
            message: "stderr was not captured".to_string(),
        })?;

        let mut progress = ProgressReporter::new("Removing", self.show_progress);
        let mut tail = VecDeque::with_capacity(TAIL_LINES);
        let mut lines = OutputLines::new(BufReader::new(stderr));
        let mut parser = FfmpegOutputParser::new();

        while let Some(line) = lines.next_line().await? {
            // Only progress matters here; the concat input has no detectors
            if let Ok(ParsedLine::Progress(position)) = parser.parse_line(&line) {
                progress.update(position);
            }
            remember(&mut tail, line);
        }

        let status = child.wait().await?;
        if !status.success() {
            return Err(GapCutError::ToolFailed {
                program: program.display().to_string(),
                status: status.to_string(),
                message: tail.into_iter().collect::<Vec<_>>().join("\n"),
            });
        }

        progress.finish();
        info!("Splice of {} complete", plan.file.display());
        Ok(())
    }
}

//! FFprobe adapter for keyframe lookup
//!
//! Lists key frames of the first video stream inside a short read interval
//! starting at the requested time and picks the first one at or after it.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::adapters::exec_ffmpeg::ToolCandidates;
use crate::error::{GapCutError, GapCutResult};
use crate::ports::KeyframePort;

/// FFprobe-based keyframe locator
#[derive(Debug, Clone)]
pub struct FfprobeKeyframeLocator {
    ffprobe: ToolCandidates,
    scan_window: f64,
    timeout: Duration,
}

impl FfprobeKeyframeLocator {
    /// `scan_window` bounds the probe to `[at, at + scan_window]` seconds
    pub fn new(ffprobe: ToolCandidates, scan_window: f64, timeout: Duration) -> Self {
        Self {
            ffprobe,
            scan_window,
            timeout,
        }
    }

    pub fn probe_args(&self, file: &Path, at: f64) -> Vec<String> {
        vec![
            "-v".to_string(),
            "error".to_string(),
            "-select_streams".to_string(),
            "v:0".to_string(),
            "-skip_frame".to_string(),
            "nokey".to_string(),
            "-show_entries".to_string(),
            "frame=pts_time".to_string(),
            "-of".to_string(),
            "csv=p=0".to_string(),
            "-read_intervals".to_string(),
            format!("{:.3}%+{:.3}", at, self.scan_window),
            file.display().to_string(),
        ]
    }

    async fn probe(&self, file: &Path, at: f64) -> GapCutResult<Option<f64>> {
        let args = self.probe_args(file, at);
        let (child, program) = self.ffprobe.spawn(&args, |cmd| {
            cmd.stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped());
        })?;

        let output = child.wait_with_output().await?;
        if !output.status.success() {
            return Err(GapCutError::ToolFailed {
                program: program.display().to_string(),
                status: output.status.to_string(),
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(first_keyframe_at_or_after(&stdout, at))
    }
}

#[async_trait]
impl KeyframePort for FfprobeKeyframeLocator {
    async fn next_keyframe_at_or_after(&self, file: &Path, at: f64) -> f64 {
        match tokio::time::timeout(self.timeout, self.probe(file, at)).await {
            Ok(Ok(Some(keyframe))) => {
                debug!("Keyframe for {:.3} is {:.3}", at, keyframe);
                keyframe
            }
            Ok(Ok(None)) => {
                debug!(
                    "No keyframe within {:.1}s after {:.3} in {}",
                    self.scan_window,
                    at,
                    file.display()
                );
                at
            }
            Ok(Err(e)) => {
                warn!("Keyframe probe failed for {}: {}", file.display(), e);
                at
            }
            Err(_) => {
                warn!(
                    "Keyframe probe timed out after {:?} for {} at {:.3}",
                    self.timeout,
                    file.display(),
                    at
                );
                at
            }
        }
    }
}

/// Earliest `pts_time` in ffprobe's csv output that is `>= at`.
///
/// `-read_intervals` seeks to the keyframe before the start, so earlier
/// entries are expected and skipped.
pub fn first_keyframe_at_or_after(output: &str, at: f64) -> Option<f64> {
    output
        .lines()
        .filter_map(|line| line.trim().trim_end_matches(',').parse::<f64>().ok())
        .filter(|t| t.is_finite() && *t >= at)
        .min_by(|a, b| a.total_cmp(b))
}

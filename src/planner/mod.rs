//! Edit plan construction
//!
//! Turns a normalized removal set into the ordered keep-segments that survive
//! the cut, with in-points snapped to keyframes.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info};

use crate::domain::model::{IntervalSet, SPLICE_MARGIN};
use crate::error::GapCutResult;
use crate::ports::KeyframePort;

/// A contiguous span of the source kept in the output
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeepSegment {
    /// Source file the span is read from
    pub file: PathBuf,
    /// Where to start reading, in seconds
    pub inpoint: f64,
    /// Where to stop reading; `None` runs to the end of the file
    pub outpoint: Option<f64>,
}

impl KeepSegment {
    /// Length of the segment, when bounded
    pub fn duration(&self) -> Option<f64> {
        self.outpoint.map(|out| out - self.inpoint)
    }
}

/// Ordered keep-segments for one file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EditPlan {
    pub file: PathBuf,
    pub segments: Vec<KeepSegment>,
}

impl EditPlan {
    /// Render the plan as an ffconcat list, one entry per segment in order.
    ///
    /// Times are written to the millisecond. In-points round up so a snapped
    /// keyframe is never preceded; out-points round down so a segment never
    /// reaches further into the next gap.
    pub fn to_concat_list(&self) -> String {
        let mut list = String::from("ffconcat version 1.0\n");
        for segment in &self.segments {
            list.push_str(&format!("file '{}'\n", escape_concat_path(&segment.file)));
            list.push_str(&format!("inpoint {:.3}\n", millis_up(segment.inpoint)));
            if let Some(outpoint) = segment.outpoint {
                list.push_str(&format!("outpoint {:.3}\n", millis_down(outpoint)));
            }
        }
        list
    }

    /// Write the concat list next to wherever the splicer expects it
    pub async fn write_concat_list(&self, path: &Path) -> GapCutResult<()> {
        tokio::fs::write(path, self.to_concat_list()).await?;
        debug!("Concat list written to {}", path.display());
        Ok(())
    }
}

/// Slack for binary float noise, e.g. `59.25 * 1000.0` landing a hair above 59250
const MILLIS_SLACK: f64 = 1e-6;

fn millis_up(seconds: f64) -> f64 {
    (seconds * 1000.0 - MILLIS_SLACK).ceil() / 1000.0
}

fn millis_down(seconds: f64) -> f64 {
    (seconds * 1000.0 + MILLIS_SLACK).floor() / 1000.0
}

/// Quote a path for an ffconcat `file` directive
fn escape_concat_path(path: &Path) -> String {
    path.to_string_lossy().replace('\'', r"'\''")
}

/// Builds edit plans from removal sets
#[derive(Debug, Clone, Copy)]
pub struct EditPlanBuilder {
    margin: f64,
}

impl Default for EditPlanBuilder {
    fn default() -> Self {
        Self::new(SPLICE_MARGIN)
    }
}

impl EditPlanBuilder {
    /// Create a builder with the given splice margin in seconds
    pub fn new(margin: f64) -> Self {
        Self { margin }
    }

    pub fn margin(&self) -> f64 {
        self.margin
    }

    /// Compute the keep-segments around every interval of `removal`.
    ///
    /// Returns `None` for an empty removal set. The first segment starts at
    /// exactly `0.0` and is omitted when the first gap starts at or before
    /// zero. Every later in-point is the first keyframe at or after
    /// `gap.end - margin`; every out-point is `next_gap.start - margin`. The
    /// last segment has no out-point. Segments that end up empty are dropped.
    pub async fn build(
        &self,
        removal: &IntervalSet,
        file: &Path,
        keyframes: &dyn KeyframePort,
    ) -> Option<EditPlan> {
        let gaps = removal.intervals();
        let first = gaps.first()?;
        let last = gaps.last()?;

        let mut segments = Vec::with_capacity(gaps.len() + 1);

        if first.start() > 0.0 {
            self.push_segment(&mut segments, file, 0.0, Some(first.start() - self.margin));
        }

        for pair in gaps.windows(2) {
            let inpoint = self.snap_inpoint(keyframes, file, pair[0].end()).await;
            let outpoint = pair[1].start() - self.margin;
            self.push_segment(&mut segments, file, inpoint, Some(outpoint));
        }

        let inpoint = self.snap_inpoint(keyframes, file, last.end()).await;
        self.push_segment(&mut segments, file, inpoint, None);

        info!(
            "Edit plan for {}: {} gap(s), {} keep-segment(s)",
            file.display(),
            gaps.len(),
            segments.len()
        );

        Some(EditPlan {
            file: file.to_path_buf(),
            segments,
        })
    }

    async fn snap_inpoint(&self, keyframes: &dyn KeyframePort, file: &Path, gap_end: f64) -> f64 {
        let origin = (gap_end - self.margin).max(0.0);
        let snapped = keyframes.next_keyframe_at_or_after(file, origin).await;
        if snapped < origin {
            debug!("Keyframe {:.3} reported before {:.3}; using {:.3}", snapped, origin, origin);
            return origin;
        }
        snapped
    }

    fn push_segment(
        &self,
        segments: &mut Vec<KeepSegment>,
        file: &Path,
        inpoint: f64,
        outpoint: Option<f64>,
    ) {
        if let Some(out) = outpoint {
            if out <= inpoint {
                debug!("Dropping empty keep-segment {:.3}-{:.3}", inpoint, out);
                return;
            }
        }
        segments.push(KeepSegment {
            file: file.to_path_buf(),
            inpoint,
            outpoint,
        });
    }
}

impl IntervalSet {
    /// Build the edit plan for this removal set with the default margin
    pub async fn build_edit_plan(
        &self,
        file: &Path,
        keyframes: &dyn KeyframePort,
    ) -> Option<EditPlan> {
        EditPlanBuilder::default().build(self, file, keyframes).await
    }
}

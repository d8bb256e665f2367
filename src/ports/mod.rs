// Ports - Interface definitions (contracts)

use std::path::Path;

use async_trait::async_trait;

use crate::domain::rules::GapReport;
use crate::error::GapCutResult;
use crate::planner::EditPlan;

/// Port for locating keyframes in a media file
#[async_trait]
pub trait KeyframePort: Send + Sync {
    /// Earliest keyframe time `>= at`.
    ///
    /// Implementations must not fail: when nothing is found inside their scan
    /// window, or the probe times out, they return `at` unchanged.
    async fn next_keyframe_at_or_after(&self, file: &Path, at: f64) -> f64;
}

/// Port for running gap analysis over a media file
#[async_trait]
pub trait AnalyzePort: Send + Sync {
    /// Drain the analysis of `file` and classify what it reports
    async fn analyze(&self, file: &Path) -> GapCutResult<GapReport>;
}

/// Port for splicing keep-segments into a new media file
#[async_trait]
pub trait SplicePort: Send + Sync {
    /// Stream-copy every segment of `plan`, in order, into `output`
    async fn splice(&self, plan: &EditPlan, output: &Path) -> GapCutResult<()>;
}

/// Keyframe locator that never snaps; every timestamp is its own keyframe
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughKeyframes;

#[async_trait]
impl KeyframePort for PassthroughKeyframes {
    async fn next_keyframe_at_or_after(&self, _file: &Path, at: f64) -> f64 {
        at
    }
}

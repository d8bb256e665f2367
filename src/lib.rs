//! gapcut library
//!
//! Finds stretches of a recording where the picture is frozen and the sound is
//! silent, together with chapters marked as advertisements, and splices them
//! out with a lossless ffmpeg stream copy whose cuts land on keyframes.

pub mod adapters;
pub mod app;
pub mod cli;
pub mod config_initialization;
pub mod domain;
pub mod error;
pub mod planner;
pub mod ports;
pub mod utils;

// Re-export commonly used types
pub use config_initialization::{initialize_configuration_hierarchy, GapCutConfig};
pub use domain::errors::DomainError;
pub use domain::model::{GapEvent, Interval, IntervalSet, Track};
pub use domain::rules::{GapCollector, GapReport};
pub use error::{GapCutError, GapCutResult};
pub use planner::{EditPlan, EditPlanBuilder, KeepSegment};

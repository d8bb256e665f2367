// Domain models - Core types and data structures

use std::fmt;

use serde::Serialize;

use crate::domain::errors::DomainError;

mod interval_set;

pub use interval_set::IntervalSet;

/// Padding added to every stored interval when estimating removed time.
/// Reporting only; never used to build a plan.
pub const DURATION_PAD: f64 = 0.75;

/// Splice safety margin. Out-points are pulled back this far from the start
/// of the following gap, and the keyframe search for an in-point starts this
/// far before the end of the preceding gap.
pub const SPLICE_MARGIN: f64 = 0.75;

/// Chapter title that marks an advertisement break
pub const COMMERCIAL_CHAPTER_TITLE: &str = "Advertisement";

/// Separator used when merged intervals concatenate their labels
pub const LABEL_SEPARATOR: &str = " - ";

/// Closed time range `[start, end]` in seconds with a provenance label
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Interval {
    start: f64,
    end: f64,
    label: String,
}

impl Interval {
    /// Create a new interval; `start` must not be after `end`
    pub fn new(start: f64, end: f64, label: impl Into<String>) -> Result<Self, DomainError> {
        // Written as a negation so NaN bounds are rejected too
        if !(start <= end) {
            return Err(DomainError::InvalidInterval { start, end });
        }

        Ok(Self {
            start,
            end,
            label: label.into(),
        })
    }

    pub fn start(&self) -> f64 {
        self.start
    }

    pub fn end(&self) -> f64 {
        self.end
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Length of the range in seconds
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Inclusive overlap test: touching endpoints count as overlapping
    pub fn overlaps(&self, other: &Interval) -> bool {
        self.start.max(other.start) <= self.end.min(other.end)
    }

    /// Merge two overlapping intervals into one spanning both.
    ///
    /// The label of the result is `a.label - b.label` so the merge stays
    /// auditable.
    pub fn combine(a: &Interval, b: &Interval) -> Result<Interval, DomainError> {
        if !a.overlaps(b) {
            return Err(DomainError::IncompatibleIntervals {
                a_start: a.start,
                a_end: a.end,
                b_start: b.start,
                b_end: b.end,
            });
        }

        Ok(Interval {
            start: a.start.min(b.start),
            end: a.end.max(b.end),
            label: format!("{}{}{}", a.label, LABEL_SEPARATOR, b.label),
        })
    }

    /// The common part of two intervals, labelled with both source ranges
    pub fn intersect(&self, other: &Interval) -> Option<Interval> {
        if !self.overlaps(other) {
            return None;
        }

        Some(Interval {
            start: self.start.max(other.start),
            end: self.end.min(other.end),
            label: format!(
                "{}-{} & {}-{}",
                self.start, self.end, other.start, other.end
            ),
        })
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}-{:.3} ({})", self.start, self.end, self.label)
    }
}

/// Detection track an event belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Track {
    /// Frozen video (freezedetect)
    Freeze,
    /// Silent audio (silencedetect)
    Silence,
    /// Container chapter markers
    Chapter,
}

impl fmt::Display for Track {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Track::Freeze => write!(f, "freeze"),
            Track::Silence => write!(f, "silence"),
            Track::Chapter => write!(f, "chapter"),
        }
    }
}

/// A classified event from the analysis stream
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum GapEvent {
    FreezeStart(f64),
    FreezeEnd(f64),
    SilenceStart(f64),
    SilenceEnd(f64),
    /// One chapter: `[start, end)` and its title
    ChapterBlock { start: f64, end: f64, title: String },
    /// A single line that reported both a start and an end
    Conflicting { track: Track, line: String },
    /// Anything the collector does not care about
    Other,
}

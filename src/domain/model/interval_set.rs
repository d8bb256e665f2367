//! Normalized interval collection anchored to one source file

use serde::Serialize;
use tracing::trace;

use crate::domain::errors::DomainError;
use crate::domain::model::{Interval, DURATION_PAD};

/// Sorted, non-overlapping intervals belonging to one media file.
///
/// Every mutation leaves the sequence ordered by start with no two entries
/// overlapping (inclusive rule). Set operators never touch their operands;
/// they build a fresh set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntervalSet {
    file_ref: String,
    set_name: String,
    intervals: Vec<Interval>,
}

impl IntervalSet {
    /// Create an empty set for `file_ref`
    pub fn new(file_ref: impl Into<String>, set_name: impl Into<String>) -> Self {
        Self {
            file_ref: file_ref.into(),
            set_name: set_name.into(),
            intervals: Vec::new(),
        }
    }

    pub fn file_ref(&self) -> &str {
        &self.file_ref
    }

    pub fn set_name(&self) -> &str {
        &self.set_name
    }

    pub fn intervals(&self) -> &[Interval] {
        &self.intervals
    }

    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Interval> {
        self.intervals.iter()
    }

    /// Insert an interval, merging it with everything it overlaps.
    ///
    /// Every stored interval overlapping `iv` is first replaced in place by
    /// its combination with `iv`. When that happened, the sequence is sorted
    /// and swept once so the merged copies (which now all contain `iv`'s span)
    /// fuse with their neighbours. Otherwise `iv` is appended and the sequence
    /// re-sorted.
    pub fn add_interval(&mut self, iv: Interval) -> Result<(), DomainError> {
        if !(iv.start() <= iv.end()) {
            return Err(DomainError::InvalidInterval {
                start: iv.start(),
                end: iv.end(),
            });
        }

        if self.intervals.is_empty() {
            self.intervals.push(iv);
            return Ok(());
        }

        let mut replaced = false;
        for stored in self.intervals.iter_mut() {
            if iv.overlaps(stored) {
                *stored = Interval::combine(&iv, stored)?;
                replaced = true;
            }
        }

        if replaced {
            self.consolidate()?;
        } else {
            self.intervals.push(iv);
            self.sort_by_start();
        }

        trace!(set = %self.set_name, count = self.intervals.len(), "interval added");
        Ok(())
    }

    /// Sort by start, then merge adjacent overlapping entries in one sweep
    fn consolidate(&mut self) -> Result<(), DomainError> {
        self.sort_by_start();

        let mut merged: Vec<Interval> = Vec::with_capacity(self.intervals.len());
        for iv in self.intervals.drain(..) {
            match merged.last_mut() {
                Some(last) if last.overlaps(&iv) => {
                    *last = Interval::combine(last, &iv)?;
                }
                _ => merged.push(iv),
            }
        }

        self.intervals = merged;
        Ok(())
    }

    fn sort_by_start(&mut self) {
        self.intervals
            .sort_by(|a, b| a.start().total_cmp(&b.start()));
    }

    fn ensure_same_file(&self, other: &IntervalSet) -> Result<(), DomainError> {
        if self.file_ref != other.file_ref {
            return Err(DomainError::MismatchedFile {
                left: self.file_ref.clone(),
                right: other.file_ref.clone(),
            });
        }
        Ok(())
    }

    /// Everything covered by either set
    pub fn union(&self, other: &IntervalSet) -> Result<IntervalSet, DomainError> {
        self.ensure_same_file(other)?;

        let mut result = IntervalSet::new(
            self.file_ref.clone(),
            format!("{} | {}", self.set_name, other.set_name),
        );
        for iv in self.intervals.iter().chain(other.intervals.iter()) {
            result.add_interval(iv.clone())?;
        }

        Ok(result)
    }

    /// Everything covered by both sets.
    ///
    /// Each overlapping pair contributes exactly one interval; the result set
    /// normalizes whatever those pieces share.
    pub fn intersection(&self, other: &IntervalSet) -> Result<IntervalSet, DomainError> {
        self.ensure_same_file(other)?;

        let mut result = IntervalSet::new(
            self.file_ref.clone(),
            format!("{} & {}", self.set_name, other.set_name),
        );
        for theirs in &other.intervals {
            for ours in &self.intervals {
                if let Some(common) = ours.intersect(theirs) {
                    result.add_interval(common)?;
                }
            }
        }

        Ok(result)
    }

    /// Estimated removed time with the default reporting pad
    pub fn total_duration(&self) -> f64 {
        self.total_duration_with_pad(DURATION_PAD)
    }

    /// Sum of `end - start + pad` over stored intervals.
    /// Overestimates on purpose; for display only.
    pub fn total_duration_with_pad(&self, pad: f64) -> f64 {
        self.intervals
            .iter()
            .map(|iv| iv.duration() + pad)
            .sum()
    }
}

impl<'a> IntoIterator for &'a IntervalSet {
    type Item = &'a Interval;
    type IntoIter = std::slice::Iter<'a, Interval>;

    fn into_iter(self) -> Self::IntoIter {
        self.intervals.iter()
    }
}

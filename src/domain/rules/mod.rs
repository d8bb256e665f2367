// Domain rules - Gap classification policy

use serde::Serialize;
use tracing::{debug, info};

use crate::domain::errors::DomainError;
use crate::domain::model::*;

/// Gaps found in one file, split by where they came from
#[derive(Debug, Clone, Serialize)]
pub struct GapReport {
    /// Frozen-video ranges
    pub video_freezes: IntervalSet,
    /// Silent-audio ranges
    pub audio_silences: IntervalSet,
    /// Chapters tagged as advertisements
    pub commercials: IntervalSet,
    /// `(video_freezes ∩ audio_silences) ∪ commercials`
    pub removal: IntervalSet,
}

impl GapReport {
    pub fn has_gaps(&self) -> bool {
        !self.removal.is_empty()
    }
}

/// Folds the classified event stream of one file into interval sets.
///
/// Holds at most one pending freeze start and one pending silence start.
/// A region qualifies for removal only when the video is frozen and the
/// audio silent at the same time; advertisement chapters always qualify.
#[derive(Debug)]
pub struct GapCollector {
    commercial_title: String,
    video_freezes: IntervalSet,
    audio_silences: IntervalSet,
    commercials: IntervalSet,
    pending_freeze: Option<f64>,
    pending_silence: Option<f64>,
}

impl GapCollector {
    /// Create a collector for one source file
    pub fn new(file_ref: impl Into<String>) -> Self {
        let file_ref = file_ref.into();
        Self {
            commercial_title: COMMERCIAL_CHAPTER_TITLE.to_string(),
            video_freezes: IntervalSet::new(file_ref.clone(), "video"),
            audio_silences: IntervalSet::new(file_ref.clone(), "audio"),
            commercials: IntervalSet::new(file_ref, "commercials"),
            pending_freeze: None,
            pending_silence: None,
        }
    }

    /// Use a different chapter title as the advertisement marker
    pub fn with_commercial_title(mut self, title: impl Into<String>) -> Self {
        self.commercial_title = title.into();
        self
    }

    /// Feed one event, in stream order
    pub fn observe(&mut self, event: GapEvent) -> Result<(), DomainError> {
        match event {
            GapEvent::FreezeStart(at) => Self::open(&mut self.pending_freeze, Track::Freeze, at),
            GapEvent::FreezeEnd(at) => {
                let start = Self::close(&mut self.pending_freeze, Track::Freeze, at)?;
                debug!("Freeze found from {} to {}", start, at);
                self.video_freezes
                    .add_interval(Interval::new(start, at, format!("{}-{}", start, at))?)
            }
            GapEvent::SilenceStart(at) => {
                Self::open(&mut self.pending_silence, Track::Silence, at)
            }
            GapEvent::SilenceEnd(at) => {
                let start = Self::close(&mut self.pending_silence, Track::Silence, at)?;
                debug!("Silence found from {:.1} to {:.1} secs", start, at);
                self.audio_silences
                    .add_interval(Interval::new(start, at, format!("{}-{}", start, at))?)
            }
            GapEvent::ChapterBlock { start, end, title } => {
                info!("Movie chapter found: {} ({:.1}-{:.1})", title, start, end);
                if title == self.commercial_title {
                    let label = format!("{}: {}-{}", title, start, end);
                    self.commercials
                        .add_interval(Interval::new(start, end, label)?)?;
                }
                Ok(())
            }
            GapEvent::Conflicting { track, line } => Err(DomainError::MalformedEvent {
                track,
                detail: format!("start and end reported on one line: {}", line.trim()),
            }),
            GapEvent::Other => Ok(()),
        }
    }

    fn open(pending: &mut Option<f64>, track: Track, at: f64) -> Result<(), DomainError> {
        if let Some(previous) = *pending {
            return Err(DomainError::UnmatchedStart {
                track,
                pending: previous,
                received: at,
            });
        }
        *pending = Some(at);
        Ok(())
    }

    fn close(pending: &mut Option<f64>, track: Track, at: f64) -> Result<f64, DomainError> {
        pending
            .take()
            .ok_or(DomainError::UnmatchedEnd { track, received: at })
    }

    /// True when no start is waiting for its end
    pub fn is_idle(&self) -> bool {
        self.pending_freeze.is_none() && self.pending_silence.is_none()
    }

    /// Close the stream and compute the removal set.
    ///
    /// Fails when a start is still pending: the stream was cut short and the
    /// sets cannot be trusted.
    pub fn finish(self) -> Result<GapReport, DomainError> {
        if let Some(pending) = self.pending_freeze {
            return Err(DomainError::UnterminatedEvent {
                track: Track::Freeze,
                pending,
            });
        }
        if let Some(pending) = self.pending_silence {
            return Err(DomainError::UnterminatedEvent {
                track: Track::Silence,
                pending,
            });
        }

        let still_gaps = self.video_freezes.intersection(&self.audio_silences)?;
        let removal = still_gaps.union(&self.commercials)?;

        debug!(
            freezes = self.video_freezes.len(),
            silences = self.audio_silences.len(),
            commercials = self.commercials.len(),
            removal = removal.len(),
            "Gap collection complete"
        );

        Ok(GapReport {
            video_freezes: self.video_freezes,
            audio_silences: self.audio_silences,
            commercials: self.commercials,
            removal,
        })
    }

    /// Run a whole event sequence through a fresh collector
    pub fn collect<I>(file_ref: impl Into<String>, events: I) -> Result<GapReport, DomainError>
    where
        I: IntoIterator<Item = GapEvent>,
    {
        let mut collector = GapCollector::new(file_ref);
        for event in events {
            collector.observe(event)?;
        }
        collector.finish()
    }
}

#[cfg(test)]
mod tests;

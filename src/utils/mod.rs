//! Common utilities and helpers

use std::io::Write;

use chrono::{DateTime, Local};

pub mod logging;
pub mod path;
pub mod time;

use time::TimeParser;

/// Format `current / total` as a right-aligned percentage, e.g. `" 42.5%"`
pub fn pretty_progress(current: f64, total: f64) -> String {
    if total <= 0.0 {
        return format!("{:5.1}%", 0.0);
    }
    let permille = (current / total * 1000.0).round();
    format!("{:5.1}%", permille / 10.0)
}

/// Console progress line for a long-running ffmpeg job.
///
/// Writes to stderr and rewrites the same line with `\r`, so it stays out of
/// any machine-readable stdout.
#[derive(Debug)]
pub struct ProgressReporter {
    label: String,
    enabled: bool,
    started: DateTime<Local>,
    total: Option<f64>,
    current: f64,
}

impl ProgressReporter {
    pub fn new(label: impl Into<String>, enabled: bool) -> Self {
        Self {
            label: label.into(),
            enabled,
            started: Local::now(),
            total: None,
            current: 0.0,
        }
    }

    /// Set the expected end position, once known
    pub fn set_total(&mut self, total: f64) {
        if total > 0.0 {
            self.total = Some(total);
        }
    }

    pub fn current(&self) -> f64 {
        self.current
    }

    /// Record a new position and redraw
    pub fn update(&mut self, position: f64) {
        self.current = position;
        if !self.enabled {
            return;
        }

        let text = match self.total {
            Some(total) => format!(
                "{}{}",
                pretty_progress(position, total),
                self.eta(total)
                    .map(|eta| format!(" (ETA {})", eta))
                    .unwrap_or_default()
            ),
            None => format!("{:>10.1}s", position),
        };
        let mut stderr = std::io::stderr();
        let _ = write!(stderr, "    {}: {}\r", self.label, text);
        let _ = stderr.flush();
    }

    /// Estimated wall-clock time left, extrapolated from the pace so far
    fn eta(&self, total: f64) -> Option<String> {
        if self.current <= 0.0 || self.current >= total {
            return None;
        }
        let elapsed = (Local::now() - self.started).num_milliseconds() as f64 / 1000.0;
        let remaining = elapsed * (total - self.current) / self.current;
        Some(TimeParser::new().format_time(remaining))
    }

    /// Print the final line
    pub fn finish(&mut self) {
        if !self.enabled {
            return;
        }
        let text = match self.total {
            Some(total) => pretty_progress(total, total),
            None => format!("{:.1}s", self.current),
        };
        eprintln!("    {} complete: {}          ", self.label, text);
    }
}

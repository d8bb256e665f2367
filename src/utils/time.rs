//! Time parsing and formatting utilities

use crate::error::{GapCutError, GapCutResult};

/// Time parser for the formats accepted on the command line and printed by ffmpeg
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeParser;

impl TimeParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse seconds, `MM:SS[.ms]` or `HH:MM:SS[.ms]` into seconds
    pub fn parse_time(&self, time_str: &str) -> GapCutResult<f64> {
        let time_str = time_str.trim();
        let invalid = || GapCutError::InvalidTimeFormat {
            time: time_str.to_string(),
        };

        let parts: Vec<&str> = time_str.split(':').collect();
        let seconds = match parts.as_slice() {
            [secs] => secs.parse::<f64>().map_err(|_| invalid())?,
            [mins, secs] => {
                let minutes = parse_whole(mins).ok_or_else(invalid)?;
                let seconds = parse_seconds(secs).ok_or_else(invalid)?;
                minutes * 60.0 + seconds
            }
            [hours, mins, secs] => {
                let hours = parse_whole(hours).ok_or_else(invalid)?;
                let minutes = parse_whole(mins).ok_or_else(invalid)?;
                let seconds = parse_seconds(secs).ok_or_else(invalid)?;
                hours * 3600.0 + minutes * 60.0 + seconds
            }
            _ => return Err(invalid()),
        };

        if !seconds.is_finite() || seconds < 0.0 {
            return Err(invalid());
        }
        Ok(seconds)
    }

    /// Parse a `start-end` range, each side in any format `parse_time` accepts
    pub fn parse_range(&self, range: &str) -> GapCutResult<(f64, f64)> {
        let (start, end) = range
            .split_once('-')
            .ok_or_else(|| GapCutError::InvalidTimeFormat {
                time: range.to_string(),
            })?;
        Ok((self.parse_time(start)?, self.parse_time(end)?))
    }

    /// Format seconds as `HH:MM:SS.mmm`, or `MM:SS.mmm` under an hour
    pub fn format_time(&self, seconds: f64) -> String {
        let total_millis = (seconds.max(0.0) * 1000.0).round() as u64;
        let hours = total_millis / 3_600_000;
        let minutes = (total_millis % 3_600_000) / 60_000;
        let secs = (total_millis % 60_000) / 1000;
        let millis = total_millis % 1000;

        if hours > 0 {
            format!("{:02}:{:02}:{:02}.{:03}", hours, minutes, secs, millis)
        } else {
            format!("{:02}:{:02}.{:03}", minutes, secs, millis)
        }
    }
}

/// Parse ffmpeg's fixed `HH:MM:SS.xx` clock (as in `Duration:` and ` time=`)
pub fn parse_clock(text: &str) -> Option<f64> {
    let text = text.trim();
    let mut parts = text.splitn(3, ':');
    let hours = parse_whole(parts.next()?)?;
    let minutes = parse_whole(parts.next()?)?;
    let seconds = parse_seconds(parts.next()?)?;
    Some(hours * 3600.0 + minutes * 60.0 + seconds)
}

fn parse_whole(text: &str) -> Option<f64> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse::<u64>().ok().map(|v| v as f64)
}

fn parse_seconds(text: &str) -> Option<f64> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit() || b == b'.') {
        return None;
    }
    text.parse::<f64>().ok()
}

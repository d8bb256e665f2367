//! Classifier for ffmpeg's stderr stream
//!
//! ffmpeg reports freezedetect/silencedetect results, the container's chapter
//! table, the input duration and periodic progress on stderr. This module turns
//! those lines into domain events. Progress lines end in `\r`, not `\n`, so the
//! line reader splits on either.

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, trace};

use crate::domain::errors::DomainError;
use crate::domain::model::{GapEvent, Track};
use crate::utils::time::parse_clock;

const FREEZE_START: &str = "lavfi.freezedetect.freeze_start";
const FREEZE_END: &str = "lavfi.freezedetect.freeze_end";
const SILENCE_TAG: &str = "[silencedetect";
const SILENCE_START: &str = "silence_start:";
const SILENCE_END: &str = "silence_end:";
const CHAPTERS_HEADER: &str = "Chapters:";
const CHAPTER_PREFIX: &str = "Chapter #";
const DURATION_PREFIX: &str = "Duration:";
const PROGRESS_MARKER: &str = " time=";

/// What a single stderr line turned out to be
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedLine {
    Event(GapEvent),
    /// Input duration from the header, in seconds
    Duration(f64),
    /// Position reached by the running job, in seconds
    Progress(f64),
}

#[derive(Debug, Clone, PartialEq)]
enum ChapterState {
    /// Not inside the chapter table
    Outside,
    /// After `Chapters:` or a finished block; expecting `Chapter #..`
    Table,
    /// Header seen, expecting `Metadata:`
    Metadata { start: f64, end: f64 },
    /// Expecting `title : ...`
    Title { start: f64, end: f64 },
    /// The first chapter table has been read; later ones (output side) are ignored
    Done,
}

/// Line-by-line classifier; keeps the chapter-table state between lines
#[derive(Debug)]
pub struct FfmpegOutputParser {
    chapters: ChapterState,
    duration_seen: bool,
}

impl Default for FfmpegOutputParser {
    fn default() -> Self {
        Self::new()
    }
}

impl FfmpegOutputParser {
    pub fn new() -> Self {
        Self {
            chapters: ChapterState::Outside,
            duration_seen: false,
        }
    }

    /// Classify one line of ffmpeg output
    pub fn parse_line(&mut self, line: &str) -> Result<ParsedLine, DomainError> {
        if let Some(event) = self.parse_chapter_line(line)? {
            return Ok(ParsedLine::Event(event));
        }

        if line.contains(FREEZE_START) || line.contains(FREEZE_END) {
            return parse_freeze_line(line).map(ParsedLine::Event);
        }

        if line.contains(SILENCE_TAG) {
            return parse_silence_line(line).map(ParsedLine::Event);
        }

        if !self.duration_seen {
            if let Some(duration) = parse_duration_line(line) {
                self.duration_seen = true;
                return Ok(ParsedLine::Duration(duration));
            }
        }

        if let Some(position) = parse_progress_line(line) {
            return Ok(ParsedLine::Progress(position));
        }

        trace!("ffmpeg: {}", line);
        Ok(ParsedLine::Event(GapEvent::Other))
    }

    /// Advance the chapter-table state. Returns a chapter event when a block completes.
    fn parse_chapter_line(&mut self, line: &str) -> Result<Option<GapEvent>, DomainError> {
        let trimmed = line.trim();

        loop {
            match self.chapters.clone() {
                ChapterState::Outside => {
                    if trimmed == CHAPTERS_HEADER {
                        self.chapters = ChapterState::Table;
                    }
                    return Ok(None);
                }
                ChapterState::Done => return Ok(None),
                ChapterState::Table => {
                    if trimmed.starts_with(CHAPTER_PREFIX) {
                        let (start, end) = parse_chapter_header(trimmed)?;
                        self.chapters = ChapterState::Metadata { start, end };
                        return Ok(None);
                    }
                    self.chapters = ChapterState::Done;
                    return Ok(None);
                }
                ChapterState::Metadata { start, end } => {
                    if trimmed == "Metadata:" {
                        self.chapters = ChapterState::Title { start, end };
                        return Ok(None);
                    }
                    debug!("Chapter {:.1}-{:.1} has no metadata; ignored", start, end);
                    self.chapters = ChapterState::Table;
                }
                ChapterState::Title { start, end } => {
                    if let Some((key, value)) = trimmed.split_once(':') {
                        let key = key.trim();
                        if key == "title" {
                            self.chapters = ChapterState::Table;
                            return Ok(Some(GapEvent::ChapterBlock {
                                start,
                                end,
                                title: value.trim().to_string(),
                            }));
                        }
                        if trimmed.contains(" : ") {
                            // Other metadata key of the same chapter
                            return Ok(None);
                        }
                    }
                    debug!("Chapter {:.1}-{:.1} has no title; ignored", start, end);
                    self.chapters = ChapterState::Table;
                }
            }
        }
    }
}

/// `Chapter #0:1: start 300.000000, end 420.000000`
fn parse_chapter_header(line: &str) -> Result<(f64, f64), DomainError> {
    let malformed = || DomainError::MalformedEvent {
        track: Track::Chapter,
        detail: format!("cannot find start/end times in: {}", line),
    };

    let start_idx = line.find(" start ").ok_or_else(malformed)?;
    let end_idx = line.find(" end ").ok_or_else(malformed)?;

    let start = line[start_idx + " start ".len()..]
        .split(',')
        .next()
        .and_then(|s| s.trim().parse::<f64>().ok())
        .ok_or_else(malformed)?;
    let end = line[end_idx + " end ".len()..]
        .trim()
        .parse::<f64>()
        .map_err(|_| malformed())?;

    Ok((start, end))
}

/// `[freezedetect @ 0x..] lavfi.freezedetect.freeze_start: 12.345`
fn parse_freeze_line(line: &str) -> Result<GapEvent, DomainError> {
    let has_start = line.contains(FREEZE_START);
    let has_end = line.contains(FREEZE_END);
    if has_start && has_end {
        return Ok(GapEvent::Conflicting {
            track: Track::Freeze,
            line: line.to_string(),
        });
    }

    let marker = if has_start { FREEZE_START } else { FREEZE_END };
    let at = value_after(line, marker).ok_or_else(|| DomainError::MalformedEvent {
        track: Track::Freeze,
        detail: format!("no timestamp in: {}", line.trim()),
    })?;

    Ok(if has_start {
        GapEvent::FreezeStart(at)
    } else {
        GapEvent::FreezeEnd(at)
    })
}

/// `[silencedetect @ 0x..] silence_end: 15.6 | silence_duration: 3.25`
fn parse_silence_line(line: &str) -> Result<GapEvent, DomainError> {
    let has_start = line.contains(SILENCE_START);
    let has_end = line.contains(SILENCE_END);
    match (has_start, has_end) {
        (true, true) => Ok(GapEvent::Conflicting {
            track: Track::Silence,
            line: line.to_string(),
        }),
        (false, false) => Ok(GapEvent::Other),
        (true, false) | (false, true) => {
            let marker = if has_start { SILENCE_START } else { SILENCE_END };
            let at = value_after(line, marker).ok_or_else(|| DomainError::MalformedEvent {
                track: Track::Silence,
                detail: format!("no timestamp in: {}", line.trim()),
            })?;
            Ok(if has_start {
                GapEvent::SilenceStart(at)
            } else {
                GapEvent::SilenceEnd(at)
            })
        }
    }
}

/// The number following `marker` and an optional colon
fn value_after(line: &str, marker: &str) -> Option<f64> {
    let idx = line.find(marker)?;
    let rest = line[idx + marker.len()..].trim_start_matches(':').trim_start();
    let token = rest
        .split(|c: char| c.is_whitespace() || c == '|')
        .next()?;
    token.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// `  Duration: 01:14:30.54, start: 0.000000, bitrate: 2000 kb/s`
fn parse_duration_line(line: &str) -> Option<f64> {
    let rest = line.trim_start().strip_prefix(DURATION_PREFIX)?;
    let clock = rest.split(',').next()?;
    parse_clock(clock)
}

/// `frame= 1200 fps=240 q=-0.0 size=N/A time=00:00:50.00 bitrate=N/A speed=9.6x`
fn parse_progress_line(line: &str) -> Option<f64> {
    let idx = line.find(PROGRESS_MARKER)?;
    let rest = &line[idx + PROGRESS_MARKER.len()..];
    let clock = rest.split_whitespace().next()?;
    parse_clock(clock)
}

/// Line reader over a child's stderr that treats `\r` as a line end as well
pub struct OutputLines<R> {
    reader: R,
    buf: Vec<u8>,
}

impl<R> OutputLines<R>
where
    R: AsyncBufRead + Unpin,
{
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: Vec::with_capacity(256),
        }
    }

    /// Next non-empty line, or `None` once the stream is drained
    pub async fn next_line(&mut self) -> std::io::Result<Option<String>> {
        self.buf.clear();
        loop {
            let available = self.reader.fill_buf().await?;
            if available.is_empty() {
                if self.buf.is_empty() {
                    return Ok(None);
                }
                break;
            }

            match available.iter().position(|&b| b == b'\n' || b == b'\r') {
                Some(pos) => {
                    self.buf.extend_from_slice(&available[..pos]);
                    self.reader.consume(pos + 1);
                    if !self.buf.is_empty() {
                        break;
                    }
                }
                None => {
                    let len = available.len();
                    self.buf.extend_from_slice(available);
                    self.reader.consume(len);
                }
            }
        }

        Ok(Some(String::from_utf8_lossy(&self.buf).into_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_all(text: &str) -> Vec<ParsedLine> {
        let mut parser = FfmpegOutputParser::new();
        text.lines()
            .map(|line| parser.parse_line(line).unwrap())
            .filter(|parsed| *parsed != ParsedLine::Event(GapEvent::Other))
            .collect()
    }

    const HEADER: &str = "\
Input #0, matroska,webm, from 'movie.mkv':
  Metadata:
    ENCODER         : Lavf59.27.100
  Duration: 01:14:30.54, start: 0.000000, bitrate: 4117 kb/s
  Chapters:
    Chapter #0:0: start 0.000000, end 300.000000
      Metadata:
        title           : Chapter 1
    Chapter #0:1: start 300.000000, end 420.500000
      Metadata:
        title           : Advertisement
  Stream #0:0: Video: h264 (High), yuv420p(tv, bt709, progressive), 1920x1080
    Metadata:
      title           : Main
Output #0, null, to 'pipe:':
  Chapters:
    Chapter #0:0: start 0.000000, end 300.000000
      Metadata:
        title           : Advertisement
";

    #[test]
    fn test_header_yields_duration_and_input_chapters_only() {
        assert_eq!(
            parse_all(HEADER),
            vec![
                ParsedLine::Duration(4470.54),
                ParsedLine::Event(GapEvent::ChapterBlock {
                    start: 0.0,
                    end: 300.0,
                    title: "Chapter 1".to_string(),
                }),
                ParsedLine::Event(GapEvent::ChapterBlock {
                    start: 300.0,
                    end: 420.5,
                    title: "Advertisement".to_string(),
                }),
            ]
        );
    }

    #[test]
    fn test_freeze_lines() {
        let text = "\
[Parsed_freezedetect_0 @ 0x5581] lavfi.freezedetect.freeze_start: 100.1
[Parsed_freezedetect_0 @ 0x5581] lavfi.freezedetect.freeze_duration: 4.9
[Parsed_freezedetect_0 @ 0x5581] lavfi.freezedetect.freeze_end: 105";

        let mut parser = FfmpegOutputParser::new();
        let parsed: Vec<_> = text
            .lines()
            .map(|line| parser.parse_line(line).unwrap())
            .collect();

        assert_eq!(
            parsed,
            vec![
                ParsedLine::Event(GapEvent::FreezeStart(100.1)),
                ParsedLine::Event(GapEvent::Other),
                ParsedLine::Event(GapEvent::FreezeEnd(105.0)),
            ]
        );
    }

    #[test]
    fn test_silence_lines() {
        let text = "\
[silencedetect @ 0x55d1] silence_start: 99.75
[silencedetect @ 0x55d1] silence_end: 105.5 | silence_duration: 5.75";

        assert_eq!(
            parse_all(text),
            vec![
                ParsedLine::Event(GapEvent::SilenceStart(99.75)),
                ParsedLine::Event(GapEvent::SilenceEnd(105.5)),
            ]
        );
    }

    #[test]
    fn test_negative_silence_start_is_kept() {
        let mut parser = FfmpegOutputParser::new();
        let parsed = parser
            .parse_line("[silencedetect @ 0x1] silence_start: -0.00133333")
            .unwrap();
        assert_eq!(parsed, ParsedLine::Event(GapEvent::SilenceStart(-0.00133333)));
    }

    #[test]
    fn test_line_with_start_and_end_is_conflicting() {
        let mut parser = FfmpegOutputParser::new();
        let line = "lavfi.freezedetect.freeze_start: 1 lavfi.freezedetect.freeze_end: 2";
        assert_eq!(
            parser.parse_line(line).unwrap(),
            ParsedLine::Event(GapEvent::Conflicting {
                track: Track::Freeze,
                line: line.to_string(),
            })
        );
    }

    #[test]
    fn test_unreadable_timestamp_is_malformed() {
        let mut parser = FfmpegOutputParser::new();
        let err = parser
            .parse_line("[silencedetect @ 0x1] silence_end: nan-ish | silence_duration: 1")
            .unwrap_err();
        assert!(matches!(
            err,
            DomainError::MalformedEvent { track: Track::Silence, .. }
        ));
    }

    #[test]
    fn test_progress_lines() {
        let mut parser = FfmpegOutputParser::new();
        assert_eq!(
            parser
                .parse_line(
                    "frame= 1200 fps=240 q=-0.0 size=N/A time=00:00:50.00 bitrate=N/A speed=9.6x"
                )
                .unwrap(),
            ParsedLine::Progress(50.0)
        );
        assert_eq!(
            parser.parse_line("size=N/A time=N/A bitrate=N/A").unwrap(),
            ParsedLine::Event(GapEvent::Other)
        );
    }

    #[test]
    fn test_chapter_without_title_is_skipped() {
        let text = "\
  Chapters:
    Chapter #0:0: start 0.000000, end 10.000000
    Chapter #0:1: start 10.000000, end 20.000000
      Metadata:
        title           : Advertisement";

        assert_eq!(
            parse_all(text),
            vec![ParsedLine::Event(GapEvent::ChapterBlock {
                start: 10.0,
                end: 20.0,
                title: "Advertisement".to_string(),
            })]
        );
    }

    #[test]
    fn test_bad_chapter_header_is_malformed() {
        let mut parser = FfmpegOutputParser::new();
        parser.parse_line("  Chapters:").unwrap();
        let err = parser.parse_line("    Chapter #0:0: begins at zero").unwrap_err();
        assert!(matches!(
            err,
            DomainError::MalformedEvent { track: Track::Chapter, .. }
        ));
    }

    #[tokio::test]
    async fn test_output_lines_split_on_cr_and_lf() {
        let raw: &[u8] = b"first\nframe=1 time=00:00:01.00\rframe=2 time=00:00:02.00\r\nlast";
        let mut lines = OutputLines::new(raw);

        let mut seen = Vec::new();
        while let Some(line) = lines.next_line().await.unwrap() {
            seen.push(line);
        }

        assert_eq!(
            seen,
            vec![
                "first",
                "frame=1 time=00:00:01.00",
                "frame=2 time=00:00:02.00",
                "last",
            ]
        );
    }
}

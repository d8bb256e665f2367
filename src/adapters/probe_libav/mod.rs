// Probe LibAV adapter - In-process keyframe lookup through libavformat

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use ffmpeg_next as ffmpeg;
use tracing::{debug, warn};

use crate::ports::KeyframePort;

/// libavformat timestamps for `seek` are in microseconds
const AV_TIME_BASE: f64 = 1_000_000.0;

/// LibAV-based keyframe locator
///
/// Seeks to the keyframe before the target and walks video packets forward
/// until a key packet at or after the target turns up, or the scan window is
/// exhausted. Runs on the blocking pool.
#[derive(Debug, Clone)]
pub struct LibavKeyframeLocator {
    scan_window: f64,
    timeout: Duration,
}

impl LibavKeyframeLocator {
    pub fn new(scan_window: f64, timeout: Duration) -> Result<Self, ffmpeg::Error> {
        ffmpeg::init()?;
        Ok(Self {
            scan_window,
            timeout,
        })
    }
}

fn scan_for_keyframe(file: &Path, at: f64, window: f64) -> Result<Option<f64>, ffmpeg::Error> {
    let mut ictx = ffmpeg::format::input(&file)?;

    let (video_index, time_base) = {
        let stream = ictx
            .streams()
            .best(ffmpeg::media::Type::Video)
            .ok_or(ffmpeg::Error::StreamNotFound)?;
        (stream.index(), f64::from(stream.time_base()))
    };

    let target = (at * AV_TIME_BASE) as i64;
    ictx.seek(target, ..target)?;

    for (stream, packet) in ictx.packets() {
        if stream.index() != video_index || !packet.is_key() {
            continue;
        }
        let Some(pts) = packet.pts().or_else(|| packet.dts()) else {
            continue;
        };

        let time = pts as f64 * time_base;
        if time > at + window {
            break;
        }
        if time >= at {
            return Ok(Some(time));
        }
    }

    Ok(None)
}

#[async_trait]
impl KeyframePort for LibavKeyframeLocator {
    async fn next_keyframe_at_or_after(&self, file: &Path, at: f64) -> f64 {
        let path: PathBuf = file.to_path_buf();
        let window = self.scan_window;
        let scan = tokio::task::spawn_blocking(move || scan_for_keyframe(&path, at, window));

        match tokio::time::timeout(self.timeout, scan).await {
            Ok(Ok(Ok(Some(keyframe)))) => {
                debug!("Keyframe for {:.3} is {:.3}", at, keyframe);
                keyframe
            }
            Ok(Ok(Ok(None))) => {
                debug!("No keyframe within {:.1}s after {:.3}", window, at);
                at
            }
            Ok(Ok(Err(e))) => {
                warn!("libav keyframe scan failed for {}: {}", file.display(), e);
                at
            }
            Ok(Err(e)) => {
                warn!("libav keyframe scan panicked for {}: {}", file.display(), e);
                at
            }
            Err(_) => {
                warn!(
                    "libav keyframe scan timed out after {:?} for {}",
                    self.timeout,
                    file.display()
                );
                at
            }
        }
    }
}

//! Configuration initialization and hierarchy management
//!
//! Precedence, lowest first: built-in defaults, the TOML file, `GAPCUT_*`
//! environment variables, command-line flags.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::adapters::toml_config::TomlConfigAdapter;
use crate::cli::args::ConfigArgs;
use crate::domain::model::{COMMERCIAL_CHAPTER_TITLE, DURATION_PAD, SPLICE_MARGIN};
use crate::error::{GapCutError, GapCutResult};

/// Which keyframe locator backs in-point snapping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyframeBackend {
    /// Spawn ffprobe per lookup
    Ffprobe,
    /// Scan packets in-process (needs the `libav` feature)
    Libav,
}

/// Complete runtime configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GapCutConfig {
    /// ffmpeg executables, tried in order
    pub ffmpeg_programs: Vec<PathBuf>,
    /// ffprobe executables, tried in order
    pub ffprobe_programs: Vec<PathBuf>,
    /// freezedetect noise tolerance
    pub freeze_noise: f64,
    /// Chapter title that marks an advertisement
    pub commercial_title: String,
    /// Per-gap padding in the removed-time estimate
    pub duration_pad: f64,
    /// Out-point pullback and in-point search lead, in seconds
    pub splice_margin: f64,
    /// How far past the target a keyframe lookup may read, in seconds
    pub keyframe_window: f64,
    /// Upper bound on a single keyframe lookup
    pub keyframe_timeout_secs: u64,
    pub keyframe_backend: KeyframeBackend,
    /// Estimated removal above which every gap is listed
    pub list_gaps_over: f64,
    /// Accepted video file extensions, lowercase, without the dot
    pub extensions: Vec<String>,
    /// Keep `<name>.backup` after a successful replacement
    pub keep_backup: bool,
    /// Draw the console progress line
    pub show_progress: bool,
}

impl Default for GapCutConfig {
    fn default() -> Self {
        Self {
            ffmpeg_programs: vec![PathBuf::from("ffmpeg")],
            ffprobe_programs: vec![PathBuf::from("ffprobe")],
            freeze_noise: 0.001,
            commercial_title: COMMERCIAL_CHAPTER_TITLE.to_string(),
            duration_pad: DURATION_PAD,
            splice_margin: SPLICE_MARGIN,
            keyframe_window: 10.0,
            keyframe_timeout_secs: 30,
            keyframe_backend: KeyframeBackend::Ffprobe,
            list_gaps_over: 15.0,
            extensions: vec!["mp4".to_string(), "mkv".to_string()],
            keep_backup: false,
            show_progress: true,
        }
    }
}

impl GapCutConfig {
    pub fn keyframe_timeout(&self) -> Duration {
        Duration::from_secs(self.keyframe_timeout_secs)
    }

    /// Overlay `GAPCUT_*` variables read through `lookup`.
    ///
    /// List-valued variables are comma separated.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> GapCutResult<usize>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut applied = 0;

        if let Some(v) = lookup("GAPCUT_FFMPEG") {
            self.ffmpeg_programs = split_list(&v).into_iter().map(PathBuf::from).collect();
            applied += 1;
        }
        if let Some(v) = lookup("GAPCUT_FFPROBE") {
            self.ffprobe_programs = split_list(&v).into_iter().map(PathBuf::from).collect();
            applied += 1;
        }
        if let Some(v) = lookup("GAPCUT_FREEZE_NOISE") {
            self.freeze_noise = parse_env("GAPCUT_FREEZE_NOISE", &v)?;
            applied += 1;
        }
        if let Some(v) = lookup("GAPCUT_COMMERCIAL_TITLE") {
            self.commercial_title = v;
            applied += 1;
        }
        if let Some(v) = lookup("GAPCUT_DURATION_PAD") {
            self.duration_pad = parse_env("GAPCUT_DURATION_PAD", &v)?;
            applied += 1;
        }
        if let Some(v) = lookup("GAPCUT_SPLICE_MARGIN") {
            self.splice_margin = parse_env("GAPCUT_SPLICE_MARGIN", &v)?;
            applied += 1;
        }
        if let Some(v) = lookup("GAPCUT_KEYFRAME_WINDOW") {
            self.keyframe_window = parse_env("GAPCUT_KEYFRAME_WINDOW", &v)?;
            applied += 1;
        }
        if let Some(v) = lookup("GAPCUT_KEYFRAME_TIMEOUT") {
            self.keyframe_timeout_secs = parse_env("GAPCUT_KEYFRAME_TIMEOUT", &v)?;
            applied += 1;
        }
        if let Some(v) = lookup("GAPCUT_KEYFRAME_BACKEND") {
            self.keyframe_backend = match v.trim().to_ascii_lowercase().as_str() {
                "ffprobe" => KeyframeBackend::Ffprobe,
                "libav" => KeyframeBackend::Libav,
                other => {
                    return Err(GapCutError::ConfigError {
                        message: format!("GAPCUT_KEYFRAME_BACKEND: unknown backend '{}'", other),
                    })
                }
            };
            applied += 1;
        }
        if let Some(v) = lookup("GAPCUT_LIST_GAPS_OVER") {
            self.list_gaps_over = parse_env("GAPCUT_LIST_GAPS_OVER", &v)?;
            applied += 1;
        }
        if let Some(v) = lookup("GAPCUT_EXTENSIONS") {
            self.extensions = split_list(&v)
                .into_iter()
                .map(|ext| ext.trim_start_matches('.').to_ascii_lowercase())
                .collect();
            applied += 1;
        }
        if let Some(v) = lookup("GAPCUT_KEEP_BACKUP") {
            self.keep_backup = parse_bool("GAPCUT_KEEP_BACKUP", &v)?;
            applied += 1;
        }

        Ok(applied)
    }

    /// Overlay command-line flags
    pub fn apply_cli_overrides(&mut self, args: &ConfigArgs) -> usize {
        let mut applied = 0;

        if !args.ffmpeg.is_empty() {
            self.ffmpeg_programs = args.ffmpeg.clone();
            applied += 1;
        }
        if !args.ffprobe.is_empty() {
            self.ffprobe_programs = args.ffprobe.clone();
            applied += 1;
        }
        if let Some(margin) = args.margin {
            self.splice_margin = margin;
            applied += 1;
        }
        if let Some(noise) = args.freeze_noise {
            self.freeze_noise = noise;
            applied += 1;
        }
        if args.no_progress {
            self.show_progress = false;
            applied += 1;
        }

        applied
    }

    /// Reject settings no run could succeed with
    pub fn validate(&self) -> GapCutResult<()> {
        let fail = |message: String| Err(GapCutError::ConfigError { message });

        if self.ffmpeg_programs.is_empty() {
            return fail("at least one ffmpeg program is required".to_string());
        }
        if self.ffprobe_programs.is_empty() {
            return fail("at least one ffprobe program is required".to_string());
        }
        if !(self.freeze_noise > 0.0 && self.freeze_noise <= 1.0) {
            return fail(format!("freeze_noise must be in (0, 1], got {}", self.freeze_noise));
        }
        for (name, value) in [
            ("duration_pad", self.duration_pad),
            ("splice_margin", self.splice_margin),
            ("list_gaps_over", self.list_gaps_over),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return fail(format!("{} must be a non-negative number, got {}", name, value));
            }
        }
        if !(self.keyframe_window.is_finite() && self.keyframe_window > 0.0) {
            return fail(format!("keyframe_window must be positive, got {}", self.keyframe_window));
        }
        if self.keyframe_timeout_secs == 0 {
            return fail("keyframe_timeout_secs must be at least 1".to_string());
        }
        if self.extensions.is_empty() {
            return fail("at least one video extension is required".to_string());
        }
        if self.keyframe_backend == KeyframeBackend::Libav && !cfg!(feature = "libav") {
            return fail(
                "keyframe_backend = \"libav\" needs a build with the libav feature".to_string(),
            );
        }
        Ok(())
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_env<T: std::str::FromStr>(name: &str, value: &str) -> GapCutResult<T> {
    value.trim().parse().map_err(|_| GapCutError::ConfigError {
        message: format!("{}: cannot parse '{}'", name, value),
    })
}

fn parse_bool(name: &str, value: &str) -> GapCutResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(GapCutError::ConfigError {
            message: format!("{}: expected a boolean, got '{}'", name, value),
        }),
    }
}

/// Build the effective configuration: defaults < file < environment < CLI
pub fn initialize_configuration_hierarchy(
    args: &ConfigArgs,
    cwd: &Path,
) -> GapCutResult<GapCutConfig> {
    info!("Initializing configuration hierarchy");

    let mut config = match TomlConfigAdapter::locate(args.config.as_deref(), cwd)? {
        Some(path) => TomlConfigAdapter::load(&path)?,
        None => GapCutConfig::default(),
    };

    let env_overrides = config.apply_env_overrides(|name| std::env::var(name).ok())?;
    if env_overrides > 0 {
        info!("Applied {} environment variable overrides", env_overrides);
    }

    let cli_overrides = config.apply_cli_overrides(args);
    if cli_overrides > 0 {
        info!("Applied {} CLI configuration overrides", cli_overrides);
    }

    config.validate()?;
    Ok(config)
}

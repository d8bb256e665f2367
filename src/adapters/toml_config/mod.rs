// TOML config adapter - Configuration management using TOML files

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, info};

use crate::config_initialization::GapCutConfig;
use crate::error::{GapCutError, GapCutResult};

/// File name looked up in the working directory when no `--config` is given
pub const DEFAULT_CONFIG_FILE: &str = "gapcut.toml";

/// Settings live under a `[gapcut]` table so the file can be shared with other tools
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    gapcut: Option<GapCutConfig>,
}

/// TOML configuration adapter
pub struct TomlConfigAdapter;

impl TomlConfigAdapter {
    /// Which file to read: the explicit one, or `gapcut.toml` in `cwd` if present
    pub fn locate(explicit: Option<&Path>, cwd: &Path) -> GapCutResult<Option<PathBuf>> {
        if let Some(path) = explicit {
            if !path.is_file() {
                return Err(GapCutError::ConfigError {
                    message: format!("config file not found: {}", path.display()),
                });
            }
            return Ok(Some(path.to_path_buf()));
        }

        let default = cwd.join(DEFAULT_CONFIG_FILE);
        if default.is_file() {
            return Ok(Some(default));
        }
        debug!("No {} in {}", DEFAULT_CONFIG_FILE, cwd.display());
        Ok(None)
    }

    /// Read a config file; absent keys keep their defaults
    pub fn load(path: &Path) -> GapCutResult<GapCutConfig> {
        info!("Loading configuration from: {}", path.display());
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content).map_err(|e| match e {
            GapCutError::ConfigError { message } => GapCutError::ConfigError {
                message: format!("{}: {}", path.display(), message),
            },
            other => other,
        })
    }

    /// Parse TOML text with a `[gapcut]` table
    pub fn parse(content: &str) -> GapCutResult<GapCutConfig> {
        let file: ConfigFile = toml::from_str(content).map_err(|e| GapCutError::ConfigError {
            message: format!("failed to parse TOML config: {}", e),
        })?;
        Ok(file.gapcut.unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_overrides_only_given_keys() {
        let config = TomlConfigAdapter::parse(
            r#"
[gapcut]
ffmpeg_programs = ["/opt/ffmpeg/bin/ffmpeg", "ffmpeg"]
splice_margin = 0.5
extensions = ["mkv"]
"#,
        )
        .unwrap();

        let defaults = GapCutConfig::default();
        assert_eq!(
            config.ffmpeg_programs,
            vec![PathBuf::from("/opt/ffmpeg/bin/ffmpeg"), PathBuf::from("ffmpeg")]
        );
        assert_eq!(config.splice_margin, 0.5);
        assert_eq!(config.extensions, vec!["mkv".to_string()]);
        assert_eq!(config.duration_pad, defaults.duration_pad);
        assert_eq!(config.commercial_title, defaults.commercial_title);
    }

    #[test]
    fn test_missing_table_means_defaults() {
        let config = TomlConfigAdapter::parse("[other]\nkey = 1\n").unwrap();
        assert_eq!(config, GapCutConfig::default());
    }

    #[test]
    fn test_bad_toml_is_config_error() {
        let err = TomlConfigAdapter::parse("[gapcut\nsplice_margin = ").unwrap_err();
        assert!(matches!(err, GapCutError::ConfigError { .. }));
    }

    #[test]
    fn test_wrong_type_is_config_error() {
        let err = TomlConfigAdapter::parse("[gapcut]\nsplice_margin = \"wide\"\n").unwrap_err();
        assert!(matches!(err, GapCutError::ConfigError { .. }));
    }

    #[test]
    fn test_locate_prefers_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let explicit = dir.path().join("custom.toml");
        std::fs::write(&explicit, "[gapcut]\n").unwrap();
        std::fs::write(dir.path().join(DEFAULT_CONFIG_FILE), "[gapcut]\n").unwrap();

        let found = TomlConfigAdapter::locate(Some(&explicit), dir.path()).unwrap();
        assert_eq!(found, Some(explicit));
    }

    #[test]
    fn test_locate_falls_back_to_working_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(TomlConfigAdapter::locate(None, dir.path()).unwrap(), None);

        std::fs::write(dir.path().join(DEFAULT_CONFIG_FILE), "[gapcut]\n").unwrap();
        assert_eq!(
            TomlConfigAdapter::locate(None, dir.path()).unwrap(),
            Some(dir.path().join(DEFAULT_CONFIG_FILE))
        );
    }

    #[test]
    fn test_locate_rejects_missing_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(TomlConfigAdapter::locate(Some(&missing), dir.path()).is_err());
    }

    #[test]
    fn test_load_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[gapcut]\nkeep_backup = true").unwrap();

        let config = TomlConfigAdapter::load(file.path()).unwrap();
        assert!(config.keep_backup);
    }
}

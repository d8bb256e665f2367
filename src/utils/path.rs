//! Path utilities: video discovery, temp/backup naming and file replacement

use std::path::{Path, PathBuf};

use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

use crate::error::{GapCutError, GapCutResult};

/// Marker inserted between stem and extension of in-progress outputs
pub const TEMP_MARKER: &str = "gapcut-tmp";

/// Suffix appended to the original while it is being replaced
pub const BACKUP_SUFFIX: &str = "backup";

/// Path helpers bound to the accepted video extensions
#[derive(Debug, Clone)]
pub struct PathUtils {
    extensions: Vec<String>,
}

impl PathUtils {
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            extensions: extensions
                .into_iter()
                .map(|ext| ext.as_ref().trim_start_matches('.').to_ascii_lowercase())
                .collect(),
        }
    }

    /// Get file extension from path, lowercased
    pub fn get_extension(path: &Path) -> Option<String> {
        path.extension()
            .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
    }

    fn expected(&self) -> String {
        self.extensions
            .iter()
            .map(|ext| format!(".{}", ext))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// True for files with an accepted extension that are not our own temp outputs
    pub fn is_video_file(&self, path: &Path) -> bool {
        let accepted = Self::get_extension(path)
            .map(|ext| self.extensions.contains(&ext))
            .unwrap_or(false);
        accepted && !is_temp_output(path)
    }

    /// Video files under `root`: the file itself, or a sorted recursive walk
    pub fn discover_video_files(&self, root: &Path) -> GapCutResult<Vec<PathBuf>> {
        if root.is_file() {
            if !self.is_video_file(root) {
                return Err(GapCutError::UnsupportedFile {
                    path: root.display().to_string(),
                    expected: self.expected(),
                });
            }
            return Ok(vec![root.to_path_buf()]);
        }

        if !root.is_dir() {
            return Err(GapCutError::InputNotFound {
                path: root.display().to_string(),
            });
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(root).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable entry under {}: {}", root.display(), e);
                    continue;
                }
            };
            if entry.file_type().is_file() && self.is_video_file(entry.path()) {
                files.push(entry.into_path());
            }
        }

        info!("Found {} video file(s) under {}", files.len(), root.display());
        Ok(files)
    }

    /// `<dir>/<stem>.gapcut-tmp.<ext>` next to `file`
    pub fn temp_output_path(&self, file: &Path) -> GapCutResult<PathBuf> {
        let unsupported = || GapCutError::UnsupportedFile {
            path: file.display().to_string(),
            expected: self.expected(),
        };

        let ext = Self::get_extension(file)
            .filter(|ext| self.extensions.contains(ext))
            .ok_or_else(unsupported)?;
        let stem = file.file_stem().ok_or_else(unsupported)?;

        let mut name = stem.to_os_string();
        name.push(format!(".{}.{}", TEMP_MARKER, ext));
        Ok(file.with_file_name(name))
    }
}

fn is_temp_output(path: &Path) -> bool {
    path.file_stem()
        .and_then(|stem| Path::new(stem).extension())
        .map(|marker| marker == TEMP_MARKER)
        .unwrap_or(false)
}

/// `<file>.backup`
pub fn backup_path(file: &Path) -> PathBuf {
    let mut name = file.as_os_str().to_os_string();
    name.push(format!(".{}", BACKUP_SUFFIX));
    PathBuf::from(name)
}

/// Put `replacement` in place of `original`.
///
/// The original is first moved aside to its backup name; if moving the
/// replacement in fails, the original is restored. The backup is removed
/// unless `keep_backup`, in which case its path is returned.
pub fn replace_file(
    original: &Path,
    replacement: &Path,
    keep_backup: bool,
) -> GapCutResult<Option<PathBuf>> {
    replace_file_with(original, replacement, keep_backup, |from, to| std::fs::rename(from, to))
}

fn replace_file_with<F>(
    original: &Path,
    replacement: &Path,
    keep_backup: bool,
    rename: F,
) -> GapCutResult<Option<PathBuf>>
where
    F: Fn(&Path, &Path) -> std::io::Result<()>,
{
    let backup = backup_path(original);
    debug!("Replace {} with {}", original.display(), replacement.display());

    rename(original, &backup)?;
    if let Err(e) = rename(replacement, original) {
        warn!("Could not move {} into place: {}", replacement.display(), e);
        if let Err(restore) = rename(&backup, original) {
            error!(
                "Could not restore {}; the original is now at {}",
                original.display(),
                backup.display()
            );
            return Err(GapCutError::OriginalStranded {
                original: original.display().to_string(),
                backup: backup.display().to_string(),
                message: format!("{}; restore failed: {}", e, restore),
            });
        }
        return Err(e.into());
    }

    if keep_backup {
        info!("Original kept as {}", backup.display());
        return Ok(Some(backup));
    }

    std::fs::remove_file(&backup)?;
    debug!("Completed update of {}", original.display());
    Ok(None)
}

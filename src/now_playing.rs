//! # Now-Playing Module
//!
//! Publishes the track about to be streamed to a small text file that
//! external tools (web widgets, chat bots) poll. The file holds a single line,
//! `Now playing: <file name>`, and is replaced wholesale on every selection,
//! before playback starts.
//!
//! Readers usually run as another user (a web server, a bot), so a fresh
//! artifact is world-readable and a replaced one keeps the mode the operator
//! gave it.

use anyhow::{Context, Result};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Sink for the currently selected track.
pub trait Publisher {
    /// Record `track` as now playing.
    ///
    /// # Errors
    ///
    /// Returns an error if the artifact cannot be written. Callers log it and
    /// carry on with playback.
    fn publish(&self, track: &Path) -> Result<()>;
}

/// Now-playing artifact backed by a plain file.
#[derive(Debug, Clone)]
pub struct NowPlayingFile {
    path: PathBuf,
}

impl NowPlayingFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Publisher for NowPlayingFile {
    fn publish(&self, track: &Path) -> Result<()> {
        let line = now_playing_line(track);
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        // Write beside the target and rename over it so readers never see a
        // half-written line.
        let mut tmp = NamedTempFile::new_in(dir)
            .with_context(|| format!("Failed to create temporary file in {}", dir.display()))?;
        tmp.write_all(line.as_bytes())
            .context("Failed to write now-playing line")?;
        if let Some(perms) = artifact_permissions(&self.path) {
            tmp.as_file()
                .set_permissions(perms)
                .context("Failed to set now-playing permissions")?;
        }
        tmp.persist(&self.path)
            .with_context(|| format!("Failed to replace {}", self.path.display()))?;

        Ok(())
    }
}

/// Mode for the replacement file: the current artifact's, or `0644`.
#[cfg(unix)]
fn artifact_permissions(path: &Path) -> Option<fs::Permissions> {
    use std::os::unix::fs::PermissionsExt;

    match fs::metadata(path) {
        Ok(meta) => Some(meta.permissions()),
        Err(_) => Some(fs::Permissions::from_mode(0o644)),
    }
}

#[cfg(not(unix))]
fn artifact_permissions(path: &Path) -> Option<fs::Permissions> {
    fs::metadata(path).ok().map(|meta| meta.permissions())
}

/// The line written for `track`: its file name only.
pub fn now_playing_line(track: &Path) -> String {
    let name = track
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| track.display().to_string());
    format!("Now playing: {name}")
}

/// Read the current now-playing line, if the artifact exists.
pub fn read_now_playing(path: &Path) -> Result<Option<String>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(Some(content.trim_end().to_string()))
}

//! # Library Module
//!
//! Turns mood names into playable files on disk.
//!
//! ## Layout
//!
//! ```text
//! songs/
//! ├── Calm/
//! │   ├── a.mp3
//! │   └── b.flac
//! ├── Neutral/
//! └── interruptions/
//!     └── station-id.ogg
//! ```
//!
//! Each mood is a subdirectory of the songs directory. Interruption tracks
//! (jingles, station idents) live in their own directory. Only files with an
//! allow-listed audio extension are considered; subdirectories are never
//! descended into.
//!
//! Missing or unreadable mood directories are logged and skipped, so a single
//! misconfigured mood never empties the whole pool.

use anyhow::{Context, Result};
use log::{debug, error, warn};
use std::fs;
use std::path::{Path, PathBuf};

/// Audio formats ffmpeg is expected to decode, compared case-insensitively.
pub const AUDIO_EXTENSIONS: [&str; 5] = ["mp3", "aac", "wav", "flac", "ogg"];

/// Whether `path` has an allow-listed audio extension.
pub fn is_audio_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_lowercase();
            AUDIO_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// Narrow the resolved moods for pool lookup.
///
/// When the override mood is scheduled it replaces every other mood;
/// otherwise the list is returned unchanged.
pub fn effective_moods(moods: &[String], override_mood: &str) -> Vec<String> {
    if moods.iter().any(|m| m == override_mood) {
        vec![override_mood.to_string()]
    } else {
        moods.to_vec()
    }
}

/// Collect playable tracks for every mood in `moods`.
///
/// Each mood maps to the directory `songs_dir/<mood>`. The tracks of all
/// moods are concatenated in mood order; within a mood the order is whatever
/// the filesystem returns.
///
/// # Arguments
///
/// * `songs_dir` - Root holding one subdirectory per mood
/// * `moods` - Mood names to gather, usually after [`effective_moods`]
///
/// # Failure Handling
///
/// This function never fails as a whole:
/// - A missing mood directory is logged at `warn` and skipped
/// - An unreadable directory, or one whose entries cannot be read, is logged
///   at `error` and skipped
///
/// The remaining moods are still listed, so one broken mood only shrinks the
/// pool. An empty result is the caller's signal to back off.
///
/// # Examples
///
/// ```no_run
/// use moodcast::library::list_tracks;
/// use std::path::Path;
///
/// let moods = vec!["Calm".to_string(), "Neutral".to_string()];
/// let pool = list_tracks(Path::new("/srv/radio/songs"), &moods);
/// println!("{} candidate track(s)", pool.len());
/// ```
pub fn list_tracks(songs_dir: &Path, moods: &[String]) -> Vec<PathBuf> {
    collect_moods(songs_dir, moods, scan_audio_files)
}

fn collect_moods<F>(songs_dir: &Path, moods: &[String], scan: F) -> Vec<PathBuf>
where
    F: Fn(&Path) -> Result<Vec<PathBuf>>,
{
    let mut tracks = Vec::new();

    for mood in moods {
        let mood_dir = songs_dir.join(mood);
        if !mood_dir.is_dir() {
            warn!("Mood directory {} not found, skipping", mood_dir.display());
            continue;
        }

        match scan(&mood_dir) {
            Ok(found) => {
                debug!("Mood {mood}: {} track(s)", found.len());
                tracks.extend(found);
            }
            Err(e) => error!("Skipping mood {mood}: {e:#}"),
        }
    }

    tracks
}

/// Collect playable interruption tracks.
///
/// A missing directory is logged at error level and yields an empty pool;
/// the supervisor treats an empty interruption pool as fatal at startup.
pub fn list_interruptions(dir: &Path) -> Vec<PathBuf> {
    if !dir.is_dir() {
        error!("Interruption directory {} not found", dir.display());
        return Vec::new();
    }

    match scan_audio_files(dir) {
        Ok(found) => found,
        Err(e) => {
            error!("Failed to list interruptions: {e:#}");
            Vec::new()
        }
    }
}

/// List regular audio files directly inside `dir`.
///
/// # Errors
///
/// Returns an error if the directory or one of its entries cannot be read.
pub fn scan_audio_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory {}", dir.display()))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry
            .with_context(|| format!("Failed to read entry in {}", dir.display()))?;
        let path = entry.path();
        if path.is_file() && is_audio_file(&path) {
            files.push(path);
        }
    }

    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, b"").unwrap();
        path
    }

    fn moods(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_is_audio_file() {
        assert!(is_audio_file(Path::new("a.mp3")));
        assert!(is_audio_file(Path::new("a.FLAC")));
        assert!(is_audio_file(Path::new("dir/a.Ogg")));
        assert!(is_audio_file(Path::new("a.aac")));
        assert!(is_audio_file(Path::new("a.wav")));
        assert!(!is_audio_file(Path::new("a.m4a")));
        assert!(!is_audio_file(Path::new("cover.jpg")));
        assert!(!is_audio_file(Path::new("mp3")));
    }

    #[test]
    fn test_effective_moods_override_is_exclusive() {
        let scheduled = moods(&["Calm", "Special", "Neutral"]);
        assert_eq!(effective_moods(&scheduled, "Special"), vec!["Special"]);

        let plain = moods(&["Calm", "Neutral"]);
        assert_eq!(effective_moods(&plain, "Special"), plain);
    }

    #[test]
    fn test_list_tracks_skips_missing_mood() -> Result<()> {
        let songs = TempDir::new()?;
        let neutral = songs.path().join("Neutral");
        fs::create_dir(&neutral)?;
        let mut expected = vec![
            touch(&neutral, "one.mp3"),
            touch(&neutral, "two.flac"),
            touch(&neutral, "three.OGG"),
        ];
        touch(&neutral, "notes.txt");

        assert!(list_tracks(songs.path(), &moods(&["Calm"])).is_empty());

        let mut tracks = list_tracks(songs.path(), &moods(&["Calm", "Neutral"]));
        tracks.sort();
        expected.sort();
        assert_eq!(tracks, expected);
        Ok(())
    }

    #[test]
    fn test_unreadable_mood_does_not_hide_others() -> Result<()> {
        let songs = TempDir::new()?;
        for mood in ["Broken", "Calm"] {
            let dir = songs.path().join(mood);
            fs::create_dir(&dir)?;
            touch(&dir, &format!("{mood}.mp3"));
        }

        let tracks = collect_moods(songs.path(), &moods(&["Broken", "Calm"]), |dir| {
            if dir.ends_with("Broken") {
                anyhow::bail!("Permission denied");
            }
            scan_audio_files(dir)
        });
        assert_eq!(tracks, vec![songs.path().join("Calm").join("Calm.mp3")]);
        Ok(())
    }

    #[test]
    fn test_list_tracks_merges_moods_and_ignores_subdirectories() -> Result<()> {
        let songs = TempDir::new()?;
        for mood in ["Calm", "Dance"] {
            let dir = songs.path().join(mood);
            fs::create_dir_all(dir.join("nested.mp3"))?;
            touch(&dir, &format!("{mood}.wav"));
        }

        let tracks = list_tracks(songs.path(), &moods(&["Calm", "Dance"]));
        assert_eq!(tracks.len(), 2);
        assert!(tracks.iter().all(|t| t.is_file()));
        Ok(())
    }

    #[test]
    fn test_list_interruptions() -> Result<()> {
        let dir = TempDir::new()?;
        assert!(list_interruptions(&dir.path().join("absent")).is_empty());
        assert!(list_interruptions(dir.path()).is_empty());

        let jingle = touch(dir.path(), "jingle.aac");
        touch(dir.path(), "readme.md");
        assert_eq!(list_interruptions(dir.path()), vec![jingle]);
        Ok(())
    }

    #[test]
    fn test_scan_audio_files_missing_dir_errors() {
        let dir = TempDir::new().unwrap();
        assert!(scan_audio_files(&dir.path().join("nope")).is_err());
    }
}

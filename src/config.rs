//! # Configuration Module
//!
//! Turns command-line/environment settings into a validated runtime
//! configuration.
//!
//! Directories are made absolute relative to the working directory at
//! startup, so track paths compare as full paths for repeat avoidance no
//! matter how the songs directory was spelled.

use crate::cli::StationArgs;
use crate::schedule::Schedule;
use crate::selection::InterruptionCadence;
use crate::streamer::StreamTargets;
use crate::supervisor::{Backoffs, PlayoutSettings};
use anyhow::{bail, Context, Result};
use log::info;
use path_absolutize::Absolutize;
use std::fs;
use std::path::{Path, PathBuf};

/// Subdirectory of the songs directory used for interruptions by default.
pub const DEFAULT_INTERRUPTIONS_SUBDIR: &str = "interruptions";

/// Validated station configuration.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub songs_dir: PathBuf,
    pub interruptions_dir: PathBuf,
    pub hls_output: PathBuf,
    pub local_rtmp: String,
    pub remote_rtmp: String,
    pub now_playing_file: PathBuf,
    pub schedule_file: Option<PathBuf>,
    pub override_mood: String,
    pub history_size: usize,
    pub cadence: InterruptionCadence,
    pub ffmpeg: PathBuf,
    pub log_file: Option<PathBuf>,
}

impl RuntimeConfig {
    /// Build and validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if a path cannot be made absolute, the history size
    /// is zero, or the interruption range is inverted or starts at zero.
    pub fn from_args(args: &StationArgs) -> Result<Self> {
        if args.history_size == 0 {
            bail!("History size must be at least 1");
        }
        if args.interruption_min == 0 || args.interruption_min > args.interruption_max {
            bail!(
                "Invalid interruption range {}..={}: expected 1 <= min <= max",
                args.interruption_min,
                args.interruption_max
            );
        }

        let songs_dir = absolute(&args.songs_dir)?;
        let interruptions_dir = match &args.interruptions_dir {
            Some(dir) => absolute(dir)?,
            None => songs_dir.join(DEFAULT_INTERRUPTIONS_SUBDIR),
        };
        let log_file = match args.log_file.trim() {
            "" => None,
            path => Some(PathBuf::from(path)),
        };

        Ok(Self {
            songs_dir,
            interruptions_dir,
            hls_output: absolute(&args.hls_output)?,
            local_rtmp: args.local_rtmp.clone(),
            remote_rtmp: args.remote_rtmp.clone(),
            now_playing_file: args.now_playing_file.clone(),
            schedule_file: args.schedule_file.clone(),
            override_mood: args.override_mood.clone(),
            history_size: args.history_size,
            cadence: InterruptionCadence {
                min: args.interruption_min,
                max: args.interruption_max,
            },
            ffmpeg: args.ffmpeg.clone(),
            log_file,
        })
    }

    /// The configured schedule file, or the built-in day programme.
    pub fn schedule(&self) -> Result<Schedule> {
        match &self.schedule_file {
            Some(path) => {
                let schedule = Schedule::load(path)?;
                info!("Loaded {} slot(s) from {}", schedule.slots.len(), path.display());
                Ok(schedule)
            }
            None => Ok(Schedule::default()),
        }
    }

    /// Create the stream output, songs and interruption directories.
    pub fn prepare_directories(&self) -> Result<()> {
        for dir in [&self.hls_output, &self.songs_dir, &self.interruptions_dir] {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create directory {}", dir.display()))?;
        }
        Ok(())
    }

    pub fn stream_targets(&self) -> StreamTargets {
        StreamTargets {
            hls_dir: self.hls_output.clone(),
            local_rtmp: self.local_rtmp.clone(),
            remote_rtmp: self.remote_rtmp.clone(),
        }
    }

    pub fn playout_settings(&self) -> Result<PlayoutSettings> {
        Ok(PlayoutSettings {
            schedule: self.schedule()?,
            songs_dir: self.songs_dir.clone(),
            interruptions_dir: self.interruptions_dir.clone(),
            override_mood: self.override_mood.clone(),
            history_size: self.history_size,
            cadence: self.cadence,
            backoffs: Backoffs::default(),
        })
    }
}

fn absolute(path: &Path) -> Result<PathBuf> {
    let resolved = path
        .absolutize()
        .with_context(|| format!("Failed to resolve path {}", path.display()))?;
    Ok(resolved.to_path_buf())
}

//! # Command-Line Interface Module
//!
//! Clap definitions for moodcast. Every station setting can come from a flag
//! or from the environment, which is how the service is usually configured
//! under systemd or in a container.
//!
//! ## Commands
//!
//! - `run`: start unattended playout
//! - `schedule`: show the day programme and what is active
//! - `tracks`: list the pool the scheduler would draw from
//! - `now-playing`: print the now-playing artifact
//! - `completion`: generate shell completions
//!
//! ## Examples
//!
//! ```bash
//! SONGS_DIR=/srv/radio/songs moodcast run
//! moodcast schedule --at 19:55
//! moodcast tracks --mood Calm --mood Neutral
//! ```

use clap::{Args as ClapArgs, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "moodcast")]
#[command(about = "Moodcast: unattended mood-scheduled radio playout")]
#[command(version)]
pub struct Args {
    #[command(flatten)]
    pub station: StationArgs,

    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Station settings shared by every subcommand.
#[derive(ClapArgs, Debug, Clone)]
pub struct StationArgs {
    /// Directory with one subdirectory per mood
    #[arg(long, env = "SONGS_DIR", default_value = "songs", global = true)]
    pub songs_dir: PathBuf,

    /// Directory with interruption tracks [default: <songs-dir>/interruptions]
    #[arg(long, env = "INTERRUPTIONS_DIR", global = true)]
    pub interruptions_dir: Option<PathBuf>,

    /// Output directory for the HLS playlist and segments
    #[arg(long, env = "HLS_OUTPUT", default_value = "/tmp/hls", global = true)]
    pub hls_output: PathBuf,

    /// First RTMP push target
    #[arg(long, env = "LOCAL_RTMP", default_value = "rtmp://localhost/live/stream", global = true)]
    pub local_rtmp: String,

    /// Second RTMP push target
    #[arg(long, env = "REMOTE_RTMP", default_value = "rtmp://localhost/live/relay", global = true)]
    pub remote_rtmp: String,

    /// File overwritten with the current track name
    #[arg(long, env = "CURRENT_TRACK_FILE", default_value = "current_track.txt", global = true)]
    pub now_playing_file: PathBuf,

    /// JSON schedule file; the built-in day programme is used when absent
    #[arg(long, env = "SCHEDULE_FILE", global = true)]
    pub schedule_file: Option<PathBuf>,

    /// Mood that, when scheduled, replaces all other moods for track lookup
    #[arg(long, env = "OVERRIDE_MOOD", default_value = "Special", global = true)]
    pub override_mood: String,

    /// Number of recent main tracks to avoid repeating
    #[arg(long, env = "HISTORY_SIZE", default_value_t = 30, global = true)]
    pub history_size: usize,

    /// Fewest main tracks between interruptions
    #[arg(long, env = "INTERRUPTION_MIN", default_value_t = 10, global = true)]
    pub interruption_min: u32,

    /// Most main tracks between interruptions
    #[arg(long, env = "INTERRUPTION_MAX", default_value_t = 15, global = true)]
    pub interruption_max: u32,

    /// ffmpeg executable
    #[arg(long, env = "FFMPEG_BIN", default_value = "ffmpeg", global = true)]
    pub ffmpeg: PathBuf,

    /// Log file (in addition to stderr); empty to disable
    #[arg(long, env = "LOG_FILE", default_value = "radio.log", global = true)]
    pub log_file: String,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start playout and stream until SIGINT/SIGTERM
    Run,

    /// Show the schedule and the moods active at a given time
    Schedule {
        /// Time of day (HH:MM); defaults to now
        #[arg(long)]
        at: Option<String>,
    },

    /// List the tracks that would be drawn from
    ///
    /// Uses the moods scheduled at `--at` (or now) unless moods are given
    /// explicitly. The override mood applies either way.
    Tracks {
        /// Time of day (HH:MM); defaults to now
        #[arg(long, conflicts_with = "mood")]
        at: Option<String>,

        /// Explicit mood(s) to list
        #[arg(long)]
        mood: Vec<String>,
    },

    /// Print the current now-playing line
    NowPlaying,

    /// Generate shell completions
    ///
    /// Usage: moodcast completion bash > ~/.local/share/bash-completion/completions/moodcast
    Completion {
        /// Shell to generate completions for
        shell: Shell,
    },
}

//! Unattended radio playout driven by a mood schedule.
//!
//! Core modules:
//! - [`schedule`] - Time of day to permitted moods
//! - [`library`] - Mood and interruption pools on disk
//! - [`selection`] - Repeat-avoiding track choice and interruption cadence
//! - [`now_playing`] - Now-playing artifact
//! - [`supervisor`] - The playout loop
//!
//! ### Supporting Modules
//!
//! - [`streamer`] - Blocking hand-off to ffmpeg
//! - [`shutdown`] - Signal-driven cancellation
//! - [`config`] - Runtime configuration from flags and environment
//! - [`logging`] - Logger setup
//! - [`cli`] - Command-line interface definitions with clap integration
//! - [`completion`] - Shell completion generation
//!
//! ## Quick Start Example
//!
//! ```no_run
//! use moodcast::now_playing::NowPlayingFile;
//! use moodcast::schedule::Schedule;
//! use moodcast::selection::InterruptionCadence;
//! use moodcast::shutdown::Shutdown;
//! use moodcast::streamer::{FfmpegStreamer, StreamTargets};
//! use moodcast::supervisor::{Backoffs, PlayoutSettings, Supervisor, SystemClock};
//!
//! let shutdown = Shutdown::from_signals()?;
//! let settings = PlayoutSettings {
//!     schedule: Schedule::default(),
//!     songs_dir: "/srv/radio/songs".into(),
//!     interruptions_dir: "/srv/radio/songs/interruptions".into(),
//!     override_mood: "Special".to_string(),
//!     history_size: 30,
//!     cadence: InterruptionCadence::default(),
//!     backoffs: Backoffs::default(),
//! };
//! let targets = StreamTargets {
//!     hls_dir: "/tmp/hls".into(),
//!     local_rtmp: "rtmp://localhost/live/stream".to_string(),
//!     remote_rtmp: "rtmp://relay.example/live/key".to_string(),
//! };
//!
//! let mut supervisor = Supervisor::new(
//!     settings,
//!     FfmpegStreamer::new("ffmpeg", targets, shutdown.clone()),
//!     NowPlayingFile::new("current_track.txt"),
//!     SystemClock,
//!     rand::thread_rng(),
//! );
//! supervisor.run(&shutdown)?;
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! ## Error Handling
//!
//! Public fallible functions return `anyhow::Result`. Conditions the station
//! recovers from on its own (missing mood directories, empty pools, failed
//! playback, an unwritable now-playing file) are logged and never surface as
//! errors; only an empty interruption pool at startup and unrecoverable
//! failures end [`supervisor::Supervisor::run`].

pub mod cli;
pub mod completion;
pub mod config;
pub mod library;
pub mod logging;
pub mod now_playing;
pub mod schedule;
pub mod selection;
pub mod shutdown;
pub mod streamer;
pub mod supervisor;

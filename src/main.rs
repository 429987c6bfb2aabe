//! # Moodcast
//!
//! Unattended radio playout: picks tracks by time-of-day mood, sprinkles in
//! interruptions (station idents, jingles) every 10–15 tracks, and streams
//! each one through ffmpeg to HLS and two RTMP endpoints.
//!
//! ## Usage
//!
//! ```bash
//! # Stream with the built-in schedule
//! SONGS_DIR=/srv/radio/songs moodcast run
//!
//! # What plays at 19:55?
//! moodcast schedule --at 19:55
//! moodcast tracks --at 19:55
//! ```

use anyhow::Result;
use clap::{CommandFactory, Parser};
use log::{error, info};
use moodcast::cli::{self, Command};
use moodcast::config::RuntimeConfig;
use moodcast::now_playing::{self, NowPlayingFile};
use moodcast::schedule::{self, Schedule};
use moodcast::shutdown::Shutdown;
use moodcast::streamer::FfmpegStreamer;
use moodcast::supervisor::{Clock, Supervisor, SystemClock};
use moodcast::{completion, library, logging};

/// Main entry point.
///
/// Only `run` logs to the log file; the inspection commands log to stderr.
/// Any error reaching this point is logged with its full context chain and
/// the process exits with status 1.
fn main() {
    let args = cli::Args::parse();

    let log_file = match args.command {
        Command::Run => RuntimeConfig::from_args(&args.station)
            .ok()
            .and_then(|config| config.log_file),
        _ => None,
    };
    logging::init(log_file.as_deref());

    if let Err(e) = dispatch(args) {
        error!("Critical error: {e:?}");
        std::process::exit(1);
    }
}

fn dispatch(args: cli::Args) -> Result<()> {
    match args.command {
        Command::Run => {
            let config = RuntimeConfig::from_args(&args.station)?;
            run(&config)
        }
        Command::Schedule { at } => {
            let config = RuntimeConfig::from_args(&args.station)?;
            show_schedule(&config, at.as_deref())
        }
        Command::Tracks { at, mood } => {
            let config = RuntimeConfig::from_args(&args.station)?;
            show_tracks(&config, at.as_deref(), mood)
        }
        Command::NowPlaying => {
            match now_playing::read_now_playing(&args.station.now_playing_file)? {
                Some(line) => println!("{line}"),
                None => println!("Nothing playing"),
            }
            Ok(())
        }
        Command::Completion { shell } => {
            completion::print_completions(shell, &mut cli::Args::command());
            Ok(())
        }
    }
}

fn run(config: &RuntimeConfig) -> Result<()> {
    info!("Starting moodcast v{}", env!("CARGO_PKG_VERSION"));
    config.prepare_directories()?;

    let shutdown = Shutdown::from_signals()?;
    let settings = config.playout_settings()?;
    let streamer = FfmpegStreamer::new(&config.ffmpeg, config.stream_targets(), shutdown.clone());
    let publisher = NowPlayingFile::new(&config.now_playing_file);

    let mut supervisor = Supervisor::new(
        settings,
        streamer,
        publisher,
        SystemClock,
        rand::thread_rng(),
    );
    supervisor.run(&shutdown)
}

fn time_or_now(at: Option<&str>) -> Result<chrono::NaiveTime> {
    match at {
        Some(time) => schedule::parse_time_of_day(time),
        None => Ok(SystemClock.now()),
    }
}

fn show_schedule(config: &RuntimeConfig, at: Option<&str>) -> Result<()> {
    let now = time_or_now(at)?;
    let schedule: Schedule = config.schedule()?;
    let active = schedule.active_slot(now);

    for slot in &schedule.slots {
        let marker = if active == Some(slot) { "▶" } else { " " };
        println!("{marker} {slot}  {}", slot.moods.join(", "));
    }

    let moods = schedule.resolve(now);
    println!();
    if moods.is_empty() {
        println!("{}: no slot scheduled", now.format("%H:%M"));
    } else {
        let lookup = library::effective_moods(&moods, &config.override_mood);
        println!("{}: moods {}", now.format("%H:%M"), moods.join(", "));
        println!("{}: pool from {}", now.format("%H:%M"), lookup.join(", "));
    }
    Ok(())
}

fn show_tracks(config: &RuntimeConfig, at: Option<&str>, moods: Vec<String>) -> Result<()> {
    let moods = if moods.is_empty() {
        config.schedule()?.resolve(time_or_now(at)?)
    } else {
        moods
    };
    let lookup = library::effective_moods(&moods, &config.override_mood);

    let mut tracks = library::list_tracks(&config.songs_dir, &lookup);
    tracks.sort();
    for track in &tracks {
        println!("{}", track.display());
    }
    println!("{} track(s) for {}", tracks.len(), lookup.join(", "));
    Ok(())
}

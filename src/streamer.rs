//! # Streamer Module
//!
//! The hand-off to the encoding/distribution side of the station.
//!
//! The scheduler only relies on the [`Streamer`] contract: one blocking call
//! per track that returns once the file has been fully delivered, or an error
//! if delivery failed. [`FfmpegStreamer`] fulfils it by running `ffmpeg` in
//! real-time mode with a `tee` muxer feeding an HLS playlist and two RTMP
//! endpoints.

use crate::shutdown::Shutdown;
use anyhow::{bail, Context, Result};
use log::{debug, info, warn};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use std::time::Duration;

/// How often a running ffmpeg is checked for exit. Any delay here is silence
/// on air between tracks.
pub const EXIT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Blocking playback of a single track.
pub trait Streamer {
    /// Stream `track` to completion.
    ///
    /// # Errors
    ///
    /// Returns an error if the track could not be delivered. The supervisor
    /// treats every error as a failed attempt and retries on the next cycle.
    fn play(&mut self, track: &Path) -> Result<()>;
}

/// Output targets for the ffmpeg `tee` muxer.
#[derive(Debug, Clone)]
pub struct StreamTargets {
    /// Directory receiving `stream.m3u8` and its segments.
    pub hls_dir: PathBuf,
    pub local_rtmp: String,
    pub remote_rtmp: String,
}

impl StreamTargets {
    /// The `tee` output specification.
    pub fn tee_output(&self) -> String {
        let playlist = self.hls_dir.join("stream.m3u8");
        format!(
            "[f=hls:hls_time=4:hls_list_size=5:hls_flags=delete_segments]{}|[f=flv]{}|[f=flv]{}",
            playlist.display(),
            self.local_rtmp,
            self.remote_rtmp
        )
    }
}

/// Streams tracks by spawning `ffmpeg` once per track.
#[derive(Debug, Clone)]
pub struct FfmpegStreamer {
    binary: PathBuf,
    targets: StreamTargets,
    shutdown: Shutdown,
}

impl FfmpegStreamer {
    pub fn new(binary: impl Into<PathBuf>, targets: StreamTargets, shutdown: Shutdown) -> Self {
        Self {
            binary: binary.into(),
            targets,
            shutdown,
        }
    }

    /// Arguments passed to ffmpeg for `input`.
    pub fn args(&self, input: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec!["-re".into(), "-i".into(), input.into()];
        args.extend(
            [
                "-c:a", "aac", "-b:a", "128k", "-ar", "44100", "-ac", "2", "-f", "tee", "-map",
                "0:a", "-hls_allow_cache", "0",
            ]
            .into_iter()
            .map(OsString::from),
        );
        args.push(self.targets.tee_output().into());
        args
    }
}

impl Streamer for FfmpegStreamer {
    fn play(&mut self, track: &Path) -> Result<()> {
        if !track.is_file() {
            bail!("Track {} not found", track.display());
        }

        info!("Starting ffmpeg for {}", track.display());
        let mut child = Command::new(&self.binary)
            .args(self.args(track))
            .stdin(Stdio::null())
            .spawn()
            .with_context(|| format!("Failed to execute {}", self.binary.display()))?;

        loop {
            if let Some(status) = child.try_wait().context("Failed to poll ffmpeg")? {
                if status.success() {
                    debug!("ffmpeg finished {}", track.display());
                    return Ok(());
                }
                bail!("ffmpeg exited with {status} for {}", track.display());
            }

            if self.shutdown.is_requested() {
                warn!("Abandoning playback of {}", track.display());
                let _ = child.kill();
                let _ = child.wait();
                bail!("Playback of {} interrupted by shutdown", track.display());
            }

            thread::sleep(EXIT_POLL_INTERVAL);
        }
    }
}

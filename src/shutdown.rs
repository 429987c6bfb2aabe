//! # Shutdown Module
//!
//! Cooperative cancellation for the playout loop.
//!
//! SIGINT and SIGTERM set a process-wide flag from a `libc` signal handler.
//! A [`Shutdown`] token combines that flag with its own local flag (so tests
//! and in-process callers can request a stop without signals). The loop checks
//! the token at every iteration boundary, while sleeping, and while waiting on
//! the streaming process.

use anyhow::{bail, Result};
use log::info;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

static SIGNALLED: AtomicBool = AtomicBool::new(false);

/// How often blocking waits re-check the token.
pub const POLL_INTERVAL: Duration = Duration::from_millis(200);

extern "C" fn on_signal(_signum: libc::c_int) {
    // Only async-signal-safe work here.
    SIGNALLED.store(true, Ordering::SeqCst);
}

/// Cancellation token shared between the supervisor and the streamer.
#[derive(Debug, Clone, Default)]
pub struct Shutdown {
    requested: Arc<AtomicBool>,
    watch_signals: bool,
}

impl Shutdown {
    /// A token that only reacts to [`Shutdown::request`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Install SIGINT/SIGTERM handlers and return a token that observes them.
    ///
    /// # Errors
    ///
    /// Returns an error if a handler cannot be installed.
    pub fn from_signals() -> Result<Self> {
        for signum in [libc::SIGINT, libc::SIGTERM] {
            let handler = on_signal as extern "C" fn(libc::c_int);
            // SAFETY: the handler only stores to an atomic.
            let previous = unsafe { libc::signal(signum, handler as libc::sighandler_t) };
            if previous == libc::SIG_ERR {
                bail!("Failed to install handler for signal {signum}");
            }
        }

        Ok(Self {
            requested: Arc::new(AtomicBool::new(false)),
            watch_signals: true,
        })
    }

    pub fn request(&self) {
        self.requested.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        if self.requested.load(Ordering::SeqCst) {
            return true;
        }
        if self.watch_signals && SIGNALLED.load(Ordering::SeqCst) {
            info!("Termination signal received, shutting down");
            // Latch so the log line is printed once.
            self.requested.store(true, Ordering::SeqCst);
            return true;
        }
        false
    }

    /// Sleep for `duration`, waking early on shutdown.
    ///
    /// Returns `true` if the sleep was cut short.
    pub fn sleep(&self, duration: Duration) -> bool {
        let deadline = Instant::now() + duration;
        loop {
            if self.is_requested() {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            thread::sleep(POLL_INTERVAL.min(deadline - now));
        }
    }
}

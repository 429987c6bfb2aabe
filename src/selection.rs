//! # Selection Module
//!
//! Picks the next track from a pool.
//!
//! Main-programme tracks avoid the recent [`History`] when the pool allows
//! it: the choice is uniform over the pool minus history, falling back to the
//! whole pool once every candidate has been played recently. Interruptions
//! are drawn uniformly and never consult history.
//!
//! The random source is always passed in so callers (and tests) control it.

use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};

/// Default number of main tracks remembered for repeat avoidance.
pub const DEFAULT_HISTORY_SIZE: usize = 30;

/// Bounded FIFO of recently played main tracks.
#[derive(Debug, Clone)]
pub struct History {
    entries: VecDeque<PathBuf>,
    capacity: usize,
}

impl History {
    /// A history remembering `capacity` tracks. A zero capacity is raised to
    /// one, so the track just played is never picked again straight away.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Record a played track, evicting the oldest entry once full.
    pub fn push(&mut self, track: PathBuf) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(track);
    }

    pub fn contains(&self, track: &Path) -> bool {
        self.entries.iter().any(|t| t == track)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &PathBuf> {
        self.entries.iter()
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_SIZE)
    }
}

/// Inclusive range the interruption threshold is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterruptionCadence {
    pub min: u32,
    pub max: u32,
}

impl Default for InterruptionCadence {
    fn default() -> Self {
        Self { min: 10, max: 15 }
    }
}

/// Draw how many main tracks to play before the next interruption.
pub fn draw_threshold<R: Rng + ?Sized>(cadence: InterruptionCadence, rng: &mut R) -> u32 {
    rng.gen_range(cadence.min..=cadence.max.max(cadence.min))
}

/// Choose a main-programme track, preferring ones not in `history`.
///
/// Returns `None` only for an empty pool.
pub fn select_main<'a, R: Rng + ?Sized>(
    pool: &'a [PathBuf],
    history: &History,
    rng: &mut R,
) -> Option<&'a PathBuf> {
    let fresh: Vec<&PathBuf> = pool.iter().filter(|t| !history.contains(t)).collect();

    match fresh.choose(rng) {
        Some(track) => Some(*track),
        None => pool.choose(rng),
    }
}

/// Choose an interruption track uniformly. `None` for an empty pool.
pub fn select_interruption<'a, R: Rng + ?Sized>(
    pool: &'a [PathBuf],
    rng: &mut R,
) -> Option<&'a PathBuf> {
    pool.choose(rng)
}

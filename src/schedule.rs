//! # Schedule Module
//!
//! Maps the time of day to the list of moods the station is allowed to play.
//!
//! A schedule is an ordered list of slots. Each slot covers a half-open
//! interval of minutes since midnight and may wrap past midnight
//! (`21:00-00:00`, `22:00-02:00`). The first slot containing the current
//! minute wins; when no slot matches, the resolved mood list is empty and the
//! caller is expected to back off.
//!
//! ## File Format
//!
//! Schedules can be loaded from a JSON file:
//!
//! ```json
//! [
//!   { "time": "06:00-07:00", "moods": ["Calm", "Nostalgic"] },
//!   { "time": "22:00-02:00", "moods": ["Melancholic"] }
//! ]
//! ```
//!
//! Malformed times never abort loading: they degrade to minute 0 and a
//! warning is logged.

use anyhow::{Context, Result};
use chrono::{NaiveTime, Timelike};
use log::warn;
use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::Path;

/// Minutes in a day; slot bounds live in `[0, MINUTES_PER_DAY)`.
pub const MINUTES_PER_DAY: u32 = 24 * 60;

/// A contiguous block of the day with its permitted moods.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleSlot {
    pub start_minute: u32,
    pub end_minute: u32,
    pub moods: Vec<String>,
}

/// How a slot is written in schedule files.
#[derive(Debug, Deserialize)]
struct RawSlot {
    time: String,
    moods: Vec<String>,
}

impl ScheduleSlot {
    /// Build a slot from a `HH:MM-HH:MM` range. Never fails; see [`parse_minutes`].
    pub fn parse(range: &str, moods: &[&str]) -> Self {
        let (start_minute, end_minute) = parse_range(range);
        Self {
            start_minute,
            end_minute,
            moods: moods.iter().map(|m| m.to_string()).collect(),
        }
    }

    /// Whether `minute` falls inside this slot.
    ///
    /// `start <= end` is a plain half-open interval (so `start == end` matches
    /// nothing); `end < start` wraps past midnight.
    pub fn contains(&self, minute: u32) -> bool {
        if self.start_minute <= self.end_minute {
            self.start_minute <= minute && minute < self.end_minute
        } else {
            minute >= self.start_minute || minute < self.end_minute
        }
    }

    pub fn wraps_midnight(&self) -> bool {
        self.end_minute < self.start_minute
    }
}

impl fmt::Display for ScheduleSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}-{:02}:{:02}",
            self.start_minute / 60,
            self.start_minute % 60,
            self.end_minute / 60,
            self.end_minute % 60
        )
    }
}

impl From<RawSlot> for ScheduleSlot {
    fn from(raw: RawSlot) -> Self {
        let (start_minute, end_minute) = parse_range(&raw.time);
        Self {
            start_minute,
            end_minute,
            moods: raw.moods,
        }
    }
}

/// The day programme: slots in priority order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schedule {
    pub slots: Vec<ScheduleSlot>,
}

impl Schedule {
    pub fn new(slots: Vec<ScheduleSlot>) -> Self {
        Self { slots }
    }

    /// Load a schedule from a JSON file.
    ///
    /// # File Format
    ///
    /// A JSON array of slots, checked in order:
    ///
    /// ```json
    /// [
    ///   { "time": "06:00-09:00", "moods": ["Calm", "Cheerful"] },
    ///   { "time": "23:00-02:00", "moods": ["Melancholic", "Special"] }
    /// ]
    /// ```
    ///
    /// A slot whose end is before its start runs past midnight.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a JSON array of
    /// `{ "time", "moods" }` objects. Malformed time strings are not errors:
    /// they are logged and read as `00:00`.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use moodcast::schedule::Schedule;
    /// use std::path::Path;
    ///
    /// let schedule = Schedule::load(Path::new("schedule.json"))?;
    /// println!("{} slot(s)", schedule.slots.len());
    /// # Ok::<(), anyhow::Error>(())
    /// ```
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read schedule file {}", path.display()))?;
        Self::from_json(&content)
            .with_context(|| format!("Invalid schedule file {}", path.display()))
    }

    /// Parse a schedule from its JSON representation.
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: Vec<RawSlot> = serde_json::from_str(json)?;
        Ok(Self::new(raw.into_iter().map(ScheduleSlot::from).collect()))
    }

    /// The first slot containing `now`, if any.
    pub fn active_slot(&self, now: NaiveTime) -> Option<&ScheduleSlot> {
        let minute = minute_of_day(now);
        self.slots.iter().find(|slot| slot.contains(minute))
    }

    /// Moods permitted at `now`. Empty when no slot matches.
    ///
    /// The override mood, if scheduled, is returned as-is alongside the other
    /// moods; narrowing the pool is the job of
    /// [`effective_moods`](crate::library::effective_moods).
    pub fn resolve(&self, now: NaiveTime) -> Vec<String> {
        self.active_slot(now)
            .map(|slot| slot.moods.clone())
            .unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl Default for Schedule {
    fn default() -> Self {
        Self::new(vec![
            ScheduleSlot::parse("06:00-07:00", &["Calm", "Nostalgic"]),
            ScheduleSlot::parse("07:00-09:00", &["Cheerful", "Neutral"]),
            ScheduleSlot::parse("09:00-11:00", &["Cheerful", "Energetic"]),
            ScheduleSlot::parse("11:00-13:00", &["Dance", "Energetic"]),
            ScheduleSlot::parse("13:00-15:00", &["Neutral", "Romantic"]),
            ScheduleSlot::parse("15:00-17:00", &["Dance", "Aggressive"]),
            ScheduleSlot::parse("17:00-19:00", &["Romantic", "Calm"]),
            ScheduleSlot::parse("19:00-19:50", &["Calm", "Nostalgic", "Neutral"]),
            ScheduleSlot::parse("19:50-20:10", &["Special"]),
            ScheduleSlot::parse("20:10-21:00", &["Calm", "Nostalgic", "Neutral"]),
            ScheduleSlot::parse("21:00-00:00", &["Melancholic", "Neutral", "Nostalgic"]),
            ScheduleSlot::parse("00:00-06:00", &["Calm", "Neutral"]),
        ])
    }
}

/// Resolve the moods for `now` against `schedule`.
pub fn resolve(now: NaiveTime, schedule: &Schedule) -> Vec<String> {
    schedule.resolve(now)
}

pub fn minute_of_day(time: NaiveTime) -> u32 {
    time.hour() * 60 + time.minute()
}

/// Convert `HH:MM` into minutes since midnight.
///
/// Malformed input (missing colon, non-numeric parts, hour > 23, minute > 59)
/// logs a warning and yields 0.
pub fn parse_minutes(time: &str) -> u32 {
    let parsed = time.trim().split_once(':').and_then(|(h, m)| {
        let hours: u32 = h.trim().parse().ok()?;
        let minutes: u32 = m.trim().parse().ok()?;
        (hours < 24 && minutes < 60).then_some(hours * 60 + minutes)
    });

    parsed.unwrap_or_else(|| {
        warn!("Malformed time in schedule: {time:?}, using 00:00");
        0
    })
}

fn parse_range(range: &str) -> (u32, u32) {
    match range.split_once('-') {
        Some((start, end)) => (parse_minutes(start), parse_minutes(end)),
        None => {
            warn!("Malformed time range in schedule: {range:?}, slot will never match");
            (0, 0)
        }
    }
}

/// Parse a `HH:MM` argument into a time of day, for command-line use.
pub fn parse_time_of_day(time: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(time.trim(), "%H:%M")
        .with_context(|| format!("Invalid time of day {time:?}, expected HH:MM"))
}

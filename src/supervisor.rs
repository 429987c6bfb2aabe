//! # Playout Supervisor
//!
//! The control loop that keeps the station on air.
//!
//! ## Cycle
//!
//! Every iteration:
//!
//! 1. Resolve the scheduled moods for the current time. None → back off 60s.
//! 2. Narrow them with the override mood and list the track pool. Empty → back off 30s.
//! 3. If enough main tracks have played since the last interruption, pick an
//!    interruption; otherwise pick a main track avoiding recent history.
//! 4. Publish the pick as now playing, then stream it (blocking).
//! 5. Only on successful playback: record history, advance or reset the
//!    counter, and redraw the interruption threshold after an interruption.
//!
//! A failed playback changes nothing and the loop simply goes round again.
//!
//! ## Startup
//!
//! The interruption pool is listed once before the loop starts. If it is
//! empty the supervisor refuses to start.

use crate::library::{self, effective_moods};
use crate::now_playing::Publisher;
use crate::schedule::Schedule;
use crate::selection::{self, History, InterruptionCadence};
use crate::shutdown::Shutdown;
use crate::streamer::Streamer;
use anyhow::{bail, Result};
use chrono::NaiveTime;
use log::{debug, error, info, warn};
use rand::Rng;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Source of the current time of day.
pub trait Clock {
    fn now(&self) -> NaiveTime;
}

/// Local wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveTime {
        chrono::Local::now().time()
    }
}

/// Delays applied when there is nothing to play.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoffs {
    pub no_schedule: Duration,
    pub empty_pool: Duration,
}

impl Default for Backoffs {
    fn default() -> Self {
        Self {
            no_schedule: Duration::from_secs(60),
            empty_pool: Duration::from_secs(30),
        }
    }
}

/// Scheduler state that survives between cycles.
#[derive(Debug, Clone)]
pub struct PlayoutState {
    /// Main tracks played since the last interruption.
    pub main_track_counter: u32,
    pub next_interruption_threshold: u32,
    pub history: History,
}

impl PlayoutState {
    pub fn new(history_size: usize, first_threshold: u32) -> Self {
        Self {
            main_track_counter: 0,
            next_interruption_threshold: first_threshold,
            history: History::new(history_size),
        }
    }

    pub fn interruption_due(&self) -> bool {
        self.main_track_counter >= self.next_interruption_threshold
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackKind {
    Main,
    Interruption,
}

/// What a single cycle did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Cycle {
    Played { kind: TrackKind, track: PathBuf },
    /// Playback failed; state was left untouched.
    Failed { kind: TrackKind, track: PathBuf },
    /// Nothing to play right now; wait before the next cycle.
    Backoff(Duration),
}

/// Static inputs of the playout loop.
#[derive(Debug, Clone)]
pub struct PlayoutSettings {
    pub schedule: Schedule,
    pub songs_dir: PathBuf,
    pub interruptions_dir: PathBuf,
    pub override_mood: String,
    pub history_size: usize,
    pub cadence: InterruptionCadence,
    pub backoffs: Backoffs,
}

/// Drives schedule resolution, selection, publishing and playback.
pub struct Supervisor<S, P, C, R> {
    settings: PlayoutSettings,
    streamer: S,
    publisher: P,
    clock: C,
    rng: R,
    state: PlayoutState,
    interruptions: Vec<PathBuf>,
}

impl<S, P, C, R> Supervisor<S, P, C, R>
where
    S: Streamer,
    P: Publisher,
    C: Clock,
    R: Rng,
{
    pub fn new(settings: PlayoutSettings, streamer: S, publisher: P, clock: C, mut rng: R) -> Self {
        let first_threshold = selection::draw_threshold(settings.cadence, &mut rng);
        let state = PlayoutState::new(settings.history_size, first_threshold);
        Self {
            settings,
            streamer,
            publisher,
            clock,
            rng,
            state,
            interruptions: Vec::new(),
        }
    }

    pub fn state(&self) -> &PlayoutState {
        &self.state
    }

    pub fn streamer(&self) -> &S {
        &self.streamer
    }

    /// Load the interruption pool.
    ///
    /// # Errors
    ///
    /// Returns an error if the interruption directory yields no tracks.
    pub fn load_interruptions(&mut self) -> Result<usize> {
        self.interruptions = library::list_interruptions(&self.settings.interruptions_dir);
        if self.interruptions.is_empty() {
            error!(
                "No interruption tracks in {}, nothing to interleave",
                self.settings.interruptions_dir.display()
            );
            bail!(
                "No interruption tracks found in {}",
                self.settings.interruptions_dir.display()
            );
        }
        info!("Loaded {} interruption track(s)", self.interruptions.len());
        Ok(self.interruptions.len())
    }

    /// Run until shutdown is requested.
    ///
    /// Loads the interruption pool once, then repeats [`Supervisor::cycle`]
    /// until `shutdown` fires. Backoff waits go through [`Shutdown::sleep`],
    /// so a signal during a wait ends the loop within one poll interval.
    ///
    /// # Lifecycle
    ///
    /// 1. Interruptions are listed; an empty pool stops here, before anything
    ///    is published or streamed
    /// 2. Each cycle resolves the schedule, lists the mood pool and plays one
    ///    main track or one interruption
    /// 3. Failed plays are logged and retried on the next cycle with state
    ///    unchanged
    ///
    /// # Errors
    ///
    /// Returns an error if the interruption pool is empty at startup, or if a
    /// cycle fails in a way that cannot be retried.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use moodcast::now_playing::NowPlayingFile;
    /// # use moodcast::shutdown::Shutdown;
    /// # use moodcast::streamer::{FfmpegStreamer, StreamTargets};
    /// # use moodcast::supervisor::{PlayoutSettings, Supervisor, SystemClock};
    /// # fn demo(settings: PlayoutSettings, targets: StreamTargets) -> anyhow::Result<()> {
    /// let shutdown = Shutdown::from_signals()?;
    /// let streamer = FfmpegStreamer::new("ffmpeg", targets, shutdown.clone());
    /// let publisher = NowPlayingFile::new("current_track.txt");
    ///
    /// let mut supervisor =
    ///     Supervisor::new(settings, streamer, publisher, SystemClock, rand::thread_rng());
    /// supervisor.run(&shutdown)
    /// # }
    /// ```
    pub fn run(&mut self, shutdown: &Shutdown) -> Result<()> {
        self.load_interruptions()?;
        info!(
            "Playout started, first interruption after {} track(s)",
            self.state.next_interruption_threshold
        );

        while !shutdown.is_requested() {
            if let Cycle::Backoff(delay) = self.cycle()? {
                shutdown.sleep(delay);
            }
        }

        info!("Playout stopped");
        Ok(())
    }

    /// Perform one iteration of the playout loop.
    pub fn cycle(&mut self) -> Result<Cycle> {
        let now = self.clock.now();
        let moods = self.settings.schedule.resolve(now);
        if moods.is_empty() {
            warn!(
                "No schedule for {}, waiting {}s",
                now.format("%H:%M"),
                self.settings.backoffs.no_schedule.as_secs()
            );
            return Ok(Cycle::Backoff(self.settings.backoffs.no_schedule));
        }

        let lookup = effective_moods(&moods, &self.settings.override_mood);
        let pool = library::list_tracks(&self.settings.songs_dir, &lookup);
        if pool.is_empty() {
            warn!(
                "No tracks for moods {lookup:?}, waiting {}s",
                self.settings.backoffs.empty_pool.as_secs()
            );
            return Ok(Cycle::Backoff(self.settings.backoffs.empty_pool));
        }

        if self.state.interruption_due() {
            self.play_interruption()
        } else {
            self.play_main(&pool)
        }
    }

    fn play_interruption(&mut self) -> Result<Cycle> {
        let Some(track) = selection::select_interruption(&self.interruptions, &mut self.rng).cloned()
        else {
            bail!("Interruption pool is empty");
        };

        info!("Interruption: {}", display_name(&track));
        if !self.attempt(&track) {
            return Ok(Cycle::Failed {
                kind: TrackKind::Interruption,
                track,
            });
        }

        self.state.main_track_counter = 0;
        self.state.next_interruption_threshold =
            selection::draw_threshold(self.settings.cadence, &mut self.rng);
        debug!(
            "Next interruption after {} track(s)",
            self.state.next_interruption_threshold
        );

        Ok(Cycle::Played {
            kind: TrackKind::Interruption,
            track,
        })
    }

    fn play_main(&mut self, pool: &[PathBuf]) -> Result<Cycle> {
        let Some(track) = selection::select_main(pool, &self.state.history, &mut self.rng).cloned()
        else {
            bail!("Track pool is empty");
        };

        info!("Main track: {}", display_name(&track));
        if !self.attempt(&track) {
            return Ok(Cycle::Failed {
                kind: TrackKind::Main,
                track,
            });
        }

        self.state.history.push(track.clone());
        self.state.main_track_counter += 1;

        Ok(Cycle::Played {
            kind: TrackKind::Main,
            track,
        })
    }

    /// Publish then stream `track`. Returns whether playback succeeded.
    fn attempt(&mut self, track: &Path) -> bool {
        if let Err(e) = self.publisher.publish(track) {
            error!("Failed to publish now playing: {e:#}");
        }

        match self.streamer.play(track) {
            Ok(()) => true,
            Err(e) => {
                error!("Playback failed: {e:#}");
                false
            }
        }
    }
}

fn display_name(track: &Path) -> String {
    track
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| track.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::ScheduleSlot;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::fs;
    use std::rc::Rc;
    use tempfile::TempDir;

    /// Streamer that succeeds unless a scripted failure is queued.
    #[derive(Default)]
    struct ScriptedStreamer {
        played: Vec<PathBuf>,
        failures: VecDeque<bool>,
    }

    impl Streamer for ScriptedStreamer {
        fn play(&mut self, track: &Path) -> Result<()> {
            self.played.push(track.to_path_buf());
            if self.failures.pop_front().unwrap_or(false) {
                bail!("scripted failure");
            }
            Ok(())
        }
    }

    #[derive(Default, Clone)]
    struct RecordingPublisher {
        published: Rc<RefCell<Vec<PathBuf>>>,
    }

    impl Publisher for RecordingPublisher {
        fn publish(&self, track: &Path) -> Result<()> {
            self.published.borrow_mut().push(track.to_path_buf());
            Ok(())
        }
    }

    struct FixedClock(NaiveTime);

    impl Clock for FixedClock {
        fn now(&self) -> NaiveTime {
            self.0
        }
    }

    struct Station {
        _dir: TempDir,
        settings: PlayoutSettings,
    }

    fn station(main_tracks: usize, interruptions: usize) -> Station {
        let dir = TempDir::new().unwrap();
        let songs = dir.path().join("songs");
        let calm = songs.join("Calm");
        let special = songs.join("Special");
        let jingles = songs.join("interruptions");
        for d in [&calm, &special, &jingles] {
            fs::create_dir_all(d).unwrap();
        }
        for i in 0..main_tracks {
            fs::write(calm.join(format!("calm{i}.mp3")), b"").unwrap();
        }
        fs::write(special.join("special.mp3"), b"").unwrap();
        for i in 0..interruptions {
            fs::write(jingles.join(format!("jingle{i}.ogg")), b"").unwrap();
        }

        let settings = PlayoutSettings {
            schedule: Schedule::new(vec![
                ScheduleSlot::parse("06:00-18:00", &["Calm", "Missing"]),
                ScheduleSlot::parse("19:50-20:10", &["Calm", "Special"]),
                ScheduleSlot::parse("22:00-23:00", &["Missing"]),
            ]),
            songs_dir: songs,
            interruptions_dir: jingles,
            override_mood: "Special".to_string(),
            history_size: 30,
            cadence: InterruptionCadence { min: 3, max: 3 },
            backoffs: Backoffs::default(),
        };

        Station {
            _dir: dir,
            settings,
        }
    }

    fn supervisor(
        settings: PlayoutSettings,
        time: (u32, u32),
    ) -> Supervisor<ScriptedStreamer, RecordingPublisher, FixedClock, StdRng> {
        Supervisor::new(
            settings,
            ScriptedStreamer::default(),
            RecordingPublisher::default(),
            FixedClock(NaiveTime::from_hms_opt(time.0, time.1, 0).unwrap()),
            StdRng::seed_from_u64(2024),
        )
    }

    fn kind(cycle: &Cycle) -> Option<TrackKind> {
        match cycle {
            Cycle::Played { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    #[test]
    fn test_interruption_after_threshold_then_counter_resets() -> Result<()> {
        let st = station(10, 2);
        let mut sup = supervisor(st.settings.clone(), (10, 0));
        sup.load_interruptions()?;
        assert_eq!(sup.state().next_interruption_threshold, 3);

        for expected in 1..=3 {
            assert_eq!(kind(&sup.cycle()?), Some(TrackKind::Main));
            assert_eq!(sup.state().main_track_counter, expected);
        }

        let cycle = sup.cycle()?;
        assert_eq!(kind(&cycle), Some(TrackKind::Interruption));
        assert_eq!(sup.state().main_track_counter, 0);
        assert_eq!(sup.state().next_interruption_threshold, 3);
        assert_eq!(sup.state().history.len(), 3);

        assert_eq!(kind(&sup.cycle()?), Some(TrackKind::Main));
        assert_eq!(sup.state().main_track_counter, 1);
        Ok(())
    }

    #[test]
    fn test_failed_main_play_leaves_state_untouched() -> Result<()> {
        let st = station(5, 1);
        let mut sup = supervisor(st.settings.clone(), (10, 0));
        sup.load_interruptions()?;
        sup.cycle()?;
        let before = sup.state().clone();

        sup.streamer.failures.push_back(true);
        let cycle = sup.cycle()?;
        assert!(matches!(cycle, Cycle::Failed { kind: TrackKind::Main, .. }));
        assert_eq!(sup.state().main_track_counter, before.main_track_counter);
        assert_eq!(
            sup.state().next_interruption_threshold,
            before.next_interruption_threshold
        );
        assert_eq!(
            sup.state().history.iter().collect::<Vec<_>>(),
            before.history.iter().collect::<Vec<_>>()
        );
        Ok(())
    }

    #[test]
    fn test_failed_interruption_is_retried() -> Result<()> {
        let st = station(5, 1);
        let mut sup = supervisor(st.settings.clone(), (10, 0));
        sup.load_interruptions()?;
        for _ in 0..3 {
            sup.cycle()?;
        }

        sup.streamer.failures.push_back(true);
        assert!(matches!(
            sup.cycle()?,
            Cycle::Failed { kind: TrackKind::Interruption, .. }
        ));
        assert_eq!(sup.state().main_track_counter, 3);
        assert_eq!(sup.state().history.len(), 3);

        assert_eq!(kind(&sup.cycle()?), Some(TrackKind::Interruption));
        assert_eq!(sup.state().main_track_counter, 0);
        Ok(())
    }

    #[test]
    fn test_publish_happens_before_play_even_on_failure() -> Result<()> {
        let st = station(2, 1);
        let mut sup = supervisor(st.settings.clone(), (10, 0));
        sup.load_interruptions()?;
        sup.streamer.failures.push_back(true);

        let Cycle::Failed { track, .. } = sup.cycle()? else {
            panic!("expected a failed cycle");
        };
        assert_eq!(*sup.publisher.published.borrow(), vec![track.clone()]);
        assert_eq!(sup.streamer().played, vec![track]);
        Ok(())
    }

    #[test]
    fn test_no_repeats_until_pool_is_exhausted() -> Result<()> {
        let mut st = station(6, 1);
        st.settings.cadence = InterruptionCadence { min: 100, max: 100 };
        let mut sup = supervisor(st.settings.clone(), (10, 0));
        sup.load_interruptions()?;

        let mut first_round = std::collections::HashSet::new();
        for _ in 0..6 {
            if let Cycle::Played { track, .. } = sup.cycle()? {
                assert!(first_round.insert(track), "repeat before pool was exhausted");
            }
        }
        assert_eq!(first_round.len(), 6);
        Ok(())
    }

    #[test]
    fn test_override_mood_narrows_pool() -> Result<()> {
        let st = station(5, 1);
        let mut sup = supervisor(st.settings.clone(), (20, 0));
        sup.load_interruptions()?;

        for _ in 0..2 {
            let Cycle::Played { track, .. } = sup.cycle()? else {
                panic!("expected playback");
            };
            assert_eq!(track.file_name().unwrap(), "special.mp3");
        }
        Ok(())
    }

    #[test]
    fn test_backoff_when_no_schedule() -> Result<()> {
        let st = station(3, 1);
        let mut sup = supervisor(st.settings.clone(), (3, 0));
        assert_eq!(sup.cycle()?, Cycle::Backoff(Duration::from_secs(60)));
        assert!(sup.streamer().played.is_empty());
        Ok(())
    }

    #[test]
    fn test_backoff_when_pool_empty() -> Result<()> {
        let st = station(3, 1);
        let mut sup = supervisor(st.settings.clone(), (22, 30));
        assert_eq!(sup.cycle()?, Cycle::Backoff(Duration::from_secs(30)));
        assert!(sup.streamer().played.is_empty());
        Ok(())
    }

    #[test]
    fn test_run_refuses_to_start_without_interruptions() {
        let st = station(3, 0);
        let mut sup = supervisor(st.settings.clone(), (10, 0));
        assert!(sup.run(&Shutdown::new()).is_err());
        assert!(sup.streamer().played.is_empty());
        assert!(sup.publisher.published.borrow().is_empty());
    }

    #[test]
    fn test_run_exits_when_shutdown_already_requested() -> Result<()> {
        let st = station(3, 1);
        let mut sup = supervisor(st.settings.clone(), (10, 0));
        let shutdown = Shutdown::new();
        shutdown.request();
        sup.run(&shutdown)?;
        assert!(sup.streamer().played.is_empty());
        Ok(())
    }

    #[test]
    fn test_zero_history_size_still_avoids_immediate_repeat() -> Result<()> {
        let st = station(2, 1);
        let mut settings = st.settings.clone();
        settings.history_size = 0;
        let mut sup = supervisor(settings, (10, 0));
        sup.load_interruptions()?;

        for _ in 0..3 {
            sup.cycle()?;
        }
        let played = &sup.streamer().played;
        assert_eq!(played.len(), 3);
        assert!(played.windows(2).all(|w| w[0] != w[1]));
        assert_eq!(sup.state().history.capacity(), 1);
        Ok(())
    }
}

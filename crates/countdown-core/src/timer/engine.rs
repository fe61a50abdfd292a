//! Countdown engine.
//!
//! A tick-driven state machine. It owns no thread or timer; the caller
//! invokes `tick()` once per second (see [`super::Ticker`]).
//!
//! Remaining time is split the way the picker shows it: whole hours, whole
//! minutes, and the milliseconds left in the current window. A window is the
//! stretch between two rollovers. The first window is seeded from the picked
//! seconds, every later one is a full minute.
//!
//! ## Tick cycle
//!
//! ```text
//! tick:  window > 0  -> report window, consume one second
//!        window == 0 -> rollover, then report the fresh window
//!
//! rollover: minutes > 0 -> minutes - 1
//!           hours > 0   -> hours - 1, minutes = 59
//!           otherwise   -> completed, idle
//! ```
//!
//! Time is counted in ticks and never re-derived from the wall clock, so a
//! late tick makes the countdown late by the same amount.
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = CountdownEngine::new();
//! engine.start(SelectedDuration::new(0, 0, 5));
//! // Once per second:
//! engine.tick(); // Returns Some(Event) on rollover or completion
//! ```

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::events::Event;
use crate::observable::Observable;
use crate::selection::SelectedDuration;

/// Length of one tick.
pub const TICK_MS: i64 = 1_000;
/// Length of every window after the first.
pub const WINDOW_MS: i64 = 60_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerState {
    Idle,
    Running,
}

/// Hours, minutes and window milliseconds as one value.
///
/// Published once a command or tick has finished, so it never shows a
/// half-applied rollover.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Remaining {
    pub hours: i64,
    pub minutes: i64,
    pub window_ms: i64,
}

impl Remaining {
    pub fn to_snapshot(self, state: TimerState) -> Event {
        Event::StateSnapshot {
            state,
            hours_left: self.hours,
            minutes_left: self.minutes,
            window_remaining_ms: self.window_ms,
            at: Utc::now(),
        }
    }
}

enum WindowEnd {
    RolledOver,
    Completed,
}

/// Core countdown state machine.
///
/// All remaining-time values are published through [`Observable`]s, each
/// starting at zero.
#[derive(Debug)]
pub struct CountdownEngine {
    state: TimerState,
    /// Bumped on every start and stop so a stale tick source can tell it was
    /// replaced.
    generation: u64,
    /// Milliseconds the next tick will report for the current window.
    window_ms: i64,
    hours: i64,
    minutes: i64,
    hours_left: Observable<i64>,
    minutes_left: Observable<i64>,
    window_remaining_ms: Observable<i64>,
    running: Observable<bool>,
    remaining: Observable<Remaining>,
}

impl Default for CountdownEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl CountdownEngine {
    pub fn new() -> Self {
        Self {
            state: TimerState::Idle,
            generation: 0,
            window_ms: 0,
            hours: 0,
            minutes: 0,
            hours_left: Observable::new(0),
            minutes_left: Observable::new(0),
            window_remaining_ms: Observable::new(0),
            running: Observable::new(false),
            remaining: Observable::default(),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == TimerState::Running
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn hours_left(&self) -> &Observable<i64> {
        &self.hours_left
    }

    pub fn minutes_left(&self) -> &Observable<i64> {
        &self.minutes_left
    }

    /// Milliseconds left in the current window, as last reported by a tick.
    pub fn window_remaining_ms(&self) -> &Observable<i64> {
        &self.window_remaining_ms
    }

    pub fn running(&self) -> &Observable<bool> {
        &self.running
    }

    pub fn remaining(&self) -> &Observable<Remaining> {
        &self.remaining
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self) -> Event {
        self.remaining.get().to_snapshot(self.state)
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Begin counting down `duration`, discarding any run in progress.
    ///
    /// A duration with zero seconds exhausts its first window right away, so
    /// the first rollover happens here rather than on a tick. A zero duration
    /// completes here and returns `TimerCompleted`.
    pub fn start(&mut self, duration: SelectedDuration) -> Option<Event> {
        if let Some(stopped) = self.stop() {
            tracing::debug!(?stopped, "restarting countdown");
        }
        self.generation += 1;
        self.state = TimerState::Running;
        self.running.set(true);
        self.hours = i64::from(duration.hours);
        self.minutes = i64::from(duration.minutes);
        self.publish_counts();
        self.window_ms = i64::from(duration.seconds) * TICK_MS;
        tracing::debug!(
            hours = duration.hours,
            minutes = duration.minutes,
            seconds = duration.seconds,
            total_secs = duration.total_secs(),
            "countdown started"
        );

        if self.window_ms == 0 {
            if let WindowEnd::Completed = self.end_window() {
                return Some(Event::TimerCompleted { at: Utc::now() });
            }
        }
        self.publish_remaining();
        Some(Event::TimerStarted {
            hours: duration.hours,
            minutes: duration.minutes,
            seconds: duration.seconds,
            at: Utc::now(),
        })
    }

    /// Cancel the run and zero every observable. Returns `None` when idle.
    pub fn stop(&mut self) -> Option<Event> {
        if self.state == TimerState::Idle {
            return None;
        }
        let event = Event::TimerStopped {
            hours_left: self.hours,
            minutes_left: self.minutes,
            window_remaining_ms: self.window_remaining_ms.get(),
            at: Utc::now(),
        };
        self.generation += 1;
        self.go_idle();
        tracing::debug!("countdown stopped");
        Some(event)
    }

    /// Advance by one tick.
    ///
    /// Returns `Some(WindowRolledOver)` or `Some(TimerCompleted)` when the tick
    /// ended a window, `None` for an ordinary tick or when idle.
    pub fn tick(&mut self) -> Option<Event> {
        if self.state != TimerState::Running {
            return None;
        }

        let mut event = None;
        if self.window_ms <= 0 {
            match self.end_window() {
                WindowEnd::Completed => return Some(Event::TimerCompleted { at: Utc::now() }),
                WindowEnd::RolledOver => {
                    event = Some(Event::WindowRolledOver {
                        hours_left: self.hours,
                        minutes_left: self.minutes,
                        window_ms: self.window_ms,
                        at: Utc::now(),
                    });
                }
            }
        }

        self.window_remaining_ms.set(self.window_ms);
        tracing::trace!(
            hours = self.hours,
            minutes = self.minutes,
            window_ms = self.window_ms,
            "tick"
        );
        self.window_ms = (self.window_ms - TICK_MS).max(0);
        self.publish_remaining();
        event
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn end_window(&mut self) -> WindowEnd {
        self.window_remaining_ms.set(0);
        if self.minutes > 0 {
            self.minutes -= 1;
        } else if self.hours > 0 {
            self.hours -= 1;
            self.minutes = 59;
        } else {
            self.go_idle();
            tracing::debug!("countdown completed");
            return WindowEnd::Completed;
        }
        self.publish_counts();
        self.window_ms = WINDOW_MS;
        tracing::debug!(hours = self.hours, minutes = self.minutes, "window rolled over");
        WindowEnd::RolledOver
    }

    fn go_idle(&mut self) {
        self.state = TimerState::Idle;
        self.window_ms = 0;
        self.hours = 0;
        self.minutes = 0;
        self.window_remaining_ms.set(0);
        self.publish_counts();
        self.publish_remaining();
        self.running.set(false);
    }

    fn publish_counts(&self) {
        self.minutes_left.set(self.minutes);
        self.hours_left.set(self.hours);
    }

    fn publish_remaining(&self) {
        self.remaining.set(Remaining {
            hours: self.hours_left.get(),
            minutes: self.minutes_left.get(),
            window_ms: self.window_remaining_ms.get(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn record(obs: &Observable<i64>) -> Arc<Mutex<Vec<i64>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        obs.subscribe(move |v| sink.lock().unwrap().push(*v));
        seen
    }

    /// Tick until completion; returns how many ticks came before the one that
    /// completed the countdown.
    fn run_to_completion(engine: &mut CountdownEngine) -> u64 {
        let mut ticks = 0;
        loop {
            match engine.tick() {
                Some(Event::TimerCompleted { .. }) => return ticks,
                _ => ticks += 1,
            }
            assert!(engine.is_running());
        }
    }

    fn counts(engine: &CountdownEngine) -> (i64, i64, i64) {
        (
            engine.hours_left().get(),
            engine.minutes_left().get(),
            engine.window_remaining_ms().get(),
        )
    }

    #[test]
    fn new_engine_is_idle_and_zeroed() {
        let engine = CountdownEngine::new();
        assert_eq!(engine.state(), TimerState::Idle);
        assert_eq!(counts(&engine), (0, 0, 0));
        assert!(!engine.running().get());
    }

    #[test]
    fn five_seconds_ticks_five_times_then_idles() {
        let mut engine = CountdownEngine::new();
        let window = record(engine.window_remaining_ms());

        let started = engine.start(SelectedDuration::new(0, 0, 5));
        assert!(matches!(started, Some(Event::TimerStarted { seconds: 5, .. })));
        assert_eq!(run_to_completion(&mut engine), 5);

        assert_eq!(engine.state(), TimerState::Idle);
        assert_eq!(counts(&engine), (0, 0, 0));
        assert_eq!(
            *window.lock().unwrap(),
            vec![0, 5000, 4000, 3000, 2000, 1000, 0]
        );
        assert_eq!(engine.tick(), None);
    }

    #[test]
    fn one_minute_rolls_over_at_start_and_stops_after_sixty_ticks() {
        let mut engine = CountdownEngine::new();
        let minutes = record(engine.minutes_left());

        engine.start(SelectedDuration::new(0, 1, 0));
        assert_eq!(engine.minutes_left().get(), 0);

        assert_eq!(engine.tick(), None);
        assert_eq!(engine.window_remaining_ms().get(), 60_000);

        assert_eq!(run_to_completion(&mut engine), 59);
        assert_eq!(*minutes.lock().unwrap(), vec![0, 1, 0]);
        assert_eq!(engine.state(), TimerState::Idle);
    }

    #[test]
    fn one_hour_borrows_fifty_nine_minutes() {
        let mut engine = CountdownEngine::new();
        let hours = record(engine.hours_left());

        engine.start(SelectedDuration::new(1, 0, 0));
        assert_eq!(engine.hours_left().get(), 0);
        assert_eq!(engine.minutes_left().get(), 59);
        assert_eq!(*hours.lock().unwrap(), vec![0, 1, 0]);

        // The current window plus 59 more full minutes.
        assert_eq!(run_to_completion(&mut engine), 60 * 60);
        assert_eq!(counts(&engine), (0, 0, 0));
    }

    #[test]
    fn rollover_tick_reports_fresh_window() {
        let mut engine = CountdownEngine::new();
        engine.start(SelectedDuration::new(0, 2, 1));

        assert_eq!(engine.tick(), None);
        assert_eq!(counts(&engine), (0, 2, 1000));

        match engine.tick() {
            Some(Event::WindowRolledOver {
                hours_left,
                minutes_left,
                window_ms,
                ..
            }) => {
                assert_eq!((hours_left, minutes_left, window_ms), (0, 1, 60_000));
            }
            other => panic!("Expected WindowRolledOver, got {other:?}"),
        }
        assert_eq!(counts(&engine), (0, 1, 60_000));
    }

    #[test]
    fn remaining_skips_the_middle_of_a_rollover() {
        let mut engine = CountdownEngine::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        engine
            .remaining()
            .subscribe(move |r| sink.lock().unwrap().push((r.hours, r.minutes, r.window_ms)));

        engine.start(SelectedDuration::new(0, 2, 1));
        engine.tick();
        engine.tick();

        // The individual observables pass through (0, 1, 0) on the second
        // tick; the combined value goes straight to the fresh window.
        assert_eq!(
            *seen.lock().unwrap(),
            vec![(0, 0, 0), (0, 2, 0), (0, 2, 1000), (0, 1, 60_000)]
        );
    }

    #[test]
    fn zero_duration_completes_inside_start() {
        let mut engine = CountdownEngine::new();
        let window = record(engine.window_remaining_ms());

        let event = engine.start(SelectedDuration::default());
        assert!(matches!(event, Some(Event::TimerCompleted { .. })));
        assert_eq!(engine.state(), TimerState::Idle);
        assert_eq!(engine.tick(), None);
        assert_eq!(*window.lock().unwrap(), vec![0]);
    }

    #[test]
    fn stop_while_running_zeroes_everything() {
        let mut engine = CountdownEngine::new();
        engine.start(SelectedDuration::new(2, 30, 10));
        engine.tick();
        engine.tick();
        assert_eq!(counts(&engine), (2, 30, 9000));

        match engine.stop() {
            Some(Event::TimerStopped {
                hours_left,
                minutes_left,
                window_remaining_ms,
                ..
            }) => assert_eq!((hours_left, minutes_left, window_remaining_ms), (2, 30, 9000)),
            other => panic!("Expected TimerStopped, got {other:?}"),
        }
        assert_eq!(counts(&engine), (0, 0, 0));
        assert!(!engine.running().get());
        assert_eq!(engine.tick(), None);
        assert_eq!(counts(&engine), (0, 0, 0));
    }

    #[test]
    fn stop_while_idle_changes_nothing() {
        let mut engine = CountdownEngine::new();
        let hours = record(engine.hours_left());
        let minutes = record(engine.minutes_left());
        let window = record(engine.window_remaining_ms());
        let generation = engine.generation();

        assert_eq!(engine.stop(), None);
        assert_eq!(engine.stop(), None);

        assert_eq!(*hours.lock().unwrap(), vec![0]);
        assert_eq!(*minutes.lock().unwrap(), vec![0]);
        assert_eq!(*window.lock().unwrap(), vec![0]);
        assert_eq!(engine.generation(), generation);
    }

    #[test]
    fn restart_uses_new_duration_not_remaining_time() {
        let mut engine = CountdownEngine::new();
        engine.start(SelectedDuration::new(0, 5, 30));
        for _ in 0..10 {
            engine.tick();
        }
        let first = engine.generation();

        engine.start(SelectedDuration::new(0, 0, 3));
        assert!(engine.generation() > first);
        assert_eq!(counts(&engine), (0, 0, 0));
        assert_eq!(run_to_completion(&mut engine), 3);
    }

    #[test]
    fn snapshot_returns_valid_event() {
        let mut engine = CountdownEngine::new();
        engine.start(SelectedDuration::new(1, 2, 3));
        engine.tick();
        match engine.snapshot() {
            Event::StateSnapshot {
                state,
                hours_left,
                minutes_left,
                window_remaining_ms,
                ..
            } => {
                assert_eq!(state, TimerState::Running);
                assert_eq!(hours_left, 1);
                assert_eq!(minutes_left, 2);
                assert_eq!(window_remaining_ms, 3000);
            }
            _ => panic!("Expected StateSnapshot"),
        }
    }

    mod props {
        use super::super::{CountdownEngine, WINDOW_MS};
        use super::{counts, run_to_completion};
        use crate::events::Event;
        use crate::selection::SelectedDuration;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(32))]

            #[test]
            fn ticks_until_completion_equal_total_seconds(
                hours in 0u32..2,
                minutes in 0u32..60,
                seconds in 0u32..60,
            ) {
                let duration = SelectedDuration::new(hours, minutes, seconds);
                let mut engine = CountdownEngine::new();
                if duration.total_secs() == 0 {
                    let completed = matches!(engine.start(duration), Some(Event::TimerCompleted { .. }));
                    prop_assert!(completed);
                } else {
                    engine.start(duration);
                    prop_assert_eq!(run_to_completion(&mut engine), duration.total_secs());
                }
                prop_assert_eq!(counts(&engine), (0, 0, 0));
            }

            #[test]
            fn counts_never_go_negative(
                minutes in 0u32..3,
                seconds in 0u32..60,
                ticks in 0usize..400,
            ) {
                let mut engine = CountdownEngine::new();
                engine.start(SelectedDuration::new(1, minutes, seconds));
                for _ in 0..ticks {
                    engine.tick();
                    let (h, m, w) = counts(&engine);
                    prop_assert!(h >= 0 && m >= 0 && (0..=WINDOW_MS).contains(&w));
                }
            }
        }
    }
}

//! The single-screen timer: picker selection plus a running countdown.
//!
//! The presentation layer reads the six observables and calls
//! [`TimerViewModel::set_time`], [`TimerViewModel::start_timer`] and
//! [`TimerViewModel::stop_timer`]. Nothing else.
//!
//! Every query reads published values and never waits on the running
//! countdown, so observer callbacks may call them.

use tokio::sync::broadcast;

use crate::display::TimeLeft;
use crate::error::Result;
use crate::events::Event;
use crate::observable::Observable;
use crate::selection::{SelectedDuration, Selection, TimeUnit};
use crate::storage::Config;
use crate::timer::{Remaining, Ticker};

#[derive(Debug)]
pub struct TimerViewModel {
    selection: Selection,
    ticker: Ticker,
}

impl TimerViewModel {
    /// Pickers start on the configured default duration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured default duration is out of range.
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            selection: Selection::new(config.default_duration()?),
            ticker: Ticker::new(config.tick_interval()),
        })
    }

    pub fn set_time(&self, unit: TimeUnit, value: u32) {
        self.selection.set_time(unit, value);
    }

    /// Count down the currently selected duration, replacing any run in
    /// progress.
    pub fn start_timer(&self) -> Option<Event> {
        let duration = self.selection.duration();
        self.ticker.start(duration)
    }

    pub fn stop_timer(&self) -> Option<Event> {
        self.ticker.stop()
    }

    // ── Observables ──────────────────────────────────────────────────

    pub fn selected(&self, unit: TimeUnit) -> &Observable<u32> {
        self.selection.observable(unit)
    }

    pub fn selected_duration(&self) -> SelectedDuration {
        self.selection.duration()
    }

    pub fn hours_left(&self) -> Observable<i64> {
        self.ticker.hours_left()
    }

    pub fn minutes_left(&self) -> Observable<i64> {
        self.ticker.minutes_left()
    }

    pub fn window_remaining_ms(&self) -> Observable<i64> {
        self.ticker.window_remaining_ms()
    }

    pub fn running(&self) -> Observable<bool> {
        self.ticker.running()
    }

    /// The three remaining quantities together, published once per tick.
    pub fn remaining(&self) -> Observable<Remaining> {
        self.ticker.remaining()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<Event> {
        self.ticker.subscribe_events()
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn is_running(&self) -> bool {
        self.ticker.is_running()
    }

    pub fn snapshot(&self) -> Event {
        self.ticker.snapshot()
    }

    /// Read in one step, so a rollover never shows up half-applied.
    pub fn time_left(&self) -> TimeLeft {
        TimeLeft::from(self.ticker.remaining().get())
    }

    /// Resolves once the countdown is no longer running.
    pub async fn finished(&self) {
        self.ticker.finished().await;
    }
}

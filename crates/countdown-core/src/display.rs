//! Formatting of the "time left" readout.

use std::fmt;

use serde::Serialize;

use crate::events::Event;
use crate::storage::DisplayFormat;
use crate::timer::Remaining;

/// Remaining time as shown to the user.
///
/// Seconds are the whole seconds of the current window, so a fresh window
/// reads as `60`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TimeLeft {
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
}

impl TimeLeft {
    pub fn new(hours_left: i64, minutes_left: i64, window_remaining_ms: i64) -> Self {
        Self {
            hours: hours_left,
            minutes: minutes_left,
            seconds: window_remaining_ms / 1000,
        }
    }

    /// `None` unless `event` is a `StateSnapshot`.
    pub fn from_snapshot(event: &Event) -> Option<Self> {
        match event {
            Event::StateSnapshot {
                hours_left,
                minutes_left,
                window_remaining_ms,
                ..
            } => Some(Self::new(*hours_left, *minutes_left, *window_remaining_ms)),
            _ => None,
        }
    }

    pub fn format_clock(&self) -> String {
        format!("{:02}:{:02}:{:02}", self.hours, self.minutes, self.seconds)
    }

    pub fn format_units(&self) -> String {
        format!(
            "HOURS {}  MINUTES {}  SECONDS {}",
            self.hours, self.minutes, self.seconds
        )
    }

    pub fn format(&self, format: DisplayFormat) -> String {
        match format {
            DisplayFormat::Clock => self.format_clock(),
            DisplayFormat::Units => self.format_units(),
        }
    }
}

impl From<Remaining> for TimeLeft {
    fn from(remaining: Remaining) -> Self {
        Self::new(remaining.hours, remaining.minutes, remaining.window_ms)
    }
}

impl fmt::Display for TimeLeft {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format_clock())
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::TimerState;

/// Every command and every rollover of the countdown produces an Event.
/// The CLI prints them in `--json` mode; the ticker broadcasts them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    TimerStarted {
        hours: u32,
        minutes: u32,
        seconds: u32,
        at: DateTime<Utc>,
    },
    /// A window ran out and a minute (or an hour) was borrowed for a new one.
    WindowRolledOver {
        hours_left: i64,
        minutes_left: i64,
        window_ms: i64,
        at: DateTime<Utc>,
    },
    /// Countdown reached zero on its own.
    TimerCompleted {
        at: DateTime<Utc>,
    },
    /// Countdown was cancelled; carries what was left at that moment.
    TimerStopped {
        hours_left: i64,
        minutes_left: i64,
        window_remaining_ms: i64,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        state: TimerState,
        hours_left: i64,
        minutes_left: i64,
        window_remaining_ms: i64,
        at: DateTime<Utc>,
    },
}

impl Event {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Event::TimerCompleted { .. } | Event::TimerStopped { .. })
    }
}

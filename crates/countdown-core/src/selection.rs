//! Picker selection state.
//!
//! Holds the hours/minutes/seconds the user picked. Each unit is an
//! independent [`Observable`] so the picker can highlight its current entry;
//! [`Selection::duration`] reads them back as one [`SelectedDuration`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::observable::Observable;

pub const HOURS_IN_A_DAY: u32 = 24;
pub const MINUTES_IN_AN_HOUR: u32 = 60;
pub const SECONDS_IN_A_MINUTE: u32 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeUnit {
    Hours,
    Minutes,
    Seconds,
}

impl TimeUnit {
    /// Number of entries in this unit's picker; valid values are `0..max`.
    pub fn max(self) -> u32 {
        match self {
            TimeUnit::Hours => HOURS_IN_A_DAY,
            TimeUnit::Minutes => MINUTES_IN_AN_HOUR,
            TimeUnit::Seconds => SECONDS_IN_A_MINUTE,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TimeUnit::Hours => "HOURS",
            TimeUnit::Minutes => "MINUTES",
            TimeUnit::Seconds => "SECONDS",
        }
    }

    pub fn validate(self, value: i64) -> Result<u32, ValidationError> {
        match u32::try_from(value) {
            Ok(v) if v < self.max() => Ok(v),
            _ => Err(ValidationError::OutOfRange {
                unit: self.label().to_string(),
                value,
                max: self.max(),
            }),
        }
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for TimeUnit {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "h" | "hour" | "hours" => Ok(TimeUnit::Hours),
            "m" | "min" | "minute" | "minutes" => Ok(TimeUnit::Minutes),
            "s" | "sec" | "second" | "seconds" => Ok(TimeUnit::Seconds),
            _ => Err(ValidationError::UnknownUnit(s.to_string())),
        }
    }
}

/// A picked duration: `hours < 24`, `minutes < 60`, `seconds < 60`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedDuration {
    pub hours: u32,
    pub minutes: u32,
    pub seconds: u32,
}

impl SelectedDuration {
    pub fn new(hours: u32, minutes: u32, seconds: u32) -> Self {
        Self {
            hours,
            minutes,
            seconds,
        }
    }

    /// Checked constructor for values that did not come from a picker.
    pub fn try_new(hours: i64, minutes: i64, seconds: i64) -> Result<Self, ValidationError> {
        Ok(Self {
            hours: TimeUnit::Hours.validate(hours)?,
            minutes: TimeUnit::Minutes.validate(minutes)?,
            seconds: TimeUnit::Seconds.validate(seconds)?,
        })
    }

    pub fn total_secs(&self) -> u64 {
        u64::from(self.hours) * 3600 + u64::from(self.minutes) * 60 + u64::from(self.seconds)
    }
}

/// Observable picker state, one value per unit.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    hours: Observable<u32>,
    minutes: Observable<u32>,
    seconds: Observable<u32>,
}

impl Selection {
    pub fn new(initial: SelectedDuration) -> Self {
        Self {
            hours: Observable::new(initial.hours),
            minutes: Observable::new(initial.minutes),
            seconds: Observable::new(initial.seconds),
        }
    }

    /// Store `value` for `unit`.
    ///
    /// The picker only offers `0..unit.max()`; anything else is a caller bug.
    pub fn set_time(&self, unit: TimeUnit, value: u32) {
        debug_assert!(value < unit.max(), "{unit} value {value} out of range");
        tracing::trace!(%unit, value, "selection changed");
        self.observable(unit).set(value);
    }

    pub fn observable(&self, unit: TimeUnit) -> &Observable<u32> {
        match unit {
            TimeUnit::Hours => &self.hours,
            TimeUnit::Minutes => &self.minutes,
            TimeUnit::Seconds => &self.seconds,
        }
    }

    pub fn duration(&self) -> SelectedDuration {
        SelectedDuration {
            hours: self.hours.get(),
            minutes: self.minutes.get(),
            seconds: self.seconds.get(),
        }
    }
}

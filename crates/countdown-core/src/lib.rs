//! # Countdown Core Library
//!
//! Business logic for a single-screen countdown timer: the user picks hours,
//! minutes and seconds, starts the countdown, and watches it tick to zero.
//! The CLI binary is a thin presentation layer over this crate.
//!
//! ## Architecture
//!
//! - **Selection**: observable picker values, one per time unit
//! - **Countdown Engine**: tick-driven state machine with minute/hour rollover
//! - **Ticker**: the tokio task that ticks the engine once per interval
//! - **Storage**: TOML-based configuration
//!
//! ## Key Components
//!
//! - [`TimerViewModel`]: what the presentation layer talks to
//! - [`CountdownEngine`]: core countdown state machine
//! - [`Observable`]: subscribe-and-get-current-value store
//! - [`Config`]: application configuration management

pub mod display;
pub mod error;
pub mod events;
pub mod observable;
pub mod selection;
pub mod storage;
pub mod timer;
pub mod view_model;

pub use display::TimeLeft;
pub use error::{ConfigError, CoreError, ValidationError};
pub use events::Event;
pub use observable::{Observable, SubscriptionId};
pub use selection::{SelectedDuration, Selection, TimeUnit};
pub use storage::{Config, DisplayFormat};
pub use timer::{CountdownEngine, Remaining, Ticker, TimerState};
pub use view_model::TimerViewModel;

mod engine;
mod ticker;

pub use engine::{CountdownEngine, Remaining, TimerState, TICK_MS, WINDOW_MS};
pub use ticker::Ticker;

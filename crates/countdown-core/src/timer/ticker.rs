//! Repeating tick source for the [`CountdownEngine`].
//!
//! One tokio task per run, driven by `tokio::time::interval`. The first tick
//! fires immediately, so the first window is reported as soon as the run
//! starts. Starting a new run aborts the previous task before the engine is
//! restarted; the engine's generation counter catches a tick that was already
//! past its last await when the abort landed.
//!
//! Observers are notified from inside `engine.tick()`, while the tick task
//! holds the engine lock. Every query on [`Ticker`] reads the published
//! observables instead of the engine, so observers may call them. Issuing
//! `start` or `stop` from an observer is not supported.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use super::engine::{CountdownEngine, Remaining, TimerState};
use crate::events::Event;
use crate::observable::Observable;
use crate::selection::SelectedDuration;

const EVENT_CAPACITY: usize = 64;

/// Drives a shared [`CountdownEngine`] once per `tick_interval`.
///
/// Must be used from within a tokio runtime.
#[derive(Debug)]
pub struct Ticker {
    engine: Arc<Mutex<CountdownEngine>>,
    task: Mutex<Option<JoinHandle<()>>>,
    tick_interval: Duration,
    events: broadcast::Sender<Event>,
    hours_left: Observable<i64>,
    minutes_left: Observable<i64>,
    window_remaining_ms: Observable<i64>,
    running: Observable<bool>,
    remaining: Observable<Remaining>,
}

impl Ticker {
    pub fn new(tick_interval: Duration) -> Self {
        let engine = CountdownEngine::new();
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            hours_left: engine.hours_left().clone(),
            minutes_left: engine.minutes_left().clone(),
            window_remaining_ms: engine.window_remaining_ms().clone(),
            running: engine.running().clone(),
            remaining: engine.remaining().clone(),
            engine: Arc::new(Mutex::new(engine)),
            task: Mutex::new(None),
            tick_interval,
            events,
        }
    }

    /// Receive every event produced from now on.
    pub fn subscribe_events(&self) -> broadcast::Receiver<Event> {
        self.events.subscribe()
    }

    pub fn hours_left(&self) -> Observable<i64> {
        self.hours_left.clone()
    }

    pub fn minutes_left(&self) -> Observable<i64> {
        self.minutes_left.clone()
    }

    pub fn window_remaining_ms(&self) -> Observable<i64> {
        self.window_remaining_ms.clone()
    }

    pub fn running(&self) -> Observable<bool> {
        self.running.clone()
    }

    /// Hours, minutes and window as of the last finished tick or command.
    pub fn remaining(&self) -> Observable<Remaining> {
        self.remaining.clone()
    }

    pub fn is_running(&self) -> bool {
        self.running.get()
    }

    pub fn snapshot(&self) -> Event {
        let state = if self.is_running() {
            TimerState::Running
        } else {
            TimerState::Idle
        };
        self.remaining.get().to_snapshot(state)
    }

    /// Cancel any run in progress and start counting down `duration`.
    pub fn start(&self, duration: SelectedDuration) -> Option<Event> {
        let mut task = self.task();
        abort(&mut task);

        let (event, generation, running) = {
            let mut engine = self.engine();
            let event = engine.start(duration);
            (event, engine.generation(), engine.is_running())
        };
        if let Some(ref e) = event {
            let _ = self.events.send(e.clone());
        }
        if running {
            *task = Some(self.spawn_ticks(generation));
        }
        event
    }

    /// Cancel the run in progress. Does nothing when idle.
    pub fn stop(&self) -> Option<Event> {
        let mut task = self.task();
        abort(&mut task);
        let event = self.engine().stop();
        if let Some(ref e) = event {
            let _ = self.events.send(e.clone());
        }
        event
    }

    /// Resolves once no run is in progress.
    pub async fn finished(&self) {
        let mut running = self.running.watch();
        let _ = running.wait_for(|running| !running).await;
    }

    fn spawn_ticks(&self, generation: u64) -> JoinHandle<()> {
        let engine = Arc::clone(&self.engine);
        let events = self.events.clone();
        let period = self.tick_interval;

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            loop {
                interval.tick().await;
                let (event, running) = {
                    let mut engine = engine.lock().unwrap_or_else(PoisonError::into_inner);
                    if engine.generation() != generation {
                        break;
                    }
                    let event = engine.tick();
                    (event, engine.is_running())
                };
                if let Some(event) = event {
                    let _ = events.send(event);
                }
                if !running {
                    break;
                }
            }
            tracing::trace!(generation, "tick task finished");
        })
    }

    fn task(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.task.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn engine(&self) -> MutexGuard<'_, CountdownEngine> {
        self.engine.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn abort(task: &mut Option<JoinHandle<()>>) {
    if let Some(task) = task.take() {
        task.abort();
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        abort(self.task.get_mut().unwrap_or_else(PoisonError::into_inner));
    }
}

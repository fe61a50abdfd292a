use clap::Args;
use countdown_core::{Config, DisplayFormat, Event, TimeLeft, TimeUnit, TimerViewModel};
use tokio::sync::broadcast::error::RecvError;

#[derive(Args)]
pub struct RunArgs {
    /// Hours to count down (0-23)
    #[arg(long, value_parser = clap::value_parser!(u32).range(0..24))]
    pub hours: Option<u32>,
    /// Minutes to count down (0-59)
    #[arg(long, value_parser = clap::value_parser!(u32).range(0..60))]
    pub minutes: Option<u32>,
    /// Seconds to count down (0-59)
    #[arg(long, value_parser = clap::value_parser!(u32).range(0..60))]
    pub seconds: Option<u32>,
    /// Print events and snapshots as JSON lines
    #[arg(long)]
    pub json: bool,
}

/// Count down in the foreground, one line per change. Ctrl-C stops the timer.
pub async fn run(args: RunArgs, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let vm = TimerViewModel::new(config)?;
    for (unit, value) in [
        (TimeUnit::Hours, args.hours),
        (TimeUnit::Minutes, args.minutes),
        (TimeUnit::Seconds, args.seconds),
    ] {
        if let Some(value) = value {
            vm.set_time(unit, value);
        }
    }

    let printer = Printer {
        json: args.json,
        format: config.display.format,
    };
    let mut remaining = vm.remaining().watch();
    // Only changes made by this run are printed.
    remaining.borrow_and_update();
    let mut running = vm.running().watch();
    let mut events = vm.subscribe_events();

    tracing::debug!(duration = ?vm.selected_duration(), "running countdown");
    if let Some(event) = vm.start_timer() {
        printer.event(&event)?;
    }
    // The start event was printed above; skip its broadcast copy.
    let _ = events.try_recv();

    loop {
        tokio::select! {
            changed = remaining.changed() => {
                if changed.is_err() {
                    break;
                }
                remaining.borrow_and_update();
                printer.time_left(&vm)?;
            }
            event = events.recv() => match event {
                Ok(event) => {
                    printer.event(&event)?;
                    if event.is_terminal() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "event output fell behind");
                }
                Err(RecvError::Closed) => break,
            },
            _ = running.wait_for(|running| !running) => break,
            _ = tokio::signal::ctrl_c() => {
                if let Some(event) = vm.stop_timer() {
                    printer.event(&event)?;
                }
                break;
            }
        }
    }

    while let Ok(event) = events.try_recv() {
        printer.event(&event)?;
    }
    printer.time_left(&vm)?;
    Ok(())
}

struct Printer {
    json: bool,
    format: DisplayFormat,
}

impl Printer {
    fn time_left(&self, vm: &TimerViewModel) -> Result<(), Box<dyn std::error::Error>> {
        let snapshot = vm.snapshot();
        if self.json {
            println!("{}", serde_json::to_string(&snapshot)?);
        } else {
            let time_left = TimeLeft::from_snapshot(&snapshot).unwrap_or_default();
            println!("{}", time_left.format(self.format));
        }
        Ok(())
    }

    fn event(&self, event: &Event) -> Result<(), Box<dyn std::error::Error>> {
        if self.json {
            println!("{}", serde_json::to_string(event)?);
        } else {
            match event {
                Event::TimerCompleted { .. } => println!("time's up"),
                Event::TimerStopped { .. } => println!("stopped"),
                _ => {}
            }
        }
        Ok(())
    }
}

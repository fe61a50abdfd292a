//! Line-driven picker session.
//!
//! Reads one command per line from stdin:
//!
//! ```text
//! set <hours|minutes|seconds> <value>
//! start
//! stop
//! status
//! quit
//! ```
//!
//! End of input behaves like `quit`.

use countdown_core::{Config, DisplayFormat, TimeUnit, TimerViewModel};
use tokio::io::{AsyncBufReadExt, BufReader};

enum Command {
    Set(TimeUnit, u32),
    Start,
    Stop,
    Status,
    Quit,
}

fn parse(line: &str) -> Result<Option<Command>, String> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(None);
    };
    let command = match verb {
        "set" => {
            let unit: TimeUnit = words
                .next()
                .ok_or("usage: set <unit> <value>")?
                .parse()
                .map_err(|e| format!("{e}"))?;
            let raw = words.next().ok_or("usage: set <unit> <value>")?;
            let value: i64 = raw
                .parse()
                .map_err(|_| format!("'{raw}' is not a number"))?;
            Command::Set(unit, unit.validate(value).map_err(|e| e.to_string())?)
        }
        "start" => Command::Start,
        "stop" => Command::Stop,
        "status" => Command::Status,
        "quit" | "exit" => Command::Quit,
        other => return Err(format!("unknown command: {other}")),
    };
    if words.next().is_some() {
        return Err(format!("unexpected arguments after '{verb}'"));
    }
    Ok(Some(command))
}

pub async fn run(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let vm = TimerViewModel::new(config)?;
    let format = config.display.format;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let command = match parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(message) => {
                eprintln!("error: {message}");
                continue;
            }
        };
        match command {
            Command::Set(unit, value) => {
                vm.set_time(unit, value);
                println!("selected {}", selected(&vm));
            }
            Command::Start => {
                vm.start_timer();
                println!("started {}", selected(&vm));
            }
            Command::Stop => {
                vm.stop_timer();
                println!("stopped");
            }
            Command::Status => status(&vm, format),
            Command::Quit => break,
        }
    }

    vm.stop_timer();
    Ok(())
}

fn selected(vm: &TimerViewModel) -> String {
    let d = vm.selected_duration();
    format!("{:02}:{:02}:{:02}", d.hours, d.minutes, d.seconds)
}

fn status(vm: &TimerViewModel, format: DisplayFormat) {
    let state = if vm.is_running() { "running" } else { "idle" };
    println!("{state} {}", vm.time_left().format(format));
}

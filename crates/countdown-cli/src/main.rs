use clap::{Parser, Subcommand};
use countdown_core::Config;

/// Used when `COUNTDOWN_LOG` is unset and the config could not be read.
const DEFAULT_LOG_LEVEL: &str = "warn";
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "countdown-cli", version, about = "Countdown timer CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Count down a duration in the foreground
    Run(commands::run::RunArgs),
    /// Drive the timer with commands read from stdin
    Interactive,
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

/// Log to stderr. `COUNTDOWN_LOG` wins over the configured level.
fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_env("COUNTDOWN_LOG")
        .unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    // The config subcommands load on their own so `config reset` can repair
    // a broken file; the timer commands refuse to start without a valid one.
    let config = Config::load();
    init_tracing(
        config
            .as_ref()
            .map_or(DEFAULT_LOG_LEVEL, |config| config.logging.level.as_str()),
    );

    let result = match cli.command {
        Commands::Run(args) => match config {
            Ok(config) => commands::run::run(args, &config).await,
            Err(e) => Err(e.into()),
        },
        Commands::Interactive => match config {
            Ok(config) => commands::interactive::run(&config).await,
            Err(e) => Err(e.into()),
        },
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

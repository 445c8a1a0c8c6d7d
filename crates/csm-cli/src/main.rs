//! # csm CLI entry point
//!
//! Parses command-line arguments, configures logging, and dispatches to
//! subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use csm_cli::score::{run_score, ScoreArgs};
use csm_cli::screen::{run_screen, ScreenArgs};
use csm_cli::stats::{run_stats, StatsArgs};

/// Crypto sanctions monitor.
///
/// Screens cryptocurrency addresses and transactions against a sanctions
/// watchlist and reports risk scores and alerts.
#[derive(Parser, Debug)]
#[command(name = "csm", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to the engine configuration file (YAML).
    #[arg(long, global = true, env = "CSM_CONFIG")]
    config: Option<PathBuf>,

    /// Log output format.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Pretty,
    Json,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print watchlist statistics.
    Stats(StatsArgs),

    /// Screen a single address against the watchlist.
    Screen(ScreenArgs),

    /// Score transactions and raise alerts.
    Score(ScoreArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize tracing based on verbosity level.
    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    // Logs go to stderr; stdout carries command output.
    match cli.log_format {
        LogFormat::Pretty => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init(),
    }

    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "csm starting");

    let config = cli.config.as_deref();
    let result = match cli.command {
        Commands::Stats(args) => run_stats(&args, config),
        Commands::Screen(args) => run_screen(&args, config),
        Commands::Score(args) => run_score(&args, config),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(2)
        }
    }
}

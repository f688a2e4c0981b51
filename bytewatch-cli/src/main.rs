// Lint configuration for this crate
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! ByteWatch CLI - browser data-usage accounting from the command line.
//!
//! # Examples
//!
//! ```bash
//! # Show today's, this week's and this month's usage
//! bytewatch
//!
//! # Account a recorded observation feed, then exit
//! bytewatch ingest requests.jsonl
//!
//! # Live monitor reading the feed from stdin
//! host-bridge | bytewatch run
//!
//! # Follow usage written by another process
//! bytewatch watch
//!
//! # Set the daily limit to 750 MB
//! bytewatch limits set daily 750
//!
//! # JSON output
//! bytewatch history --format json --pretty
//! ```

mod commands;
mod context;
mod output;

use std::path::PathBuf;

use anyhow::Result;
use bytewatch_store::LogLevel;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use commands::{config, history, ingest, limits, ping, reset, run, usage, watch};

// ============================================================================
// CLI Definition
// ============================================================================

/// ByteWatch CLI - browser data-usage accounting.
#[derive(Parser)]
#[command(name = "bytewatch")]
#[command(about = "Browser data-usage accounting CLI")]
#[command(long_about = r#"
ByteWatch estimates how much data the browser transfers and keeps daily,
weekly and monthly totals against configurable limits.

Observations arrive as one JSON object per line:
  {"kind":"completed","url":"https://a.test/","type":"image",
   "responseHeaders":[{"name":"Content-Length","value":"512"}]}

Examples:
  bytewatch                          # Current usage
  bytewatch run --input feed.jsonl   # Live monitor
  bytewatch limits set weekly 4000   # Change a limit
  bytewatch history --limit 30       # Archived days
  bytewatch --format json            # JSON output
"#)]
#[command(version)]
#[command(author = "ByteWatch Contributors")]
pub struct Cli {
    /// Subcommand to run. If none, runs 'usage' by default.
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Output format (text or json).
    #[arg(long, short = 'f', default_value = "text", global = true)]
    pub format: OutputFormat,

    /// Pretty-print JSON output.
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Verbose output (show debug info).
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Disable colored output.
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Quiet mode (minimal output).
    #[arg(long, short, global = true)]
    pub quiet: bool,

    /// Usage record file (defaults to the platform data dir).
    #[arg(long, global = true, value_name = "FILE")]
    pub data_file: Option<PathBuf>,

    /// Settings file (defaults to the platform config dir).
    #[arg(long, global = true, value_name = "FILE")]
    pub settings_file: Option<PathBuf>,
}

/// CLI commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Show current usage (default if no command specified).
    #[command(visible_alias = "u")]
    Usage,

    /// Run the monitor on a feed and show a live view.
    #[command(visible_alias = "r")]
    Run(run::RunArgs),

    /// Account a feed without a view, then exit.
    #[command(visible_alias = "i")]
    Ingest(ingest::IngestArgs),

    /// Follow the usage record written by a running monitor.
    #[command(visible_alias = "w")]
    Watch(watch::WatchArgs),

    /// Show or change usage limits.
    #[command(visible_alias = "l")]
    Limits(limits::LimitsArgs),

    /// Zero all counters. History is kept.
    Reset(reset::ResetArgs),

    /// Show archived daily totals, most recent first.
    History(history::HistoryArgs),

    /// Manage configuration.
    Config(config::ConfigArgs),

    /// Check that a monitor answers on the message bus.
    Ping,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable text with colors.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
}

/// CLI exit codes.
#[repr(i32)]
pub enum ExitCode {
    /// Success.
    Success = 0,
    /// General error.
    Error = 1,
    /// Rejected user input.
    InvalidInput = 2,
    /// Usage record could not be read or written.
    StoreUnavailable = 3,
}

impl ExitCode {
    /// Picks the exit code for a failed command.
    fn for_error(error: &anyhow::Error) -> Self {
        if error.downcast_ref::<bytewatch_core::CoreError>().is_some() {
            ExitCode::InvalidInput
        } else if error.downcast_ref::<bytewatch_store::StoreError>().is_some() {
            ExitCode::StoreUnavailable
        } else {
            ExitCode::Error
        }
    }
}

// ============================================================================
// Logging Setup
// ============================================================================

fn setup_logging(verbose: bool, quiet: bool, level: LogLevel) {
    if quiet {
        return; // No logging in quiet mode
    }

    let filter = if verbose {
        EnvFilter::new("bytewatch=debug,info")
    } else {
        EnvFilter::new(format!("bytewatch={level}"))
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings = context::load_settings(&cli).await;
    setup_logging(cli.verbose, cli.quiet, settings.get().await.log_level);

    let result = match &cli.command {
        Some(Commands::Usage) | None => usage::run(&cli, &settings).await,
        Some(Commands::Run(args)) => run::run(args, &cli, &settings).await,
        Some(Commands::Ingest(args)) => ingest::run(args, &cli, &settings).await,
        Some(Commands::Watch(args)) => watch::run(args, &cli, &settings).await,
        Some(Commands::Limits(args)) => limits::run(args, &cli, &settings).await,
        Some(Commands::Reset(args)) => reset::run(args, &cli, &settings).await,
        Some(Commands::History(args)) => history::run(args, &cli, &settings).await,
        Some(Commands::Config(args)) => config::run(args, &cli, &settings).await,
        Some(Commands::Ping) => ping::run(&cli, &settings).await,
    };

    if let Err(e) = result {
        if !cli.quiet {
            eprintln!("Error: {e:#}");
        }
        std::process::exit(ExitCode::for_error(&e) as i32);
    }

    std::process::exit(ExitCode::Success as i32);
}

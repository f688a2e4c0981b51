//! Watch command - follow the usage record written by another process.

use std::io::{Write, stdout};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use bytewatch_monitor::{UsageView, ViewDriver};
use bytewatch_store::SettingsStore;
use clap::Args;
use tracing::{info, warn};

use crate::output::{JsonFormatter, TextFormatter};
use crate::{Cli, OutputFormat, context};

/// Arguments for watch command.
#[derive(Args)]
pub struct WatchArgs {
    /// Refresh interval in seconds (defaults to the configured poll interval).
    #[arg(long, short)]
    pub interval: Option<u64>,
}

/// Runs the watch command.
pub async fn run(args: &WatchArgs, cli: &Cli, settings: &Arc<SettingsStore>) -> Result<()> {
    let poll_interval = match args.interval {
        Some(secs) => Duration::from_secs(secs.max(1)),
        None => settings.poll_interval().await,
    };

    info!(interval = poll_interval.as_secs(), "Starting watch mode");

    let driver = ViewDriver::new(context::backend(cli), settings.limits().await, poll_interval)
        .with_settings(Arc::clone(settings));

    let mut renderer = Renderer::new(cli, poll_interval);
    driver
        .run(|view| renderer.render(view), shutdown_signal())
        .await;

    Ok(())
}

/// Resolves on Ctrl+C.
pub(crate) async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Cannot listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
}

/// Draws views for watch-style commands.
pub(crate) struct Renderer {
    format: OutputFormat,
    text: TextFormatter,
    json: JsonFormatter,
    refresh_secs: u64,
}

impl Renderer {
    pub(crate) fn new(cli: &Cli, refresh: Duration) -> Self {
        Self {
            format: cli.format,
            text: TextFormatter::new(!cli.no_color),
            // One object per line while streaming.
            json: JsonFormatter::new(false),
            refresh_secs: refresh.as_secs(),
        }
    }

    pub(crate) fn render(&mut self, view: &UsageView) {
        match self.format {
            OutputFormat::Text => {
                // Clear screen
                print!("\x1b[2J\x1b[H");

                let now = chrono::Local::now();
                println!(
                    "ByteWatch Watch Mode - {} (refresh: {}s)",
                    now.format("%H:%M:%S"),
                    self.refresh_secs
                );
                println!("{}", "─".repeat(50));
                println!();
                println!("{}", self.text.format_view(view));
                println!();
                println!("Press Ctrl+C to exit");
            }
            OutputFormat::Json => match self.json.format_view(view) {
                Ok(line) => println!("{line}"),
                Err(e) => warn!(error = %e, "Cannot encode view"),
            },
        }
        let _ = stdout().flush();
    }
}

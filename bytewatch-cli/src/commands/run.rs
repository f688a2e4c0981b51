//! Run command - live monitor with a view.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use bytewatch_monitor::{ViewDriver, pump};
use bytewatch_store::SettingsStore;
use clap::Args;
use tokio::sync::oneshot;
use tracing::{info, warn};

use super::ingest::open_input;
use super::watch::{Renderer, shutdown_signal};
use crate::output::TextFormatter;
use crate::{Cli, OutputFormat, context};

/// Arguments for run command.
#[derive(Args)]
pub struct RunArgs {
    /// Feed file, one JSON event per line. Reads stdin when omitted.
    #[arg(long, short)]
    pub input: Option<PathBuf>,

    /// Stop once the feed ends instead of waiting for Ctrl+C.
    #[arg(long)]
    pub exit_on_eof: bool,
}

/// Runs the run command.
pub async fn run(args: &RunArgs, cli: &Cli, settings: &Arc<SettingsStore>) -> Result<()> {
    let input = open_input(args.input.as_deref()).await?;
    let (handle, task) = context::spawn_monitor(cli, settings).await;
    let poll_interval = settings.poll_interval().await;

    let (done_tx, done_rx) = oneshot::channel();
    let feed_handle = handle.clone();
    let feed = tokio::spawn(async move {
        let result = pump(input, &feed_handle).await;
        let _ = done_tx.send(());
        result
    });

    let driver = ViewDriver::new(context::backend(cli), settings.limits().await, poll_interval)
        .with_updates(handle.subscribe())
        .with_settings(Arc::clone(settings));

    let exit_on_eof = args.exit_on_eof;
    let shutdown = async move {
        if exit_on_eof {
            tokio::select! {
                () = shutdown_signal() => {}
                _ = done_rx => {}
            }
        } else {
            shutdown_signal().await;
        }
    };

    info!("Monitor running");
    let mut renderer = Renderer::new(cli, poll_interval);
    driver.run(|view| renderer.render(view), shutdown).await;

    handle.shutdown().await?;
    task.await.context("monitor task failed")?;

    if feed.is_finished() {
        match feed.await.context("feed task failed")? {
            Ok(stats) if cli.format == OutputFormat::Text && !cli.quiet => {
                let formatter = TextFormatter::new(!cli.no_color);
                println!("{}", formatter.format_feed_stats(&stats));
            }
            Ok(_) => {}
            Err(e) => warn!(error = %e, "Feed stopped early"),
        }
    } else {
        feed.abort();
    }

    Ok(())
}

//! Ingest command - account a feed without a view.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use bytewatch_monitor::pump;
use bytewatch_store::SettingsStore;
use clap::Args;
use serde::Serialize;
use tokio::io::{AsyncBufRead, BufReader};
use tracing::info;

use crate::output::{JsonFormatter, TextFormatter};
use crate::{Cli, OutputFormat, context};

/// Arguments for ingest command.
#[derive(Args)]
pub struct IngestArgs {
    /// Feed file, one JSON event per line. Reads stdin when omitted or "-".
    pub file: Option<PathBuf>,
}

/// Opens a feed source.
pub(crate) async fn open_input(path: Option<&Path>) -> Result<Box<dyn AsyncBufRead + Unpin + Send>> {
    match path {
        Some(path) if path != Path::new("-") => {
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("cannot open feed {}", path.display()))?;
            Ok(Box::new(BufReader::new(file)))
        }
        _ => Ok(Box::new(BufReader::new(tokio::io::stdin()))),
    }
}

/// Runs the ingest command.
pub async fn run(args: &IngestArgs, cli: &Cli, settings: &SettingsStore) -> Result<()> {
    let input = open_input(args.file.as_deref()).await?;
    let (handle, task) = context::spawn_monitor(cli, settings).await;

    let stats = pump(input, &handle).await?;
    let counters = handle.snapshot().await?;
    handle.shutdown().await?;
    task.await.context("monitor task failed")?;

    info!(forwarded = stats.forwarded, daily = counters.daily, "Ingest complete");

    match cli.format {
        OutputFormat::Text => {
            if !cli.quiet {
                let formatter = TextFormatter::new(!cli.no_color);
                println!("{}", formatter.format_feed_stats(&stats));
            }
        }
        OutputFormat::Json => {
            #[derive(Serialize)]
            struct IngestOutput {
                #[serde(flatten)]
                stats: bytewatch_monitor::FeedStats,
                counters: bytewatch_core::UsageCounters,
            }
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format(&IngestOutput { stats, counters })?);
        }
    }

    Ok(())
}

//! History command - archived daily totals.

use anyhow::Result;
use bytewatch_store::SettingsStore;
use clap::Args;

use crate::output::{JsonFormatter, TextFormatter};
use crate::{Cli, OutputFormat, context};

/// Arguments for history command.
#[derive(Args)]
pub struct HistoryArgs {
    /// Number of days to show.
    #[arg(long, short = 'n', default_value = "10")]
    pub limit: usize,
}

/// Runs the history command.
pub async fn run(args: &HistoryArgs, cli: &Cli, settings: &SettingsStore) -> Result<()> {
    let store = context::open_store(cli, settings).await;
    store.apply_rollover(context::today()).await;
    let entries = store.recent_history(args.limit).await;

    match cli.format {
        OutputFormat::Text => {
            let formatter = TextFormatter::new(!cli.no_color);
            println!("{}", formatter.format_history(&entries));
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format_history(&entries)?);
        }
    }

    Ok(())
}

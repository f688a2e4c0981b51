//! Reset command - zero all counters.

use std::io::{BufRead, Write};

use anyhow::Result;
use bytewatch_store::SettingsStore;
use clap::Args;
use tracing::info;

use crate::output::JsonFormatter;
use crate::{Cli, OutputFormat, context};

/// Arguments for reset command.
#[derive(Args)]
pub struct ResetArgs {
    /// Skip the confirmation prompt.
    #[arg(long, short)]
    pub yes: bool,
}

/// Runs the reset command.
pub async fn run(args: &ResetArgs, cli: &Cli, settings: &SettingsStore) -> Result<()> {
    if !args.yes && !confirm("Are you sure you want to reset all usage data?")? {
        println!("Cancelled");
        return Ok(());
    }

    let store = context::open_store(cli, settings).await;
    let counters = store.reset_all(context::today()).await;
    store.flush().await?;

    info!("Usage counters reset");
    match cli.format {
        OutputFormat::Text => {
            if !cli.quiet {
                println!("Usage data reset");
            }
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format(&counters)?);
        }
    }

    Ok(())
}

fn confirm(question: &str) -> Result<bool> {
    print!("{question} [y/N] ");
    std::io::stdout().flush()?;

    let mut answer = String::new();
    std::io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

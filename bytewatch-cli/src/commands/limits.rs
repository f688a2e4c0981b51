//! Limits command - show or change per-period limits.

use anyhow::Result;
use bytewatch_core::Period;
use bytewatch_store::SettingsStore;
use clap::{Args, Subcommand};
use tracing::info;

use crate::output::{JsonFormatter, TextFormatter};
use crate::{Cli, OutputFormat};

/// Arguments for the limits command.
#[derive(Args)]
pub struct LimitsArgs {
    #[command(subcommand)]
    pub action: Option<LimitsAction>,
}

/// Limits subcommands.
#[derive(Subcommand)]
pub enum LimitsAction {
    /// Show current limits (default).
    Show,

    /// Set one limit.
    Set {
        /// Period: daily, weekly or monthly.
        period: String,

        /// Limit in MB, a positive whole number.
        megabytes: String,
    },
}

/// Runs the limits command.
pub async fn run(args: &LimitsArgs, cli: &Cli, settings: &SettingsStore) -> Result<()> {
    match &args.action {
        Some(LimitsAction::Show) | None => show_limits(cli, settings).await,
        Some(LimitsAction::Set { period, megabytes }) => {
            set_limit(period, megabytes, cli, settings).await
        }
    }
}

async fn show_limits(cli: &Cli, settings: &SettingsStore) -> Result<()> {
    let limits = settings.limits().await;

    match cli.format {
        OutputFormat::Text => {
            let formatter = TextFormatter::new(!cli.no_color);
            println!("{}", formatter.format_limits(&limits));
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format(&limits)?);
        }
    }

    Ok(())
}

/// Rejected input leaves the stored limit unchanged and nothing is saved.
async fn set_limit(period: &str, megabytes: &str, cli: &Cli, settings: &SettingsStore) -> Result<()> {
    let period: Period = period.parse()?;
    let value = settings.set_limit_from_input(period, megabytes).await?;
    settings.save().await?;

    info!(%period, value, "Limit updated");
    if !cli.quiet {
        println!("{} limit: {value} MB", period.display_name());
    }

    Ok(())
}

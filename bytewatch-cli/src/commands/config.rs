//! Config command - manage configuration.

use anyhow::Result;
use bytewatch_store::{SettingsStore, default_config_dir, default_data_dir};
use clap::{Args, Subcommand};
use tracing::info;

use crate::output::{JsonFormatter, TextFormatter};
use crate::{Cli, OutputFormat, context};

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Config subcommands.
#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration.
    Show,

    /// Show configuration and data paths.
    Path,

    /// Reset to defaults.
    Reset,
}

/// Runs the config command.
pub async fn run(args: &ConfigArgs, cli: &Cli, settings: &SettingsStore) -> Result<()> {
    match &args.action {
        ConfigAction::Show => show_config(cli, settings).await,
        ConfigAction::Path => show_paths(cli, settings),
        ConfigAction::Reset => reset_config(cli, settings).await,
    }
}

async fn show_config(cli: &Cli, settings: &SettingsStore) -> Result<()> {
    let current = settings.get().await;

    match cli.format {
        OutputFormat::Text => {
            let formatter = TextFormatter::new(!cli.no_color);
            println!("{}", formatter.format_settings(&current));
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format(&current)?);
        }
    }

    Ok(())
}

fn show_paths(cli: &Cli, settings: &SettingsStore) -> Result<()> {
    let config_dir = default_config_dir();
    let data_dir = default_data_dir();
    let settings_path = settings.path();
    let data_path = context::data_path(cli);

    match cli.format {
        OutputFormat::Text => {
            println!("Configuration Paths");
            println!("{}", "─".repeat(40));
            println!();
            println!("Config dir:    {}", config_dir.display());
            println!("Data dir:      {}", data_dir.display());
            println!("Settings file: {}", settings_path.display());
            println!("Usage record:  {}", data_path.display());
        }
        OutputFormat::Json => {
            let paths = serde_json::json!({
                "config_dir": config_dir.display().to_string(),
                "data_dir": data_dir.display().to_string(),
                "settings_file": settings_path.display().to_string(),
                "usage_record": data_path.display().to_string(),
            });
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format(&paths)?);
        }
    }

    Ok(())
}

async fn reset_config(cli: &Cli, settings: &SettingsStore) -> Result<()> {
    settings.reset_to_defaults().await;
    settings.save().await?;

    info!("Configuration reset to defaults");
    if !cli.quiet {
        println!("Configuration reset to defaults");
    }

    Ok(())
}

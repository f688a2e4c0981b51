//! Shared command setup: file locations, settings and the usage store.

use std::path::PathBuf;
use std::sync::Arc;

use bytewatch_core::{Clock, LocalClock};
use bytewatch_monitor::{MessageBus, MonitorHandle, UsageAccumulator, monitor};
use bytewatch_store::{
    CounterStore, CounterStoreOptions, JsonFileStore, SettingsStore, default_data_path,
    default_settings_path,
};
use chrono::NaiveDate;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::Cli;

/// Settings file for this invocation.
pub fn settings_path(cli: &Cli) -> PathBuf {
    cli.settings_file.clone().unwrap_or_else(default_settings_path)
}

/// Usage record file for this invocation.
pub fn data_path(cli: &Cli) -> PathBuf {
    cli.data_file.clone().unwrap_or_else(default_data_path)
}

/// Loads settings. Unreadable files fall back to defaults.
pub async fn load_settings(cli: &Cli) -> Arc<SettingsStore> {
    let loaded = match &cli.settings_file {
        Some(path) => SettingsStore::load(path.clone()).await,
        None => SettingsStore::load_default().await,
    };
    match loaded {
        Ok(store) => Arc::new(store),
        Err(e) => {
            warn!(error = %e, "Using default settings");
            Arc::new(SettingsStore::new(settings_path(cli)))
        }
    }
}

/// The usage record backend.
pub fn backend(cli: &Cli) -> JsonFileStore {
    JsonFileStore::new(data_path(cli))
}

/// Opens the counter store with the configured history cap and week start.
pub async fn open_store(cli: &Cli, settings: &SettingsStore) -> Arc<CounterStore<JsonFileStore>> {
    let options = CounterStoreOptions {
        history_cap: settings.history_cap().await,
        week_start: settings.week_start().await,
    };
    debug!(path = %data_path(cli).display(), "Opening usage record");
    Arc::new(CounterStore::open(backend(cli), options).await)
}

/// Spawns a monitor task over the usage record.
pub async fn spawn_monitor(cli: &Cli, settings: &SettingsStore) -> (MonitorHandle, JoinHandle<()>) {
    let store = open_store(cli, settings).await;
    monitor::spawn(UsageAccumulator::new(store, LocalClock, MessageBus::default()))
}

/// Local calendar date.
pub fn today() -> NaiveDate {
    LocalClock.today()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Commands, OutputFormat};
    use bytewatch_core::Period;
    use clap::Parser;

    fn cli(dir: &std::path::Path, rest: &[&str]) -> Cli {
        let data = dir.join("usage.json");
        let settings = dir.join("settings.json");
        let mut args = vec![
            "bytewatch".to_string(),
            "--data-file".to_string(),
            data.display().to_string(),
            "--settings-file".to_string(),
            settings.display().to_string(),
        ];
        args.extend(rest.iter().map(ToString::to_string));
        Cli::parse_from(args)
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let dir = tempfile::tempdir().unwrap();
        let cli = cli(dir.path(), &["history", "-n", "3", "--format", "json"]);
        assert_eq!(cli.format, OutputFormat::Json);
        assert!(matches!(cli.command, Some(Commands::History(ref args)) if args.limit == 3));
        assert_eq!(data_path(&cli), dir.path().join("usage.json"));
    }

    #[tokio::test]
    async fn test_store_uses_configured_files() {
        let dir = tempfile::tempdir().unwrap();
        let cli = cli(dir.path(), &["usage"]);

        let settings = load_settings(&cli).await;
        settings.set_limit_from_input(Period::Daily, "250").await.unwrap();
        settings.save().await.unwrap();

        let store = open_store(&cli, &settings).await;
        store.observe(today(), 1024).await;
        store.flush().await.unwrap();

        assert!(dir.path().join("usage.json").exists());
        let reloaded = load_settings(&cli).await;
        assert_eq!(reloaded.limits().await.daily_limit, 250);
    }

    #[tokio::test]
    async fn test_monitor_answers_ping() {
        let dir = tempfile::tempdir().unwrap();
        let cli = cli(dir.path(), &["ping"]);
        let settings = load_settings(&cli).await;

        let (handle, task) = spawn_monitor(&cli, &settings).await;
        assert_eq!(handle.ping().await.unwrap(), bytewatch_monitor::Response::Pong);
        handle.shutdown().await.unwrap();
        task.await.unwrap();
    }
}

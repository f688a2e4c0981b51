//! User preferences store.
//!
//! Manages user settings with persistence and change notification.

use bytewatch_core::{CoreError, LimitConfig, Period, WeekStart};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{RwLock, watch};
use tracing::{debug, info};

use crate::error::StoreError;
use crate::history::DEFAULT_HISTORY_CAP;
use crate::persistence::{default_settings_path, load_json, load_json_or_default, save_json};

/// Default subscriber poll interval in seconds.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 2;

// ============================================================================
// Settings Types
// ============================================================================

/// User preferences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Per-period limits in MB.
    pub limits: LimitConfig,

    /// Number of archived days kept.
    pub history_cap: usize,

    /// First day of the accounting week.
    pub week_start: WeekStart,

    /// How often views re-read the persisted record, in seconds.
    pub poll_interval_secs: u64,

    /// Log level.
    pub log_level: LogLevel,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            limits: LimitConfig::default(),
            history_cap: DEFAULT_HISTORY_CAP,
            week_start: WeekStart::default(),
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            log_level: LogLevel::default(),
        }
    }
}

impl Settings {
    /// Repairs values a hand-edited file may have broken.
    #[must_use]
    pub fn sanitized(mut self) -> Self {
        self.limits = self.limits.sanitized();
        if self.history_cap == 0 {
            self.history_cap = DEFAULT_HISTORY_CAP;
        }
        if self.poll_interval_secs == 0 {
            self.poll_interval_secs = DEFAULT_POLL_INTERVAL_SECS;
        }
        self
    }

    /// Poll interval as a duration.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs.max(1))
    }
}

/// Log level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    /// Error level logging.
    Error,
    /// Warning level logging.
    #[default]
    Warn,
    /// Info level logging.
    Info,
    /// Debug level logging.
    Debug,
    /// Trace level logging.
    Trace,
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Error => write!(f, "error"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Trace => write!(f, "trace"),
        }
    }
}

// ============================================================================
// Settings Store
// ============================================================================

/// Persistent settings store with change notifications.
pub struct SettingsStore {
    settings: Arc<RwLock<Settings>>,
    path: PathBuf,
    notify: watch::Sender<u64>,
    version: Arc<RwLock<u64>>,
}

impl SettingsStore {
    /// Creates a new settings store with defaults.
    pub fn new(path: PathBuf) -> Self {
        Self::with_settings(path, Settings::default())
    }

    fn with_settings(path: PathBuf, settings: Settings) -> Self {
        let (notify, _) = watch::channel(0);
        Self {
            settings: Arc::new(RwLock::new(settings)),
            path,
            notify,
            version: Arc::new(RwLock::new(0)),
        }
    }

    /// Loads settings from the default path.
    ///
    /// # Errors
    ///
    /// Returns error if settings cannot be loaded from disk.
    pub async fn load_default() -> Result<Self, StoreError> {
        Self::load(default_settings_path()).await
    }

    /// Loads settings from a path. A missing or corrupt file yields
    /// defaults.
    ///
    /// # Errors
    ///
    /// Returns error if settings cannot be loaded from disk.
    pub async fn load(path: PathBuf) -> Result<Self, StoreError> {
        let settings = if path.exists() {
            info!(path = %path.display(), "Loading settings");
            load_json_or_default::<Settings>(&path).await.sanitized()
        } else {
            debug!(path = %path.display(), "Settings file not found, using defaults");
            Settings::default()
        };

        Ok(Self::with_settings(path, settings))
    }

    /// Path this store saves to.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Gets a copy of the current settings.
    pub async fn get(&self) -> Settings {
        self.settings.read().await.clone()
    }

    /// Updates settings and notifies subscribers.
    pub async fn update<F>(&self, f: F)
    where
        F: FnOnce(&mut Settings),
    {
        {
            let mut settings = self.settings.write().await;
            f(&mut settings);
        }
        self.notify_change().await;
    }

    /// Saves settings to disk.
    ///
    /// # Errors
    ///
    /// Returns error if settings cannot be written to disk.
    pub async fn save(&self) -> Result<(), StoreError> {
        let settings = self.settings.read().await;
        save_json(&self.path, &*settings).await?;
        info!(path = %self.path.display(), "Settings saved");
        Ok(())
    }

    /// Re-reads the file another process may have saved.
    ///
    /// Subscribers are notified only when the settings actually differ. A
    /// missing file leaves the current settings in place.
    ///
    /// # Errors
    ///
    /// Returns the read or parse error; the current settings are kept.
    pub async fn reload(&self) -> Result<bool, StoreError> {
        if !self.path.exists() {
            return Ok(false);
        }
        let loaded = load_json::<Settings>(&self.path).await?.sanitized();
        {
            let mut settings = self.settings.write().await;
            if *settings == loaded {
                return Ok(false);
            }
            *settings = loaded;
        }
        debug!(path = %self.path.display(), "Settings changed on disk");
        self.notify_change().await;
        Ok(true)
    }

    /// Subscribes to settings changes.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.notify.subscribe()
    }

    /// Notifies subscribers of a change.
    async fn notify_change(&self) {
        let mut version = self.version.write().await;
        *version += 1;
        let _ = self.notify.send(*version);
    }

    // ========================================================================
    // Convenience Methods
    // ========================================================================

    /// Current limits.
    pub async fn limits(&self) -> LimitConfig {
        self.settings.read().await.limits
    }

    /// Validates user input and sets one limit.
    ///
    /// Invalid input leaves the stored value untouched and sends no
    /// notification.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidLimit` for anything but a positive whole
    /// number.
    pub async fn set_limit_from_input(&self, period: Period, input: &str) -> Result<u64, CoreError> {
        let value = {
            let mut settings = self.settings.write().await;
            settings.limits.set_from_input(period, input)?
        };
        debug!(%period, value, "Limit updated");
        self.notify_change().await;
        Ok(value)
    }

    /// Current week start.
    pub async fn week_start(&self) -> WeekStart {
        self.settings.read().await.week_start
    }

    /// Current history cap.
    pub async fn history_cap(&self) -> usize {
        self.settings.read().await.history_cap
    }

    /// Current poll interval.
    pub async fn poll_interval(&self) -> Duration {
        self.settings.read().await.poll_interval()
    }

    /// Restores every setting to its default.
    pub async fn reset_to_defaults(&self) {
        self.update(|s| *s = Settings::default()).await;
    }
}

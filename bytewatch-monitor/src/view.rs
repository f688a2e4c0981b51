//! Subscriber-side usage view.
//!
//! A view combines push updates with a periodic re-read of the persisted
//! record. The poll covers views that open after a push was already sent.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use bytewatch_core::{
    Alert, LimitConfig, Period, UsageCounters, UsageLevel, badge_text, evaluate, format::bytes_to_mb,
    format_usage_mb, progress_percent,
};
use bytewatch_store::{KeyValueStore, SettingsStore, StoredUsage};
use chrono::{DateTime, Local};
use serde::Serialize;
use tokio::sync::{broadcast, watch};
use tracing::{debug, warn};

use crate::bus::Message;
use crate::error::MonitorError;

// ============================================================================
// Connection Status
// ============================================================================

/// How fresh the view's data is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionStatus {
    /// Nothing read yet.
    #[default]
    Connecting,
    /// Reading the persisted record.
    Connected,
    /// Receiving push updates.
    LiveTracking,
    /// The record or the bus is unreachable.
    Disconnected,
}

impl std::fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionStatus::Connecting => write!(f, "Connecting..."),
            ConnectionStatus::Connected => write!(f, "Connected"),
            ConnectionStatus::LiveTracking => write!(f, "Live Tracking"),
            ConnectionStatus::Disconnected => write!(f, "Disconnected"),
        }
    }
}

// ============================================================================
// Usage View
// ============================================================================

/// One rendered period.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodRow {
    /// Period.
    pub period: Period,
    /// Window label ("Today", ...).
    pub label: &'static str,
    /// Usage in MB.
    pub usage_mb: f64,
    /// Formatted usage ("12.3 MB").
    pub display: String,
    /// Limit in MB.
    pub limit_mb: u64,
    /// Clamped progress percentage.
    pub percent: f64,
    /// Progress band.
    pub level: UsageLevel,
}

/// Everything a subscriber renders.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UsageView {
    /// Latest counters.
    pub counters: UsageCounters,
    /// Active limits.
    pub limits: LimitConfig,
    /// Current alert set.
    pub alerts: Vec<Alert>,
    /// Data freshness.
    pub status: ConnectionStatus,
    /// When counters last changed.
    pub updated_at: Option<DateTime<Local>>,
}

impl UsageView {
    /// Creates an empty view.
    pub fn new(limits: LimitConfig) -> Self {
        Self {
            counters: UsageCounters::new(),
            limits,
            alerts: Vec::new(),
            status: ConnectionStatus::Connecting,
            updated_at: None,
        }
    }

    /// Replaces the counters and recomputes alerts.
    pub fn apply_counters(&mut self, counters: UsageCounters) {
        self.counters = counters;
        self.updated_at = Some(Local::now());
        self.alerts = evaluate(&self.counters, &self.limits);
    }

    /// Replaces the limits and recomputes alerts.
    pub fn set_limits(&mut self, limits: LimitConfig) {
        self.limits = limits;
        self.alerts = evaluate(&self.counters, &self.limits);
    }

    /// One row per period, daily first.
    pub fn rows(&self) -> Vec<PeriodRow> {
        Period::all()
            .iter()
            .map(|&period| {
                let usage_mb = bytes_to_mb(self.counters.get(period));
                let limit_mb = self.limits.get(period);
                let percent = progress_percent(usage_mb, limit_mb);
                PeriodRow {
                    period,
                    label: period.window_label(),
                    usage_mb,
                    display: format_usage_mb(usage_mb),
                    limit_mb,
                    percent,
                    level: UsageLevel::from_percent(percent),
                }
            })
            .collect()
    }

    /// Badge text for the daily counter.
    pub fn badge(&self) -> String {
        badge_text(self.counters.daily)
    }
}

// ============================================================================
// View Driver
// ============================================================================

/// Keeps a [`UsageView`] current from push updates, polls and settings
/// changes.
pub struct ViewDriver<S: KeyValueStore> {
    source: S,
    updates: Option<broadcast::Receiver<Message>>,
    settings: Option<(Arc<SettingsStore>, watch::Receiver<u64>)>,
    poll_interval: Duration,
    view: UsageView,
}

impl<S: KeyValueStore> ViewDriver<S> {
    /// Creates a driver that polls `source`.
    pub fn new(source: S, limits: LimitConfig, poll_interval: Duration) -> Self {
        Self {
            source,
            updates: None,
            settings: None,
            poll_interval: poll_interval.max(Duration::from_millis(10)),
            view: UsageView::new(limits),
        }
    }

    /// Also listens for push updates.
    #[must_use]
    pub fn with_updates(mut self, updates: broadcast::Receiver<Message>) -> Self {
        self.updates = Some(updates);
        self
    }

    /// Re-reads limits whenever settings change, including saves from
    /// another process, which are picked up on the poll tick.
    #[must_use]
    pub fn with_settings(mut self, settings: Arc<SettingsStore>) -> Self {
        let rx = settings.subscribe();
        self.settings = Some((settings, rx));
        self
    }

    /// Current view.
    pub fn view(&self) -> &UsageView {
        &self.view
    }

    /// Reads the persisted record into the view.
    ///
    /// # Errors
    ///
    /// Returns the store error; the view is marked disconnected.
    pub async fn refresh(&mut self) -> Result<&UsageView, MonitorError> {
        match StoredUsage::load(&self.source).await {
            Ok(stored) => {
                if stored.counters != self.view.counters || self.view.updated_at.is_none() {
                    self.view.apply_counters(stored.counters);
                }
                if self.view.status != ConnectionStatus::LiveTracking {
                    self.view.status = ConnectionStatus::Connected;
                }
                Ok(&self.view)
            }
            Err(e) => {
                self.view.status = ConnectionStatus::Disconnected;
                Err(e.into())
            }
        }
    }

    /// Waits for the next change source and applies it.
    pub async fn next(&mut self) -> &UsageView {
        let poll = tokio::time::sleep(self.poll_interval);
        let updates = &mut self.updates;
        let settings = &mut self.settings;

        let push = async move {
            match updates.as_mut() {
                Some(rx) => rx.recv().await,
                None => std::future::pending().await,
            }
        };
        let settings_changed = async move {
            match settings.as_mut() {
                Some((_, rx)) => rx.changed().await.is_ok(),
                None => std::future::pending().await,
            }
        };

        let event = tokio::select! {
            () = poll => Event::Poll,
            msg = push => Event::Push(msg),
            ok = settings_changed => Event::Settings(ok),
        };

        match event {
            Event::Poll => {
                self.reload_settings().await;
                if let Err(e) = self.refresh().await {
                    warn!(error = %e, "Poll failed");
                }
            }
            Event::Push(Ok(Message::UsageUpdate { data })) => {
                self.view.apply_counters(data);
                self.view.status = ConnectionStatus::LiveTracking;
            }
            Event::Push(Err(broadcast::error::RecvError::Lagged(skipped))) => {
                debug!(skipped, "View lagged, re-reading record");
                if let Err(e) = self.refresh().await {
                    warn!(error = %e, "Refresh after lag failed");
                }
            }
            Event::Push(Err(broadcast::error::RecvError::Closed)) => {
                debug!("Update channel closed, polling only");
                self.updates = None;
                self.view.status = ConnectionStatus::Disconnected;
            }
            Event::Settings(true) => {
                if let Some((settings, _)) = &self.settings {
                    let limits = settings.limits().await;
                    self.view.set_limits(limits);
                }
            }
            Event::Settings(false) => {
                self.settings = None;
            }
        }

        &self.view
    }

    async fn reload_settings(&mut self) {
        let Some((settings, rx)) = &mut self.settings else {
            return;
        };
        match settings.reload().await {
            Ok(true) => {
                rx.borrow_and_update();
                self.view.set_limits(settings.limits().await);
            }
            Ok(false) => {}
            Err(e) => warn!(error = %e, "Settings reload failed, keeping current limits"),
        }
    }

    /// Reads once, renders, then renders after every change until
    /// `shutdown` resolves.
    pub async fn run<F, Fut>(mut self, mut render: F, shutdown: Fut) -> UsageView
    where
        F: FnMut(&UsageView),
        Fut: Future<Output = ()>,
    {
        if let Err(e) = self.refresh().await {
            warn!(error = %e, "Initial read failed");
        }
        render(&self.view);

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                () = &mut shutdown => break,
                view = self.next() => render(view),
            }
        }
        self.view
    }
}

enum Event {
    Poll,
    Push(Result<Message, broadcast::error::RecvError>),
    Settings(bool),
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytewatch_core::BYTES_PER_MB;
    use bytewatch_store::MemoryStore;
    use serde_json::json;

    #[test]
    fn test_status_labels() {
        assert_eq!(ConnectionStatus::Connecting.to_string(), "Connecting...");
        assert_eq!(ConnectionStatus::LiveTracking.to_string(), "Live Tracking");
    }

    #[test]
    fn test_alerts_replaced_on_counter_update() {
        let mut view = UsageView::new(LimitConfig::default());
        view.apply_counters(UsageCounters {
            daily: 950 * BYTES_PER_MB,
            weekly: 0,
            monthly: 0,
        });
        assert_eq!(view.alerts.len(), 1);

        view.apply_counters(UsageCounters::new());
        assert!(view.alerts.is_empty());
    }

    #[test]
    fn test_alerts_replaced_on_limit_change() {
        let mut view = UsageView::new(LimitConfig::default());
        view.apply_counters(UsageCounters {
            daily: 500 * BYTES_PER_MB,
            weekly: 500 * BYTES_PER_MB,
            monthly: 500 * BYTES_PER_MB,
        });
        assert!(view.alerts.is_empty());

        let mut limits = LimitConfig::default();
        limits.set(Period::Weekly, 520).unwrap();
        view.set_limits(limits);
        assert_eq!(view.alerts[0].to_string(), "Weekly limit almost reached: 96%");
    }

    #[test]
    fn test_rows() {
        let mut view = UsageView::new(LimitConfig::default());
        view.apply_counters(UsageCounters {
            daily: 800 * BYTES_PER_MB,
            weekly: 1536 * BYTES_PER_MB,
            monthly: 0,
        });
        let rows = view.rows();
        assert_eq!(rows[0].label, "Today");
        assert_eq!(rows[0].level, UsageLevel::Warning);
        assert_eq!(rows[1].display, "1.50 GB");
        assert_eq!(rows[2].level, UsageLevel::Normal);
        assert_eq!(view.badge(), "800.0MB");
    }

    #[tokio::test]
    async fn test_poll_picks_up_external_write() {
        let backend = MemoryStore::new();
        let mut driver = ViewDriver::new(backend.clone(), LimitConfig::default(), Duration::from_millis(20));
        driver.refresh().await.unwrap();
        assert_eq!(driver.view().status, ConnectionStatus::Connected);

        let mut record = bytewatch_store::Record::new();
        record.insert("dailyUsage".into(), json!(42));
        backend.set(record).await.unwrap();

        let view = driver.next().await;
        assert_eq!(view.counters.daily, 42);
    }

    #[tokio::test]
    async fn test_push_sets_live_tracking() {
        let bus = crate::bus::MessageBus::default();
        let mut driver = ViewDriver::new(MemoryStore::new(), LimitConfig::default(), Duration::from_secs(60))
            .with_updates(bus.subscribe());

        let counters = UsageCounters {
            daily: 5,
            weekly: 5,
            monthly: 5,
        };
        bus.publish_usage(counters);
        let view = driver.next().await;
        assert_eq!(view.counters, counters);
        assert_eq!(view.status, ConnectionStatus::LiveTracking);
    }

    #[tokio::test]
    async fn test_failed_poll_disconnects() {
        let backend = MemoryStore::new();
        backend.fail_reads(true);
        let mut driver = ViewDriver::new(backend, LimitConfig::default(), Duration::from_millis(10));
        assert!(driver.refresh().await.is_err());
        assert_eq!(driver.view().status, ConnectionStatus::Disconnected);
    }

    #[tokio::test]
    async fn test_settings_change_updates_limits() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let settings = Arc::new(SettingsStore::new(temp_dir.path().join("settings.json")));
        let mut driver = ViewDriver::new(MemoryStore::new(), LimitConfig::default(), Duration::from_secs(60))
            .with_settings(Arc::clone(&settings));

        settings.set_limit_from_input(Period::Daily, "10").await.unwrap();
        let view = driver.next().await;
        assert_eq!(view.limits.daily_limit, 10);
    }

    #[tokio::test]
    async fn test_limit_saved_by_other_process_applies_on_poll() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("settings.json");
        let settings = Arc::new(SettingsStore::load(path.clone()).await.unwrap());

        let backend = MemoryStore::new();
        let mut record = bytewatch_store::Record::new();
        record.insert("dailyUsage".into(), json!(95 * BYTES_PER_MB));
        backend.set(record).await.unwrap();

        let mut driver = ViewDriver::new(backend, settings.limits().await, Duration::from_millis(20))
            .with_settings(Arc::clone(&settings));
        driver.refresh().await.unwrap();
        assert!(driver.view().alerts.is_empty());

        let other = SettingsStore::load(path).await.unwrap();
        other.set_limit_from_input(Period::Daily, "100").await.unwrap();
        other.save().await.unwrap();

        let view = driver.next().await;
        assert_eq!(view.limits.daily_limit, 100);
        assert_eq!(view.alerts.len(), 1);
    }
}

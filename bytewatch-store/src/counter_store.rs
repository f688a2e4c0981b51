//! Persisted usage counters.
//!
//! [`CounterStore`] owns the three rolling counters, the reset marker and the
//! bounded history. Every mutating call is one read-modify-write transaction
//! under a single async mutex: the record is read back from the backend, the
//! change is applied, and the write happens while the lock is held. Other
//! processes sharing the file (a manual reset, a rollover from a one-shot
//! command) are therefore picked up before the next increment lands.
//!
//! Backend failures never reach the caller. After a failed write the
//! in-memory state stays authoritative, the store is marked dirty, and the
//! next mutating call rewrites the full record. Until a read has succeeded
//! at least once, observed bytes are held back and no counter is written.

use bytewatch_core::{HistoryEntry, UsageCounters, WeekStart, decide, format_date, parse_date};
use chrono::NaiveDate;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::StoreError;
use crate::history::{DEFAULT_HISTORY_CAP, UsageHistory};
use crate::kv::{KeyValueStore, Record, keys};

// ============================================================================
// Stored Record
// ============================================================================

/// Usage state as read from the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoredUsage {
    /// Counter values.
    pub counters: UsageCounters,
    /// Last rollover date, if a valid one was stored.
    pub marker: Option<NaiveDate>,
    /// Archived days, oldest first.
    pub history: Vec<HistoryEntry>,
}

impl StoredUsage {
    /// Reads the usage keys from a backend.
    ///
    /// # Errors
    ///
    /// Returns the backend's error if the read fails.
    pub async fn load<S: KeyValueStore>(backend: &S) -> Result<Self, StoreError> {
        let record = backend.get(keys::ALL).await?;
        Ok(Self::from_record(&record))
    }

    /// Decodes a stored record. Malformed fields fall back to defaults.
    pub fn from_record(record: &Record) -> Self {
        let counters = UsageCounters {
            daily: read_counter(record, keys::DAILY_USAGE),
            weekly: read_counter(record, keys::WEEKLY_USAGE),
            monthly: read_counter(record, keys::MONTHLY_USAGE),
        };

        let marker = match record.get(keys::LAST_RESET_DATE) {
            Some(Value::String(raw)) => {
                let parsed = parse_date(raw);
                if parsed.is_none() {
                    warn!(raw = %raw, "Unparseable reset marker, treating as first run");
                }
                parsed
            }
            Some(other) => {
                warn!(value = %other, "Reset marker is not a string, treating as first run");
                None
            }
            None => None,
        };

        let history = match record.get(keys::USAGE_HISTORY) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|item| match serde_json::from_value::<HistoryEntry>(item.clone()) {
                    Ok(entry) => Some(entry),
                    Err(e) => {
                        warn!(error = %e, "Skipping malformed history entry");
                        None
                    }
                })
                .collect(),
            Some(_) => {
                warn!("Usage history is not an array, ignoring");
                Vec::new()
            }
            None => Vec::new(),
        };

        Self {
            counters,
            marker,
            history,
        }
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn read_counter(record: &Record, key: &str) -> u64 {
    match record.get(key) {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite() && *f > 0.0).map(|f| f as u64))
            .unwrap_or(0),
        Some(other) => {
            warn!(key, value = %other, "Counter is not a number, using 0");
            0
        }
        None => 0,
    }
}

// ============================================================================
// Options
// ============================================================================

/// Policy knobs for a counter store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterStoreOptions {
    /// Maximum archived days.
    pub history_cap: usize,
    /// First day of the accounting week.
    pub week_start: WeekStart,
}

impl Default for CounterStoreOptions {
    fn default() -> Self {
        Self {
            history_cap: DEFAULT_HISTORY_CAP,
            week_start: WeekStart::default(),
        }
    }
}

// ============================================================================
// Counter Store
// ============================================================================

/// Which groups of keys a mutation touched.
#[derive(Debug, Clone, Copy, Default)]
struct Changes {
    counters: bool,
    marker: bool,
    history: bool,
}

impl Changes {
    const ALL: Changes = Changes {
        counters: true,
        marker: true,
        history: true,
    };

    fn any(self) -> bool {
        self.counters || self.marker || self.history
    }

    fn union(self, other: Changes) -> Changes {
        Changes {
            counters: self.counters || other.counters,
            marker: self.marker || other.marker,
            history: self.history || other.history,
        }
    }
}

#[derive(Debug)]
struct CounterState {
    counters: UsageCounters,
    marker: Option<NaiveDate>,
    history: UsageHistory,
    dirty: bool,
    /// Memory reflects a successful read of the backend.
    synced: bool,
    /// Bytes observed while no read had succeeded.
    pending: u64,
}

impl CounterState {
    fn current(&self) -> UsageCounters {
        let mut counters = self.counters;
        counters.add(self.pending);
        counters
    }

    /// Keys a full rewrite may touch. History is never written blind.
    fn full_changes(&self) -> Changes {
        Changes {
            history: self.synced,
            ..Changes::ALL
        }
    }
}

/// Serialized owner of the persisted usage record.
#[derive(Debug)]
pub struct CounterStore<S: KeyValueStore> {
    backend: S,
    state: Mutex<CounterState>,
    week_start: WeekStart,
    history_cap: usize,
}

impl<S: KeyValueStore> CounterStore<S> {
    /// Opens a store over `backend`, loading whatever it holds.
    ///
    /// A failed read is logged and the store starts from defaults. The read
    /// is retried before every mutation and nothing is persisted over the
    /// unread record in the meantime.
    pub async fn open(backend: S, options: CounterStoreOptions) -> Self {
        let (stored, synced) = match StoredUsage::load(&backend).await {
            Ok(stored) => (stored, true),
            Err(e) => {
                warn!(error = %e, "Failed to read usage record, starting from defaults");
                (StoredUsage::default(), false)
            }
        };

        debug!(
            daily = stored.counters.daily,
            weekly = stored.counters.weekly,
            monthly = stored.counters.monthly,
            history = stored.history.len(),
            "Counter store opened"
        );

        Self {
            backend,
            state: Mutex::new(CounterState {
                counters: stored.counters,
                marker: stored.marker,
                history: UsageHistory::from_entries(stored.history, options.history_cap),
                dirty: false,
                synced,
                pending: 0,
            }),
            week_start: options.week_start,
            history_cap: options.history_cap,
        }
    }

    /// The backing key/value store.
    pub fn backend(&self) -> &S {
        &self.backend
    }

    /// Adds `bytes` to every counter and persists the totals.
    pub async fn increment_all(&self, bytes: u64) -> UsageCounters {
        let mut state = self.state.lock().await;
        if !self.reload_locked(&mut state).await {
            state.pending = state.pending.saturating_add(bytes);
            return state.current();
        }
        let pending = std::mem::take(&mut state.pending);
        state.counters.add(pending.saturating_add(bytes));
        self.persist(&mut state, Changes {
            counters: true,
            ..Changes::default()
        })
        .await;
        state.counters
    }

    /// Runs the rollover policy for `today` and persists whatever changed.
    ///
    /// Returns the counters after the check and the archived entry, if a
    /// day ended. Nothing rolls over while the record cannot be read.
    pub async fn apply_rollover(&self, today: NaiveDate) -> (UsageCounters, Option<HistoryEntry>) {
        let mut state = self.state.lock().await;
        if !self.reload_locked(&mut state).await {
            return (state.current(), None);
        }
        let (mut changes, archived) = self.rollover_locked(&mut state, today);
        if state.pending > 0 {
            let pending = std::mem::take(&mut state.pending);
            state.counters.add(pending);
            changes.counters = true;
        }
        if changes.any() || state.dirty {
            self.persist(&mut state, changes).await;
        }
        (state.counters, archived)
    }

    /// Rollover followed by increment, as one transaction.
    pub async fn observe(&self, today: NaiveDate, bytes: u64) -> UsageCounters {
        let mut state = self.state.lock().await;
        if !self.reload_locked(&mut state).await {
            state.pending = state.pending.saturating_add(bytes);
            return state.current();
        }
        let (changes, _) = self.rollover_locked(&mut state, today);
        let pending = std::mem::take(&mut state.pending);
        state.counters.add(pending.saturating_add(bytes));
        let changes = changes.union(Changes {
            counters: true,
            ..Changes::default()
        });
        self.persist(&mut state, changes).await;
        state.counters
    }

    /// Zeroes every counter and sets the marker to `today`. History is kept.
    ///
    /// A reset does not depend on the stored totals, so it is written even
    /// when the record cannot be read.
    pub async fn reset_all(&self, today: NaiveDate) -> UsageCounters {
        let mut state = self.state.lock().await;
        self.reload_locked(&mut state).await;
        state.counters = UsageCounters::new();
        state.pending = 0;
        state.marker = Some(today);
        info!(today = %today, "Usage counters reset manually");
        self.persist(&mut state, Changes {
            counters: true,
            marker: true,
            history: false,
        })
        .await;
        state.counters
    }

    /// Writes the full record if an earlier write failed.
    ///
    /// # Errors
    ///
    /// Returns the backend error; the store stays dirty.
    pub async fn flush(&self) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        if !state.dirty {
            return Ok(());
        }
        let record = build_record(&state, state.full_changes())?;
        self.backend.set(record).await?;
        state.dirty = false;
        info!("Pending usage record flushed");
        Ok(())
    }

    /// Current counters.
    pub async fn snapshot(&self) -> UsageCounters {
        self.state.lock().await.current()
    }

    /// All archived entries, oldest first.
    pub async fn history(&self) -> Vec<HistoryEntry> {
        self.state.lock().await.history.entries()
    }

    /// Up to `n` archived entries, most recent first.
    pub async fn recent_history(&self, n: usize) -> Vec<HistoryEntry> {
        self.state.lock().await.history.recent(n)
    }

    /// Current reset marker.
    pub async fn marker(&self) -> Option<NaiveDate> {
        self.state.lock().await.marker
    }

    /// True if the last write failed and has not been retried yet.
    pub async fn is_dirty(&self) -> bool {
        self.state.lock().await.dirty
    }

    /// Re-reads the record before a mutation.
    ///
    /// Returns false if memory has never been synced and the read failed
    /// again. A failed read after an earlier success keeps memory and marks
    /// the store dirty, so the next write restores every key.
    async fn reload_locked(&self, state: &mut CounterState) -> bool {
        match StoredUsage::load(&self.backend).await {
            Ok(stored) => {
                if !state.synced {
                    info!(pending = state.pending, "Usage record readable again");
                }
                // Unwritten changes win over what is on disk.
                if !state.dirty {
                    state.counters = stored.counters;
                    state.marker = stored.marker;
                }
                if !state.dirty || !state.synced {
                    state.history = UsageHistory::from_entries(stored.history, self.history_cap);
                }
                state.synced = true;
                true
            }
            Err(e) if state.synced => {
                warn!(error = %e, "Failed to re-read usage record, rewriting from memory");
                state.dirty = true;
                true
            }
            Err(e) => {
                warn!(error = %e, pending = state.pending, "Usage record still unreadable");
                false
            }
        }
    }

    fn rollover_locked(
        &self,
        state: &mut CounterState,
        today: NaiveDate,
    ) -> (Changes, Option<HistoryEntry>) {
        let decision = decide(today, state.marker, state.counters.daily, self.week_start);
        if decision.is_noop() {
            return (Changes::default(), None);
        }

        if let Some(entry) = decision.archive_entry {
            let evicted = state.history.push(entry);
            debug!(date = %entry.date, usage = entry.usage, evicted, "Archived daily usage");
        }
        decision.apply(&mut state.counters);
        state.marker = Some(decision.new_marker);

        if decision.first_run {
            info!(today = %today, "No reset marker, starting accounting today");
        } else {
            info!(
                today = %today,
                daily = decision.reset_daily,
                weekly = decision.reset_weekly,
                monthly = decision.reset_monthly,
                "Counters rolled over"
            );
        }

        let changes = Changes {
            counters: !decision.resets().is_empty(),
            marker: true,
            history: decision.archive_entry.is_some(),
        };
        (changes, decision.archive_entry)
    }

    async fn persist(&self, state: &mut CounterState, changes: Changes) {
        let changes = if state.dirty {
            state.full_changes()
        } else {
            Changes {
                history: changes.history && state.synced,
                ..changes
            }
        };
        let result = match build_record(state, changes) {
            Ok(record) => self.backend.set(record).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => {
                if state.dirty {
                    info!("Usage record written after earlier failure");
                }
                state.dirty = false;
            }
            Err(e) => {
                warn!(
                    error = %e,
                    transient = e.is_transient(),
                    "Failed to persist usage, keeping in-memory totals"
                );
                state.dirty = true;
            }
        }
    }
}

fn build_record(state: &CounterState, changes: Changes) -> Result<Record, StoreError> {
    let mut record = Record::new();
    if changes.counters {
        record.insert(keys::DAILY_USAGE.into(), state.counters.daily.into());
        record.insert(keys::WEEKLY_USAGE.into(), state.counters.weekly.into());
        record.insert(keys::MONTHLY_USAGE.into(), state.counters.monthly.into());
    }
    if changes.marker {
        if let Some(marker) = state.marker {
            record.insert(keys::LAST_RESET_DATE.into(), format_date(marker).into());
        }
    }
    if changes.history {
        record.insert(
            keys::USAGE_HISTORY.into(),
            serde_json::to_value(state.history.entries())?,
        );
    }
    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::MemoryStore;
    use bytewatch_core::BYTES_PER_MB;
    use serde_json::json;
    use std::sync::Arc;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    async fn open(backend: MemoryStore) -> CounterStore<MemoryStore> {
        CounterStore::open(backend, CounterStoreOptions::default()).await
    }

    #[tokio::test]
    async fn test_increment_persists_all_counters() {
        let backend = MemoryStore::new();
        let store = open(backend.clone()).await;

        let counters = store.increment_all(100).await;
        assert_eq!(counters, UsageCounters { daily: 100, weekly: 100, monthly: 100 });
        assert_eq!(
            backend.last_write().await.map(Value::Object),
            Some(json!({"dailyUsage": 100, "weeklyUsage": 100, "monthlyUsage": 100}))
        );
    }

    #[tokio::test]
    async fn test_monotonic_between_resets() {
        let store = open(MemoryStore::new()).await;
        let today = date(2026, 10, 19);
        store.apply_rollover(today).await;

        let mut previous = store.snapshot().await;
        for bytes in [0, 1, 50_000, 0, 7] {
            let next = store.observe(today, bytes).await;
            assert!(next.daily >= previous.daily);
            assert!(next.weekly >= previous.weekly);
            assert!(next.monthly >= previous.monthly);
            previous = next;
        }
        assert_eq!(previous.daily, 50_008);
    }

    #[tokio::test]
    async fn test_concurrent_increments_not_lost() {
        let backend = MemoryStore::new();
        let store = Arc::new(open(backend.clone()).await);

        let handles: Vec<_> = (0..50)
            .map(|_| {
                let store = Arc::clone(&store);
                tokio::spawn(async move { store.increment_all(10).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(store.snapshot().await.daily, 500);
        assert_eq!(backend.dump().await["dailyUsage"], json!(500));
    }

    #[tokio::test]
    async fn test_first_run_sets_marker_only() {
        let backend = MemoryStore::new();
        let store = open(backend.clone()).await;

        let (counters, archived) = store.apply_rollover(date(2026, 10, 19)).await;
        assert!(counters.is_zero());
        assert!(archived.is_none());
        assert_eq!(store.marker().await, Some(date(2026, 10, 19)));
        assert_eq!(
            backend.last_write().await.map(Value::Object),
            Some(json!({"lastResetDate": "2026-10-19"}))
        );
    }

    #[tokio::test]
    async fn test_rollover_idempotent_same_day() {
        let backend = MemoryStore::with_record(record(json!({
            "dailyUsage": 10, "weeklyUsage": 20, "monthlyUsage": 30,
            "lastResetDate": "2026-10-19",
        })));
        let store = open(backend.clone()).await;

        let (first, archived) = store.apply_rollover(date(2026, 10, 20)).await;
        assert_eq!(archived, Some(HistoryEntry::new(date(2026, 10, 19), 10)));
        let writes = backend.write_count();

        let (second, archived) = store.apply_rollover(date(2026, 10, 20)).await;
        assert_eq!(first, second);
        assert!(archived.is_none());
        assert_eq!(store.history().await.len(), 1);
        assert_eq!(backend.write_count(), writes);
    }

    #[tokio::test]
    async fn test_history_cap_fifo() {
        let backend = MemoryStore::with_record(record(json!({"lastResetDate": "2026-10-01"})));
        let options = CounterStoreOptions {
            history_cap: 3,
            ..CounterStoreOptions::default()
        };
        let store = CounterStore::open(backend, options).await;

        // Days 1..5 end as the clock moves through 2..6.
        for day in 1..=5 {
            store.observe(date(2026, 10, day), u64::from(day)).await;
        }
        store.apply_rollover(date(2026, 10, 6)).await;

        let dates: Vec<NaiveDate> = store.history().await.iter().map(|e| e.date).collect();
        assert_eq!(dates, vec![date(2026, 10, 3), date(2026, 10, 4), date(2026, 10, 5)]);
        assert_eq!(store.recent_history(10).await[0].usage, 5);
    }

    #[tokio::test]
    async fn test_reset_all_keeps_history() {
        let backend = MemoryStore::with_record(record(json!({
            "dailyUsage": 5, "weeklyUsage": 6, "monthlyUsage": 7,
            "lastResetDate": "2026-10-18",
            "usageHistory": [{"date": "2026-10-17", "usage": 3}],
        })));
        let store = open(backend.clone()).await;

        let counters = store.reset_all(date(2026, 10, 19)).await;
        assert!(counters.is_zero());
        assert_eq!(store.history().await.len(), 1);
        assert_eq!(store.marker().await, Some(date(2026, 10, 19)));

        let stored = backend.dump().await;
        assert_eq!(stored["dailyUsage"], json!(0));
        assert_eq!(stored["lastResetDate"], json!("2026-10-19"));
        assert_eq!(stored["usageHistory"], json!([{"date": "2026-10-17", "usage": 3}]));
    }

    #[tokio::test]
    async fn test_failed_write_keeps_memory_and_retries_full_record() {
        let backend = MemoryStore::with_record(record(json!({"lastResetDate": "2026-10-19"})));
        let store = open(backend.clone()).await;
        let today = date(2026, 10, 19);

        backend.fail_writes(true);
        assert_eq!(store.observe(today, BYTES_PER_MB).await.daily, BYTES_PER_MB);
        assert!(store.is_dirty().await);
        assert!(backend.dump().await.get("dailyUsage").is_none());

        backend.fail_writes(false);
        store.observe(today, 1).await;
        assert!(!store.is_dirty().await);

        let last = backend.last_write().await.unwrap();
        for key in keys::ALL {
            assert!(last.contains_key(*key), "missing {key}");
        }
        assert_eq!(last["dailyUsage"], json!(BYTES_PER_MB + 1));
    }

    #[tokio::test]
    async fn test_flush_clears_dirty() {
        let backend = MemoryStore::new();
        let store = open(backend.clone()).await;

        backend.fail_writes(true);
        store.increment_all(3).await;
        assert!(store.flush().await.is_err());

        backend.fail_writes(false);
        store.flush().await.unwrap();
        assert!(!store.is_dirty().await);
        assert_eq!(backend.dump().await["monthlyUsage"], json!(3));
    }

    #[tokio::test]
    async fn test_failed_initial_read_starts_empty() {
        let backend = MemoryStore::with_record(record(json!({"dailyUsage": 99})));
        backend.fail_reads(true);
        let store = open(backend).await;
        assert!(store.snapshot().await.is_zero());
        assert!(store.marker().await.is_none());
    }

    #[tokio::test]
    async fn test_failed_initial_read_keeps_stored_totals() {
        let backend = MemoryStore::with_record(record(json!({
            "monthlyUsage": 3_000_000_000u64,
            "lastResetDate": "2026-10-19",
        })));
        backend.fail_reads(true);
        let store = open(backend.clone()).await;
        backend.fail_reads(false);

        let counters = store.observe(date(2026, 10, 19), 10).await;
        assert_eq!(counters.monthly, 3_000_000_010);
        assert_eq!(backend.dump().await["monthlyUsage"], json!(3_000_000_010u64));
    }

    #[tokio::test]
    async fn test_unreadable_record_is_never_overwritten() {
        let backend = MemoryStore::with_record(record(json!({
            "dailyUsage": 7, "weeklyUsage": 7, "monthlyUsage": 7,
            "lastResetDate": "2026-10-18",
        })));
        backend.fail_reads(true);
        let store = open(backend.clone()).await;

        assert_eq!(store.observe(date(2026, 10, 19), 10).await.daily, 10);
        assert_eq!(store.apply_rollover(date(2026, 10, 19)).await.1, None);
        assert_eq!(backend.write_count(), 0);

        backend.fail_reads(false);
        let (counters, archived) = store.apply_rollover(date(2026, 10, 19)).await;
        assert_eq!(archived, Some(HistoryEntry::new(date(2026, 10, 18), 7)));
        assert_eq!(counters, UsageCounters { daily: 10, weekly: 17, monthly: 17 });
        assert_eq!(backend.dump().await["dailyUsage"], json!(10));
    }

    #[tokio::test]
    async fn test_mutation_picks_up_external_reset() {
        let backend = MemoryStore::with_record(record(json!({"lastResetDate": "2026-10-19"})));
        let store = open(backend.clone()).await;
        let today = date(2026, 10, 19);
        store.observe(today, 500).await;

        backend
            .set(record(json!({"dailyUsage": 0, "weeklyUsage": 0, "monthlyUsage": 0})))
            .await
            .unwrap();

        assert_eq!(store.increment_all(1).await, UsageCounters { daily: 1, weekly: 1, monthly: 1 });
    }

    #[test]
    fn test_from_record_tolerates_bad_fields() {
        let stored = StoredUsage::from_record(&record(json!({
            "dailyUsage": "lots",
            "weeklyUsage": 1536.0,
            "monthlyUsage": -4,
            "lastResetDate": "not a date",
            "usageHistory": [{"date": "2026-10-17", "usage": 3}, {"date": 5}],
        })));
        assert_eq!(stored.counters, UsageCounters { daily: 0, weekly: 1536, monthly: 0 });
        assert!(stored.marker.is_none());
        assert_eq!(stored.history.len(), 1);
    }

    #[test]
    fn test_from_record_legacy_marker() {
        let stored = StoredUsage::from_record(&record(json!({"lastResetDate": "Mon Oct 19 2026"})));
        assert_eq!(stored.marker, Some(date(2026, 10, 19)));
    }
}

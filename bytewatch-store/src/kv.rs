//! Key/value persistence substrate.
//!
//! Mirrors the host's storage contract: `get` a set of keys, `set` a partial
//! record. Neither implementation offers multi-call transactions, so callers
//! serialize their own read-modify-write cycles.

use serde_json::{Map, Value};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::error::StoreError;
use crate::persistence::save_json;

/// A flat JSON object of stored keys.
pub type Record = Map<String, Value>;

/// Storage keys used by the counter store.
pub mod keys {
    /// Bytes used today.
    pub const DAILY_USAGE: &str = "dailyUsage";
    /// Bytes used this week.
    pub const WEEKLY_USAGE: &str = "weeklyUsage";
    /// Bytes used this month.
    pub const MONTHLY_USAGE: &str = "monthlyUsage";
    /// Date of the last rollover check.
    pub const LAST_RESET_DATE: &str = "lastResetDate";
    /// Archived daily totals.
    pub const USAGE_HISTORY: &str = "usageHistory";

    /// Every key the counter store owns.
    pub const ALL: &[&str] = &[
        DAILY_USAGE,
        WEEKLY_USAGE,
        MONTHLY_USAGE,
        LAST_RESET_DATE,
        USAGE_HISTORY,
    ];
}

/// Async key/value storage.
pub trait KeyValueStore: Send + Sync {
    /// Reads the given keys. Missing keys are absent from the result.
    fn get(&self, keys: &[&str]) -> impl Future<Output = Result<Record, StoreError>> + Send;

    /// Merges `partial` into the stored record.
    fn set(&self, partial: Record) -> impl Future<Output = Result<(), StoreError>> + Send;
}

fn select(record: &Record, keys: &[&str]) -> Record {
    keys.iter()
        .filter_map(|k| record.get(*k).map(|v| ((*k).to_string(), v.clone())))
        .collect()
}

// ============================================================================
// JSON File Store
// ============================================================================

/// Stores the whole record as one JSON object file.
///
/// Writes go through the atomic temp-file + rename helper.
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    /// Creates a store backed by `path`. The file is created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Backing file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_record(&self) -> Result<Record, StoreError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No usage record yet");
                return Ok(Record::new());
            }
            Err(e) => return Err(e.into()),
        };

        if content.trim().is_empty() {
            return Ok(Record::new());
        }

        match serde_json::from_str::<Value>(&content)? {
            Value::Object(record) => Ok(record),
            other => Err(StoreError::Parse(format!(
                "expected a JSON object in {}, found {}",
                self.path.display(),
                type_name(&other)
            ))),
        }
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

impl KeyValueStore for JsonFileStore {
    async fn get(&self, keys: &[&str]) -> Result<Record, StoreError> {
        let record = self.read_record().await?;
        Ok(select(&record, keys))
    }

    async fn set(&self, partial: Record) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;

        let mut record = match self.read_record().await {
            Ok(record) => record,
            Err(e @ (StoreError::Parse(_) | StoreError::Serialization(_))) => {
                warn!(path = %self.path.display(), error = %e, "Replacing unreadable usage record");
                Record::new()
            }
            Err(e) => return Err(e),
        };
        record.extend(partial);
        save_json(&self.path, &Value::Object(record)).await
    }
}

// ============================================================================
// Memory Store
// ============================================================================

#[derive(Debug, Default)]
struct MemoryInner {
    record: Mutex<Record>,
    last_write: Mutex<Option<Record>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
    writes: AtomicUsize,
}

/// In-memory store with injectable failures. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<MemoryInner>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding `record`.
    pub fn with_record(record: Record) -> Self {
        Self {
            inner: Arc::new(MemoryInner {
                record: Mutex::new(record),
                ..MemoryInner::default()
            }),
        }
    }

    /// Makes every subsequent `get` fail (or succeed again).
    pub fn fail_reads(&self, fail: bool) {
        self.inner.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Makes every subsequent `set` fail (or succeed again).
    pub fn fail_writes(&self, fail: bool) {
        self.inner.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful writes.
    pub fn write_count(&self) -> usize {
        self.inner.writes.load(Ordering::SeqCst)
    }

    /// The partial record of the last successful write.
    pub async fn last_write(&self) -> Option<Record> {
        self.inner.last_write.lock().await.clone()
    }

    /// A copy of everything stored.
    pub async fn dump(&self) -> Record {
        self.inner.record.lock().await.clone()
    }
}

impl KeyValueStore for MemoryStore {
    async fn get(&self, keys: &[&str]) -> Result<Record, StoreError> {
        if self.inner.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::ReadFailed("injected read failure".into()));
        }
        let record = self.inner.record.lock().await;
        Ok(select(&record, keys))
    }

    async fn set(&self, partial: Record) -> Result<(), StoreError> {
        if self.inner.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::WriteRejected("injected write failure".into()));
        }
        self.inner.record.lock().await.extend(partial.clone());
        *self.inner.last_write.lock().await = Some(partial);
        self.inner.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # ByteWatch Store
//!
//! Persistence for the ByteWatch usage accounting core.
//!
//! This crate provides:
//!
//! - **KeyValueStore**: The get/set substrate, file-backed or in memory
//! - **CounterStore**: Serialized owner of counters, marker and history
//! - **SettingsStore**: User preferences with persistence
//! - **Persistence**: Atomic, owner-only JSON file helpers
//!
//! ## Usage
//!
//! ```ignore
//! use bytewatch_store::{CounterStore, CounterStoreOptions, JsonFileStore};
//!
//! let backend = JsonFileStore::new(bytewatch_store::default_data_path());
//! let store = CounterStore::open(backend, CounterStoreOptions::default()).await;
//!
//! let today = chrono::Local::now().date_naive();
//! let counters = store.observe(today, 50_000).await;
//! println!("{} bytes today", counters.daily);
//! ```

pub mod counter_store;
pub mod error;
pub mod history;
pub mod kv;
pub mod persistence;
pub mod settings_store;

pub use counter_store::{CounterStore, CounterStoreOptions, StoredUsage};
pub use error::StoreError;
pub use history::{DEFAULT_HISTORY_CAP, UsageHistory};
pub use kv::{JsonFileStore, KeyValueStore, MemoryStore, Record, keys};
pub use persistence::{
    default_config_dir, default_data_dir, default_data_path, default_settings_path, load_json,
    load_json_or_default, save_json,
};
pub use settings_store::{DEFAULT_POLL_INTERVAL_SECS, LogLevel, Settings, SettingsStore};

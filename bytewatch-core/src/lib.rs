// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # `ByteWatch` Core
//!
//! Core types and pure accounting logic for `ByteWatch`.
//!
//! Nothing in this crate performs I/O. The store and monitor crates build
//! on it.
//!
//! ## Key Types
//!
//! ### Counters
//! - [`UsageCounters`] - Daily/weekly/monthly byte totals
//! - [`Period`] - One of the three accounting windows
//! - [`HistoryEntry`] - One archived day
//! - [`LimitConfig`] - Per-period limits in MB
//!
//! ### Observations
//! - [`NetworkObservation`] - One observed request or response
//! - [`ResourceCategory`] - Host resource type
//!
//! ### Policy
//! - [`estimate`] - Bytes for one observation
//! - [`decide`] - Rollover decision for a date change
//! - [`evaluate`] - Limit alerts for a counter snapshot

pub mod alerts;
pub mod error;
pub mod estimator;
pub mod format;
pub mod models;
pub mod rollover;
pub mod traits;

pub use error::CoreError;

pub use models::{
    // Counters
    BYTES_PER_MB,
    HistoryEntry,
    LimitConfig,
    Period,
    UsageCounters,
    // Dates
    format_date,
    parse_date,
    // Limits
    parse_limit_input,
    // Observations
    Direction,
    NetworkObservation,
    ResourceCategory,
};

pub use alerts::{Alert, evaluate};
pub use estimator::estimate;
pub use format::{UsageLevel, badge_text, format_usage, format_usage_mb, progress_percent};
pub use rollover::{RolloverDecision, WeekStart, decide};

pub use traits::{Clock, FixedClock, LocalClock};

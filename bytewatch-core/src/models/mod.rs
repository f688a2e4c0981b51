//! Domain models for ByteWatch.
//!
//! ## Submodules
//!
//! - [`usage`] - Rolling counters and the period vocabulary
//! - [`history`] - Archived daily totals and date encoding
//! - [`limits`] - User-configured limits in MB
//! - [`observation`] - Ephemeral network observations

mod history;
mod limits;
mod observation;
mod usage;

pub use history::{DATE_FORMAT, HistoryEntry, LEGACY_DATE_FORMAT, format_date, parse_date};
pub use limits::{
    DEFAULT_DAILY_LIMIT_MB, DEFAULT_MONTHLY_LIMIT_MB, DEFAULT_WEEKLY_LIMIT_MB, LimitConfig,
    parse_limit_input,
};
pub use observation::{CONTENT_LENGTH_HEADER, Direction, NetworkObservation, ResourceCategory};
pub use usage::{BYTES_PER_MB, Period, UsageCounters};

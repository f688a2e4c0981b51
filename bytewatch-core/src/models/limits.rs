//! User-configured usage limits.

use std::num::{IntErrorKind, ParseIntError};

use serde::{Deserialize, Serialize};

use super::usage::Period;
use crate::error::CoreError;

/// Default daily limit in MB.
pub const DEFAULT_DAILY_LIMIT_MB: u64 = 1000;
/// Default weekly limit in MB.
pub const DEFAULT_WEEKLY_LIMIT_MB: u64 = 5000;
/// Default monthly limit in MB.
pub const DEFAULT_MONTHLY_LIMIT_MB: u64 = 20000;

/// Per-period limits in megabytes.
///
/// Independent of the counters: changing a limit never touches usage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LimitConfig {
    /// Daily limit (MB).
    pub daily_limit: u64,
    /// Weekly limit (MB).
    pub weekly_limit: u64,
    /// Monthly limit (MB).
    pub monthly_limit: u64,
}

impl Default for LimitConfig {
    fn default() -> Self {
        Self {
            daily_limit: DEFAULT_DAILY_LIMIT_MB,
            weekly_limit: DEFAULT_WEEKLY_LIMIT_MB,
            monthly_limit: DEFAULT_MONTHLY_LIMIT_MB,
        }
    }
}

impl LimitConfig {
    /// Returns the limit for a period in MB.
    pub fn get(&self, period: Period) -> u64 {
        match period {
            Period::Daily => self.daily_limit,
            Period::Weekly => self.weekly_limit,
            Period::Monthly => self.monthly_limit,
        }
    }

    /// Sets the limit for a period.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidLimit` for zero; the previous value is
    /// kept.
    pub fn set(&mut self, period: Period, megabytes: u64) -> Result<(), CoreError> {
        if megabytes == 0 {
            return Err(CoreError::InvalidLimit(format!(
                "{period} limit must be a positive number of MB"
            )));
        }
        match period {
            Period::Daily => self.daily_limit = megabytes,
            Period::Weekly => self.weekly_limit = megabytes,
            Period::Monthly => self.monthly_limit = megabytes,
        }
        Ok(())
    }

    /// Parses user input and applies it to a period.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidLimit` if the input is not a positive
    /// integer. Nothing changes in that case.
    pub fn set_from_input(&mut self, period: Period, input: &str) -> Result<u64, CoreError> {
        let value = parse_limit_input(input)?;
        self.set(period, value)?;
        Ok(value)
    }

    /// Replaces zero entries (e.g. from a hand-edited file) with defaults.
    #[must_use]
    pub fn sanitized(self) -> Self {
        let defaults = Self::default();
        Self {
            daily_limit: nonzero_or(self.daily_limit, defaults.daily_limit),
            weekly_limit: nonzero_or(self.weekly_limit, defaults.weekly_limit),
            monthly_limit: nonzero_or(self.monthly_limit, defaults.monthly_limit),
        }
    }
}

fn nonzero_or(value: u64, fallback: u64) -> u64 {
    if value == 0 { fallback } else { value }
}

/// Parses a limit typed by the user.
///
/// Only whole positive numbers are accepted. Zero, negatives, fractions and
/// trailing garbage (`"12abc"`) are rejected.
///
/// # Errors
///
/// Returns `CoreError::InvalidLimit` describing the rejected input.
pub fn parse_limit_input(input: &str) -> Result<u64, CoreError> {
    let trimmed = input.trim();
    if let Some(magnitude) = trimmed.strip_prefix('-') {
        if !magnitude.is_empty() && magnitude.bytes().all(|b| b.is_ascii_digit()) {
            return Err(CoreError::InvalidLimit(format!(
                "limit must be positive, got {trimmed}"
            )));
        }
    }
    let value: u64 = trimmed.parse().map_err(|e: ParseIntError| match e.kind() {
        IntErrorKind::PosOverflow => CoreError::InvalidLimit(format!("out of range: {trimmed}")),
        _ => CoreError::InvalidLimit(format!("not a whole number: {trimmed:?}")),
    })?;
    if value == 0 {
        return Err(CoreError::InvalidLimit("limit must be positive, got 0".into()));
    }
    Ok(value)
}

//! Usage counter types.
//!
//! This module contains the rolling counters and the period vocabulary
//! shared by the store, the alert evaluator and the views:
//! - [`UsageCounters`] - Daily/weekly/monthly byte totals
//! - [`Period`] - Names one of the three accounting windows

use serde::{Deserialize, Serialize};

/// Bytes in one mebibyte. Limits and displays are expressed in this unit.
pub const BYTES_PER_MB: u64 = 1024 * 1024;

// ============================================================================
// Period
// ============================================================================

/// One of the three accounting windows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    /// Calendar day.
    Daily,
    /// Calendar week (see [`crate::WeekStart`]).
    Weekly,
    /// Calendar month.
    Monthly,
}

impl Period {
    /// All periods in display order.
    pub fn all() -> &'static [Period] {
        &[Period::Daily, Period::Weekly, Period::Monthly]
    }

    /// Capitalized name, as used in alert messages.
    pub fn display_name(&self) -> &'static str {
        match self {
            Period::Daily => "Daily",
            Period::Weekly => "Weekly",
            Period::Monthly => "Monthly",
        }
    }

    /// Label for the current window of this period.
    pub fn window_label(&self) -> &'static str {
        match self {
            Period::Daily => "Today",
            Period::Weekly => "This Week",
            Period::Monthly => "This Month",
        }
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Period::Daily => write!(f, "daily"),
            Period::Weekly => write!(f, "weekly"),
            Period::Monthly => write!(f, "monthly"),
        }
    }
}

impl std::str::FromStr for Period {
    type Err = crate::CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "daily" | "day" | "d" => Ok(Period::Daily),
            "weekly" | "week" | "w" => Ok(Period::Weekly),
            "monthly" | "month" | "m" => Ok(Period::Monthly),
            other => Err(crate::CoreError::InvalidData(format!(
                "unknown period: {other}"
            ))),
        }
    }
}

// ============================================================================
// Usage Counters
// ============================================================================

/// Rolling byte counters for the three accounting windows.
///
/// Counters only grow between resets. Field names on the wire match the
/// storage keys (`dailyUsage`, `weeklyUsage`, `monthlyUsage`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageCounters {
    /// Bytes used today.
    #[serde(rename = "dailyUsage", default)]
    pub daily: u64,
    /// Bytes used this week.
    #[serde(rename = "weeklyUsage", default)]
    pub weekly: u64,
    /// Bytes used this month.
    #[serde(rename = "monthlyUsage", default)]
    pub monthly: u64,
}

impl UsageCounters {
    /// Creates zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the counter for a period.
    pub fn get(&self, period: Period) -> u64 {
        match period {
            Period::Daily => self.daily,
            Period::Weekly => self.weekly,
            Period::Monthly => self.monthly,
        }
    }

    /// Adds `bytes` to every window. Saturates instead of wrapping.
    pub fn add(&mut self, bytes: u64) {
        self.daily = self.daily.saturating_add(bytes);
        self.weekly = self.weekly.saturating_add(bytes);
        self.monthly = self.monthly.saturating_add(bytes);
    }

    /// Zeroes the counter for a period.
    pub fn reset(&mut self, period: Period) {
        match period {
            Period::Daily => self.daily = 0,
            Period::Weekly => self.weekly = 0,
            Period::Monthly => self.monthly = 0,
        }
    }

    /// Returns the counter for a period in MB.
    #[allow(clippy::cast_precision_loss)]
    pub fn megabytes(&self, period: Period) -> f64 {
        self.get(period) as f64 / BYTES_PER_MB as f64
    }

    /// Returns true if every counter is zero.
    pub fn is_zero(&self) -> bool {
        self.daily == 0 && self.weekly == 0 && self.monthly == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_hits_every_window() {
        let mut counters = UsageCounters::new();
        counters.add(10);
        counters.add(5);
        assert_eq!(counters.daily, 15);
        assert_eq!(counters.weekly, 15);
        assert_eq!(counters.monthly, 15);
    }

    #[test]
    fn test_add_saturates() {
        let mut counters = UsageCounters {
            daily: u64::MAX - 1,
            weekly: 0,
            monthly: 0,
        };
        counters.add(10);
        assert_eq!(counters.daily, u64::MAX);
        assert_eq!(counters.weekly, 10);
    }

    #[test]
    fn test_reset_single_period() {
        let mut counters = UsageCounters {
            daily: 1,
            weekly: 2,
            monthly: 3,
        };
        counters.reset(Period::Weekly);
        assert_eq!(counters.get(Period::Daily), 1);
        assert_eq!(counters.get(Period::Weekly), 0);
        assert_eq!(counters.get(Period::Monthly), 3);
    }

    #[test]
    fn test_megabytes() {
        let counters = UsageCounters {
            daily: 2 * BYTES_PER_MB,
            weekly: BYTES_PER_MB / 2,
            monthly: 0,
        };
        assert!((counters.megabytes(Period::Daily) - 2.0).abs() < f64::EPSILON);
        assert!((counters.megabytes(Period::Weekly) - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_period_parse() {
        assert_eq!("Daily".parse::<Period>().unwrap(), Period::Daily);
        assert_eq!("week".parse::<Period>().unwrap(), Period::Weekly);
        assert_eq!(" m ".parse::<Period>().unwrap(), Period::Monthly);
        assert!("yearly".parse::<Period>().is_err());
    }
}

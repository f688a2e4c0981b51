//! Limit alerts.
//!
//! Alerts are derived, never stored: a view recomputes the full set on every
//! counter update and every limit change.

use serde::{Deserialize, Serialize};

use crate::models::{LimitConfig, Period, UsageCounters};

/// Fraction of a limit above which an alert is raised.
pub const ALERT_THRESHOLD: f64 = 0.9;

/// One "limit almost reached" alert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    /// Period whose limit is close.
    pub period: Period,
    /// Rounded usage as a percentage of the limit. May exceed 100.
    pub percent: u64,
}

impl std::fmt::Display for Alert {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} limit almost reached: {}%",
            self.period.display_name(),
            self.percent
        )
    }
}

/// Checks a single period. `usage_mb` must be strictly above 90% of the
/// limit to alert.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
pub fn check_period(period: Period, usage_mb: f64, limit_mb: u64) -> Option<Alert> {
    if limit_mb == 0 {
        return None;
    }
    let limit = limit_mb as f64;
    if usage_mb > ALERT_THRESHOLD * limit {
        let percent = (usage_mb / limit * 100.0).round().max(0.0) as u64;
        Some(Alert { period, percent })
    } else {
        None
    }
}

/// Evaluates every period in order daily, weekly, monthly.
pub fn evaluate(counters: &UsageCounters, limits: &LimitConfig) -> Vec<Alert> {
    Period::all()
        .iter()
        .filter_map(|&period| check_period(period, counters.megabytes(period), limits.get(period)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BYTES_PER_MB;

    #[test]
    fn test_exactly_ninety_percent_is_quiet() {
        let counters = UsageCounters {
            daily: 900 * BYTES_PER_MB,
            weekly: 0,
            monthly: 0,
        };
        assert!(evaluate(&counters, &LimitConfig::default()).is_empty());
    }

    #[test]
    fn test_just_over_ninety_percent_alerts() {
        // 900.01 MB
        let counters = UsageCounters {
            daily: 943_728_231,
            weekly: 0,
            monthly: 0,
        };
        let alerts = evaluate(&counters, &LimitConfig::default());
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].to_string(), "Daily limit almost reached: 90%");
    }

    #[test]
    fn test_order_and_messages() {
        let counters = UsageCounters {
            daily: 950 * BYTES_PER_MB,
            weekly: 4800 * BYTES_PER_MB,
            monthly: 19_000 * BYTES_PER_MB,
        };
        let messages: Vec<String> = evaluate(&counters, &LimitConfig::default())
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(
            messages,
            vec![
                "Daily limit almost reached: 95%",
                "Weekly limit almost reached: 96%",
                "Monthly limit almost reached: 95%",
            ]
        );
    }

    #[test]
    fn test_over_limit_keeps_counting() {
        let alert = check_period(Period::Weekly, 7500.0, 5000).unwrap();
        assert_eq!(alert.percent, 150);
    }

    #[test]
    fn test_zero_limit_never_alerts() {
        assert!(check_period(Period::Daily, 10.0, 0).is_none());
    }
}

//! Display helpers shared by the badge and the views.

use serde::{Deserialize, Serialize};

use crate::models::BYTES_PER_MB;

/// Converts bytes to MB.
#[allow(clippy::cast_precision_loss)]
pub fn bytes_to_mb(bytes: u64) -> f64 {
    bytes as f64 / BYTES_PER_MB as f64
}

/// Formats an MB amount for display: `"512.3 MB"`, or `"1.50 GB"` from
/// 1024 MB up.
pub fn format_usage_mb(usage_mb: f64) -> String {
    if usage_mb >= 1024.0 {
        format!("{:.2} GB", usage_mb / 1024.0)
    } else {
        format!("{usage_mb:.1} MB")
    }
}

/// Formats a byte count for display.
pub fn format_usage(bytes: u64) -> String {
    format_usage_mb(bytes_to_mb(bytes))
}

/// Short badge text for the daily counter: `"12.3MB"`, or `"1.2GB"` once the
/// rounded MB figure reaches 1000.
pub fn badge_text(daily_bytes: u64) -> String {
    let rounded_mb = (bytes_to_mb(daily_bytes) * 10.0).round() / 10.0;
    if rounded_mb >= 1000.0 {
        format!("{:.1}GB", rounded_mb / 1024.0)
    } else {
        format!("{rounded_mb:.1}MB")
    }
}

/// Usage as a percentage of a limit, clamped to `0..=100`.
pub fn progress_percent(usage_mb: f64, limit_mb: u64) -> f64 {
    if limit_mb == 0 {
        return 100.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let percent = usage_mb / limit_mb as f64 * 100.0;
    percent.clamp(0.0, 100.0)
}

/// Display band for a progress bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UsageLevel {
    /// Up to 70%.
    Normal,
    /// Above 70%.
    Warning,
    /// Above 90%.
    Critical,
}

impl UsageLevel {
    /// Band for a progress percentage.
    pub fn from_percent(percent: f64) -> Self {
        if percent > 90.0 {
            UsageLevel::Critical
        } else if percent > 70.0 {
            UsageLevel::Warning
        } else {
            UsageLevel::Normal
        }
    }
}

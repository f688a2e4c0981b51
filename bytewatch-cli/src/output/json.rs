//! JSON output formatting.

use anyhow::Result;
use bytewatch_core::{HistoryEntry, Period, UsageCounters, UsageLevel, format::bytes_to_mb};
use bytewatch_monitor::{ConnectionStatus, UsageView};
use chrono::{DateTime, Local};
use serde::{Serialize, Serializer};

// ============================================================================
// Output Types
// ============================================================================

/// JSON output for the usage view.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageOutput {
    pub status: ConnectionStatus,
    pub badge: String,
    pub counters: UsageCounters,
    pub periods: Vec<PeriodOutput>,
    pub alerts: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "serialize_datetime_opt")]
    pub updated_at: Option<DateTime<Local>>,
}

/// A single period.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodOutput {
    pub period: Period,
    pub usage_bytes: u64,
    pub usage_mb: f64,
    pub limit_mb: u64,
    pub percent: f64,
    pub level: UsageLevel,
}

/// One archived day.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryOutput {
    pub date: String,
    pub usage_bytes: u64,
    pub usage_mb: f64,
}

// ============================================================================
// Serialization helpers
// ============================================================================

fn serialize_datetime_opt<S>(dt: &Option<DateTime<Local>>, s: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match dt {
        Some(dt) => s.serialize_str(&dt.to_rfc3339()),
        None => s.serialize_none(),
    }
}

// ============================================================================
// JSON Formatter
// ============================================================================

/// JSON formatter.
pub struct JsonFormatter {
    pretty: bool,
}

impl JsonFormatter {
    /// Creates a new JSON formatter.
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    /// Formats any serializable value.
    pub fn format<T: Serialize>(&self, data: &T) -> Result<String> {
        let json = if self.pretty {
            serde_json::to_string_pretty(data)?
        } else {
            serde_json::to_string(data)?
        };
        Ok(json)
    }

    /// Formats the usage view.
    pub fn format_view(&self, view: &UsageView) -> Result<String> {
        self.format(&self.view_to_output(view))
    }

    /// Converts a view to output.
    fn view_to_output(&self, view: &UsageView) -> UsageOutput {
        let periods = view
            .rows()
            .into_iter()
            .map(|row| PeriodOutput {
                period: row.period,
                usage_bytes: view.counters.get(row.period),
                usage_mb: row.usage_mb,
                limit_mb: row.limit_mb,
                percent: row.percent,
                level: row.level,
            })
            .collect();

        UsageOutput {
            status: view.status,
            badge: view.badge(),
            counters: view.counters,
            periods,
            alerts: view.alerts.iter().map(ToString::to_string).collect(),
            updated_at: view.updated_at,
        }
    }

    /// Formats archived days.
    pub fn format_history(&self, entries: &[HistoryEntry]) -> Result<String> {
        let outputs: Vec<HistoryOutput> = entries
            .iter()
            .map(|entry| HistoryOutput {
                date: bytewatch_core::format_date(entry.date),
                usage_bytes: entry.usage,
                usage_mb: bytes_to_mb(entry.usage),
            })
            .collect();

        self.format(&outputs)
    }
}

// ============================================================================
// Tests
// ============================================================================

//! Archived daily totals and the reset marker date format.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Storage format for dates (`2026-10-19`).
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Legacy storage format (`Mon Oct 19 2026`), still accepted when reading.
pub const LEGACY_DATE_FORMAT: &str = "%a %b %d %Y";

/// Parses a stored marker or history date.
///
/// Accepts the ISO form and the legacy weekday form. Returns `None` for
/// anything else, which callers treat as a missing marker.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .or_else(|_| NaiveDate::parse_from_str(raw, LEGACY_DATE_FORMAT))
        .ok()
}

/// Formats a date in the storage format.
pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// One archived day: the total that was in the daily counter when the day
/// ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// The day this total belongs to.
    #[serde(serialize_with = "serialize_date", deserialize_with = "deserialize_date")]
    pub date: NaiveDate,
    /// Bytes used on that day.
    pub usage: u64,
}

impl HistoryEntry {
    /// Creates a new entry.
    pub fn new(date: NaiveDate, usage: u64) -> Self {
        Self { date, usage }
    }
}

fn serialize_date<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format_date(*date))
}

fn deserialize_date<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
    let raw = String::deserialize(deserializer)?;
    parse_date(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid date: {raw}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_iso_date() {
        assert_eq!(
            parse_date("2026-10-19"),
            NaiveDate::from_ymd_opt(2026, 10, 19)
        );
    }

    #[test]
    fn test_parse_legacy_date() {
        assert_eq!(
            parse_date("Mon Oct 19 2026"),
            NaiveDate::from_ymd_opt(2026, 10, 19)
        );
    }

    #[test]
    fn test_parse_garbage_date() {
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("yesterday"), None);
        assert_eq!(parse_date("2026-13-40"), None);
    }

    #[test]
    fn test_entry_json_shape() {
        let entry = HistoryEntry::new(NaiveDate::from_ymd_opt(2026, 1, 2).unwrap(), 42);
        let json = serde_json::to_value(entry).unwrap();
        assert_eq!(json, serde_json::json!({"date": "2026-01-02", "usage": 42}));
    }

    #[test]
    fn test_entry_reads_legacy_date() {
        let entry: HistoryEntry =
            serde_json::from_str(r#"{"date":"Fri Jan 02 2026","usage":7}"#).unwrap();
        assert_eq!(entry.date, NaiveDate::from_ymd_opt(2026, 1, 2).unwrap());
        assert_eq!(entry.usage, 7);
    }
}

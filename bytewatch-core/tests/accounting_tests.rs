//! Integration tests for the pure accounting pieces working together.

use bytewatch_core::{
    BYTES_PER_MB, Direction, HistoryEntry, LimitConfig, NetworkObservation, ResourceCategory,
    UsageCounters, WeekStart, decide, estimate, evaluate,
};
use chrono::NaiveDate;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn test_header_observation_flows_into_counters() {
    let headers = [("CONTENT-LENGTH", "2097152")];
    let obs = NetworkObservation::from_headers(
        "https://cdn.example.com/video.mp4",
        ResourceCategory::from_tag("media"),
        Direction::Response,
        headers,
    );

    let mut counters = UsageCounters::new();
    counters.add(estimate(&obs));
    assert_eq!(counters.daily, 2 * BYTES_PER_MB);
    assert!(evaluate(&counters, &LimitConfig::default()).is_empty());
}

#[test]
fn test_week_of_days_then_month_end() {
    let mut counters = UsageCounters::new();
    let mut marker = Some(date(2026, 10, 25));
    let mut archived = Vec::new();

    for day in 25..=31 {
        let today = date(2026, 10, day);
        let decision = decide(today, marker, counters.daily, WeekStart::Sunday);
        archived.extend(decision.archive_entry);
        decision.apply(&mut counters);
        marker = Some(decision.new_marker);
        counters.add(BYTES_PER_MB);
    }

    assert_eq!(counters.weekly, 7 * BYTES_PER_MB);
    assert_eq!(counters.monthly, 7 * BYTES_PER_MB);
    assert_eq!(archived.len(), 6);
    assert_eq!(archived[0], HistoryEntry::new(date(2026, 10, 25), BYTES_PER_MB));

    let decision = decide(date(2026, 11, 1), marker, counters.daily, WeekStart::Sunday);
    decision.apply(&mut counters);
    assert!(counters.is_zero());
    assert_eq!(
        decision.archive_entry,
        Some(HistoryEntry::new(date(2026, 10, 31), BYTES_PER_MB))
    );
}

#[test]
fn test_alerts_follow_limit_changes() {
    let counters = UsageCounters {
        daily: 100 * BYTES_PER_MB,
        weekly: 100 * BYTES_PER_MB,
        monthly: 100 * BYTES_PER_MB,
    };
    let mut limits = LimitConfig::default();
    assert!(evaluate(&counters, &limits).is_empty());

    limits.set_from_input(bytewatch_core::Period::Daily, "105").unwrap();
    let alerts = evaluate(&counters, &limits);
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].to_string(), "Daily limit almost reached: 95%");
}

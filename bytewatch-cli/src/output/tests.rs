//! CLI output formatting tests.
//!
//! These tests verify that CLI output is correctly formatted for both
//! text and JSON output modes.

#[cfg(test)]
mod text_formatter_tests {
    use super::super::text::TextFormatter;
    use bytewatch_core::{BYTES_PER_MB, HistoryEntry, LimitConfig, UsageCounters};
    use bytewatch_monitor::{ConnectionStatus, FeedStats, UsageView};
    use bytewatch_store::Settings;
    use chrono::NaiveDate;

    fn view(daily_mb: u64, weekly_mb: u64, monthly_mb: u64) -> UsageView {
        let mut view = UsageView::new(LimitConfig::default());
        view.apply_counters(UsageCounters {
            daily: daily_mb * BYTES_PER_MB,
            weekly: weekly_mb * BYTES_PER_MB,
            monthly: monthly_mb * BYTES_PER_MB,
        });
        view
    }

    #[test]
    fn test_progress_bar_empty() {
        let formatter = TextFormatter::new(false);
        assert_eq!(formatter.progress_bar(0.0), "░░░░░░░░░░");
    }

    #[test]
    fn test_progress_bar_full() {
        let formatter = TextFormatter::new(false);
        assert_eq!(formatter.progress_bar(100.0), "██████████");
    }

    #[test]
    fn test_progress_bar_boundary_values() {
        let formatter = TextFormatter::new(false);

        let test_cases = vec![
            (0.0, "░░░░░░░░░░"),
            (10.0, "█░░░░░░░░░"),
            (25.0, "███░░░░░░░"), // 2.5 rounds to 3 blocks
            (50.0, "█████░░░░░"),
            (75.0, "████████░░"), // 7.5 rounds to 8 blocks
            (100.0, "██████████"),
            (250.0, "██████████"),
        ];

        for (percent, expected) in test_cases {
            let bar = formatter.progress_bar(percent);
            assert_eq!(bar, expected, "Failed for {percent}%");
        }
    }

    #[test]
    fn test_progress_bar_with_colors() {
        let formatter = TextFormatter::new(true);

        let bar = formatter.progress_bar(95.0);
        assert!(bar.contains("\x1b[31m"), "Should be red above 90%");

        let bar = formatter.progress_bar(80.0);
        assert!(bar.contains("\x1b[33m"), "Should be yellow above 70%");

        let bar = formatter.progress_bar(70.0);
        assert!(bar.contains("\x1b[32m"), "Should be green up to 70%");
    }

    #[test]
    fn test_custom_bar_width() {
        let formatter = TextFormatter::new(false).with_bar_width(4);
        assert_eq!(formatter.progress_bar(50.0), "██░░");
    }

    #[test]
    fn test_format_view_rows() {
        let formatter = TextFormatter::new(false);
        let output = formatter.format_view(&view(500, 2048, 0));

        assert!(output.starts_with("ByteWatch (Connecting...)"));
        assert!(output.contains("Today:"));
        assert!(output.contains("500.0 MB / 1000 MB (50%)"));
        assert!(output.contains("2.00 GB / 5000 MB"));
        assert!(output.contains("Month:"));
        assert!(output.contains("Badge:   500.0MB"));
        assert!(!output.contains('⚠'));
    }

    #[test]
    fn test_format_view_alerts() {
        let formatter = TextFormatter::new(false);
        let output = formatter.format_view(&view(950, 950, 950));
        assert!(output.contains("⚠ Daily limit almost reached: 95%"));
        assert_eq!(output.matches('⚠').count(), 1);
    }

    #[test]
    fn test_format_view_status() {
        let formatter = TextFormatter::new(false);
        let mut live = view(1, 1, 1);
        live.status = ConnectionStatus::LiveTracking;
        assert!(formatter.format_view(&live).starts_with("ByteWatch (Live Tracking)"));
    }

    #[test]
    fn test_no_colors_when_disabled() {
        let formatter = TextFormatter::new(false);
        let output = formatter.format_view(&view(999, 999, 999));
        assert!(!output.contains("\x1b["));
    }

    #[test]
    fn test_format_limits() {
        let formatter = TextFormatter::new(false);
        let output = formatter.format_limits(&LimitConfig::default());
        assert!(output.contains("Daily:   1000 MB"));
        assert!(output.contains("Weekly:  5000 MB"));
        assert!(output.contains("Monthly: 20000 MB"));
    }

    #[test]
    fn test_format_history_empty() {
        let formatter = TextFormatter::new(false);
        assert_eq!(formatter.format_history(&[]), "No history available");
    }

    #[test]
    fn test_format_history_entries() {
        let formatter = TextFormatter::new(false);
        let entries = vec![
            HistoryEntry::new(NaiveDate::from_ymd_opt(2026, 10, 18).unwrap(), 3 * BYTES_PER_MB / 2),
            HistoryEntry::new(NaiveDate::from_ymd_opt(2026, 10, 17).unwrap(), 0),
        ];
        let output = formatter.format_history(&entries);
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("2026-10-18"));
        assert!(lines[0].ends_with("1.5 MB"));
        assert!(lines[1].ends_with("0.0 MB"));
    }

    #[test]
    fn test_format_settings() {
        let formatter = TextFormatter::new(false);
        let output = formatter.format_settings(&Settings::default());
        assert!(output.contains("History kept:  365 days"));
        assert!(output.contains("Poll interval: 2s"));
    }

    #[test]
    fn test_format_feed_stats() {
        let formatter = TextFormatter::new(false);
        let stats = FeedStats {
            lines: 5,
            forwarded: 3,
            skipped: 1,
        };
        assert_eq!(
            formatter.format_feed_stats(&stats),
            "Read 5 lines, accounted 3 observations, skipped 1"
        );
    }
}

//! Period rollover policy.
//!
//! [`decide`] is a pure function of today's date, the stored reset marker and
//! the outgoing daily total. The three checks are independent; on the first
//! day of a month that is also a week start all of them fire together.

use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::models::{HistoryEntry, Period, UsageCounters};

// ============================================================================
// Week Start
// ============================================================================

/// First day of the accounting week.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeekStart {
    /// Weeks begin on Sunday.
    #[default]
    Sunday,
    /// Weeks begin on Monday.
    Monday,
}

impl WeekStart {
    /// Returns the most recent week start on or before `date`.
    pub fn week_start_of(self, date: NaiveDate) -> NaiveDate {
        let offset = match self {
            WeekStart::Sunday => date.weekday().num_days_from_sunday(),
            WeekStart::Monday => date.weekday().num_days_from_monday(),
        };
        date.checked_sub_days(Days::new(u64::from(offset)))
            .unwrap_or(NaiveDate::MIN)
    }
}

impl std::fmt::Display for WeekStart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WeekStart::Sunday => write!(f, "sunday"),
            WeekStart::Monday => write!(f, "monday"),
        }
    }
}

impl std::str::FromStr for WeekStart {
    type Err = crate::CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sunday" | "sun" => Ok(WeekStart::Sunday),
            "monday" | "mon" => Ok(WeekStart::Monday),
            other => Err(crate::CoreError::InvalidConfig(format!(
                "unknown week start: {other}"
            ))),
        }
    }
}

// ============================================================================
// Decision
// ============================================================================

/// What a rollover check wants changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RolloverDecision {
    /// Zero the daily counter.
    pub reset_daily: bool,
    /// Entry to append to history before zeroing the daily counter.
    pub archive_entry: Option<HistoryEntry>,
    /// Zero the weekly counter.
    pub reset_weekly: bool,
    /// Zero the monthly counter.
    pub reset_monthly: bool,
    /// Marker value after the check. Always today.
    pub new_marker: NaiveDate,
    /// No usable marker was stored.
    pub first_run: bool,
}

impl RolloverDecision {
    /// Returns true if nothing needs to change or be persisted.
    pub fn is_noop(&self) -> bool {
        !self.first_run
            && !self.reset_daily
            && !self.reset_weekly
            && !self.reset_monthly
            && self.archive_entry.is_none()
    }

    /// Periods whose counters this decision zeroes.
    pub fn resets(&self) -> Vec<Period> {
        let mut periods = Vec::with_capacity(3);
        if self.reset_daily {
            periods.push(Period::Daily);
        }
        if self.reset_weekly {
            periods.push(Period::Weekly);
        }
        if self.reset_monthly {
            periods.push(Period::Monthly);
        }
        periods
    }

    /// Zeroes the counters this decision resets.
    pub fn apply(&self, counters: &mut UsageCounters) {
        for period in self.resets() {
            counters.reset(period);
        }
    }
}

/// Decides which counters roll over.
///
/// A missing marker is a first run: the marker becomes today and nothing is
/// reset or archived. The outgoing daily total is archived whenever the day
/// changes, including days with zero usage.
pub fn decide(
    today: NaiveDate,
    last_reset: Option<NaiveDate>,
    current_daily: u64,
    week_start: WeekStart,
) -> RolloverDecision {
    let Some(last) = last_reset else {
        return RolloverDecision {
            reset_daily: false,
            archive_entry: None,
            reset_weekly: false,
            reset_monthly: false,
            new_marker: today,
            first_run: true,
        };
    };

    let reset_daily = today != last;
    let archive_entry = reset_daily.then(|| HistoryEntry::new(last, current_daily));
    let reset_weekly = week_start.week_start_of(today) > last;
    let reset_monthly = (today.year(), today.month()) != (last.year(), last.month());

    RolloverDecision {
        reset_daily,
        archive_entry,
        reset_weekly,
        reset_monthly,
        new_marker: today,
        first_run: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_first_run() {
        let decision = decide(date(2026, 10, 19), None, 0, WeekStart::Sunday);
        assert!(decision.first_run);
        assert!(decision.resets().is_empty());
        assert!(decision.archive_entry.is_none());
        assert_eq!(decision.new_marker, date(2026, 10, 19));
        assert!(!decision.is_noop());
    }

    #[test]
    fn test_same_day_is_noop() {
        let today = date(2026, 10, 19);
        let decision = decide(today, Some(today), 500, WeekStart::Sunday);
        assert!(decision.is_noop());
        assert_eq!(decision.new_marker, today);
    }

    #[test]
    fn test_next_day_archives() {
        // Mon -> Tue, same week and month.
        let decision = decide(date(2026, 10, 20), Some(date(2026, 10, 19)), 4096, WeekStart::Sunday);
        assert!(decision.reset_daily);
        assert!(!decision.reset_weekly);
        assert!(!decision.reset_monthly);
        assert_eq!(
            decision.archive_entry,
            Some(HistoryEntry::new(date(2026, 10, 19), 4096))
        );
    }

    #[test]
    fn test_zero_day_still_archived() {
        let decision = decide(date(2026, 10, 20), Some(date(2026, 10, 19)), 0, WeekStart::Sunday);
        assert_eq!(
            decision.archive_entry,
            Some(HistoryEntry::new(date(2026, 10, 19), 0))
        );
    }

    #[test]
    fn test_week_boundary_sunday() {
        // Sat Oct 24 -> Sun Oct 25 2026.
        let decision = decide(date(2026, 10, 25), Some(date(2026, 10, 24)), 1, WeekStart::Sunday);
        assert!(decision.reset_weekly);

        let decision = decide(date(2026, 10, 25), Some(date(2026, 10, 24)), 1, WeekStart::Monday);
        assert!(!decision.reset_weekly);
    }

    #[test]
    fn test_week_boundary_monday() {
        // Sun Oct 25 -> Mon Oct 26 2026.
        let decision = decide(date(2026, 10, 26), Some(date(2026, 10, 25)), 1, WeekStart::Monday);
        assert!(decision.reset_weekly);

        let decision = decide(date(2026, 10, 26), Some(date(2026, 10, 25)), 1, WeekStart::Sunday);
        assert!(!decision.reset_weekly);
    }

    #[test]
    fn test_skipped_days_cross_week() {
        // Thu Oct 22 -> Wed Oct 28: no Sunday observed, still a new week.
        let decision = decide(date(2026, 10, 28), Some(date(2026, 10, 22)), 1, WeekStart::Sunday);
        assert!(decision.reset_weekly);
    }

    #[test]
    fn test_month_and_day_fire_together() {
        // Sat Oct 31 -> Sun Nov 1 2026: day, week and month.
        let decision = decide(date(2026, 11, 1), Some(date(2026, 10, 31)), 9, WeekStart::Sunday);
        assert!(decision.reset_daily);
        assert!(decision.reset_weekly);
        assert!(decision.reset_monthly);
        assert_eq!(decision.resets().len(), 3);
    }

    #[test]
    fn test_same_month_next_year() {
        let decision = decide(date(2027, 10, 19), Some(date(2026, 10, 19)), 0, WeekStart::Sunday);
        assert!(decision.reset_monthly);
        assert!(decision.reset_weekly);
    }

    #[test]
    fn test_clock_moved_backwards() {
        let decision = decide(date(2026, 10, 18), Some(date(2026, 10, 19)), 10, WeekStart::Sunday);
        assert!(decision.reset_daily);
        assert!(!decision.reset_weekly);
        assert!(!decision.reset_monthly);
        assert_eq!(decision.new_marker, date(2026, 10, 18));
    }

    #[test]
    fn test_second_check_same_day_is_noop() {
        let today = date(2026, 11, 1);
        let first = decide(today, Some(date(2026, 10, 31)), 9, WeekStart::Sunday);
        assert!(!first.is_noop());
        let second = decide(today, Some(first.new_marker), 0, WeekStart::Sunday);
        assert!(second.is_noop());
    }

    #[test]
    fn test_apply_zeroes_selected() {
        let mut counters = UsageCounters {
            daily: 1,
            weekly: 2,
            monthly: 3,
        };
        let decision = decide(date(2026, 10, 20), Some(date(2026, 10, 19)), 1, WeekStart::Sunday);
        decision.apply(&mut counters);
        assert_eq!(counters, UsageCounters { daily: 0, weekly: 2, monthly: 3 });
    }
}

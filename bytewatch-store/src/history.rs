//! Bounded daily usage history.

use bytewatch_core::HistoryEntry;
use std::collections::VecDeque;

/// Default number of archived days kept.
pub const DEFAULT_HISTORY_CAP: usize = 365;

/// Chronological, capped log of archived days.
///
/// Oldest entries are evicted first once the cap is exceeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageHistory {
    entries: VecDeque<HistoryEntry>,
    cap: usize,
}

impl Default for UsageHistory {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_CAP)
    }
}

impl UsageHistory {
    /// Creates an empty history. A cap of zero is treated as one.
    pub fn new(cap: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            cap: cap.max(1),
        }
    }

    /// Builds a history from stored entries, trimming to the cap.
    pub fn from_entries(entries: impl IntoIterator<Item = HistoryEntry>, cap: usize) -> Self {
        let mut history = Self::new(cap);
        for entry in entries {
            history.push(entry);
        }
        history
    }

    /// Appends an entry, evicting the oldest past the cap.
    ///
    /// Returns the number of evicted entries.
    pub fn push(&mut self, entry: HistoryEntry) -> usize {
        self.entries.push_back(entry);
        let mut evicted = 0;
        while self.entries.len() > self.cap {
            self.entries.pop_front();
            evicted += 1;
        }
        evicted
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no day has been archived yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries oldest first.
    pub fn entries(&self) -> Vec<HistoryEntry> {
        self.entries.iter().copied().collect()
    }

    /// Up to `n` entries, most recent first.
    pub fn recent(&self, n: usize) -> Vec<HistoryEntry> {
        self.entries.iter().rev().take(n).copied().collect()
    }

    /// The most recently archived entry.
    pub fn latest(&self) -> Option<&HistoryEntry> {
        self.entries.back()
    }
}

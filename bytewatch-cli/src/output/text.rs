//! Text output formatting with progress bars and colors.

use bytewatch_core::{
    HistoryEntry, LimitConfig, Period, UsageLevel, format::bytes_to_mb, format_date,
};
use bytewatch_monitor::{ConnectionStatus, FeedStats, PeriodRow, UsageView};
use bytewatch_store::Settings;

// ============================================================================
// ANSI Colors
// ============================================================================

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const RED: &str = "\x1b[31m";
const CYAN: &str = "\x1b[36m";

// Progress bar characters
const BAR_FULL: char = '█';
const BAR_EMPTY: char = '░';

/// Text formatter with optional colors.
pub struct TextFormatter {
    use_colors: bool,
    bar_width: usize,
}

impl TextFormatter {
    /// Creates a new text formatter.
    pub fn new(use_colors: bool) -> Self {
        Self {
            use_colors,
            bar_width: 10,
        }
    }

    /// Set the progress bar width.
    #[allow(dead_code)]
    pub fn with_bar_width(mut self, width: usize) -> Self {
        self.bar_width = width;
        self
    }

    /// Formats the full usage view.
    pub fn format_view(&self, view: &UsageView) -> String {
        let mut lines = Vec::new();

        lines.push(format!(
            "{} ({})",
            self.bold("ByteWatch"),
            self.format_status(view.status)
        ));

        for row in view.rows() {
            lines.push(self.format_row(&row));
        }

        for alert in &view.alerts {
            lines.push(self.red(&format!("⚠ {alert}")));
        }

        lines.push(format!("Badge:   {}", self.cyan(&view.badge())));

        if let Some(updated_at) = view.updated_at {
            lines.push(self.dim(&format!("Updated {}", updated_at.format("%H:%M:%S"))));
        }

        lines.join("\n")
    }

    /// Formats one period row: label, bar, usage against limit.
    fn format_row(&self, row: &PeriodRow) -> String {
        let bar = self.progress_bar(row.percent);
        let amount = self.color_for_level(
            row.level,
            &format!("{} / {} MB", row.display, row.limit_mb),
        );
        format!(
            "{:<8} {} {} {}",
            format!("{}:", row.label),
            bar,
            amount,
            self.dim(&format!("({:.0}%)", row.percent))
        )
    }

    /// Formats a connection status.
    fn format_status(&self, status: ConnectionStatus) -> String {
        let label = status.to_string();
        match status {
            ConnectionStatus::LiveTracking => self.green(&label),
            ConnectionStatus::Connected => self.cyan(&label),
            ConnectionStatus::Connecting => self.dim(&label),
            ConnectionStatus::Disconnected => self.red(&label),
        }
    }

    /// Formats a progress bar for a percentage of the limit used.
    pub fn progress_bar(&self, percent_used: f64) -> String {
        let clamped = percent_used.clamp(0.0, 100.0);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
        let filled = ((clamped / 100.0) * self.bar_width as f64).round() as usize;
        let empty = self.bar_width.saturating_sub(filled);

        let bar = format!(
            "{}{}",
            BAR_FULL.to_string().repeat(filled),
            BAR_EMPTY.to_string().repeat(empty)
        );

        self.color_for_level(UsageLevel::from_percent(clamped), &bar)
    }

    /// Formats configured limits.
    pub fn format_limits(&self, limits: &LimitConfig) -> String {
        let mut lines = vec![self.bold("Usage Limits"), "─".repeat(40)];
        for &period in Period::all() {
            lines.push(format!(
                "{:<8} {} MB",
                format!("{}:", period.display_name()),
                limits.get(period)
            ));
        }
        lines.join("\n")
    }

    /// Formats archived days, most recent first.
    pub fn format_history(&self, entries: &[HistoryEntry]) -> String {
        if entries.is_empty() {
            return self.dim("No history available");
        }

        entries
            .iter()
            .map(|entry| {
                format!(
                    "{}  {:>10}",
                    format_date(entry.date),
                    format!("{:.1} MB", bytes_to_mb(entry.usage))
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Formats settings.
    pub fn format_settings(&self, settings: &Settings) -> String {
        let mut lines = vec![self.bold("ByteWatch Configuration"), "─".repeat(40), String::new()];
        lines.push(self.format_limits(&settings.limits));
        lines.push(String::new());
        lines.push(format!("History kept:  {} days", settings.history_cap));
        lines.push(format!("Week starts:   {}", settings.week_start));
        lines.push(format!("Poll interval: {}s", settings.poll_interval_secs));
        lines.push(format!("Log level:     {}", settings.log_level));
        lines.join("\n")
    }

    /// Formats a feed summary.
    pub fn format_feed_stats(&self, stats: &FeedStats) -> String {
        let mut line = format!(
            "Read {} lines, accounted {} observations",
            stats.lines, stats.forwarded
        );
        if stats.skipped > 0 {
            line.push_str(&format!(", {}", self.yellow(&format!("skipped {}", stats.skipped))));
        }
        line
    }

    // ========================================================================
    // Color helpers
    // ========================================================================

    fn color_for_level(&self, level: UsageLevel, text: &str) -> String {
        match level {
            UsageLevel::Critical => self.red(text),
            UsageLevel::Warning => self.yellow(text),
            UsageLevel::Normal => self.green(text),
        }
    }

    fn paint(&self, code: &str, text: &str) -> String {
        if self.use_colors {
            format!("{code}{text}{RESET}")
        } else {
            text.to_string()
        }
    }

    /// Bold text.
    pub fn bold(&self, text: &str) -> String {
        self.paint(BOLD, text)
    }

    /// Dim text.
    pub fn dim(&self, text: &str) -> String {
        self.paint(DIM, text)
    }

    /// Green text.
    pub fn green(&self, text: &str) -> String {
        self.paint(GREEN, text)
    }

    /// Yellow text.
    pub fn yellow(&self, text: &str) -> String {
        self.paint(YELLOW, text)
    }

    /// Red text.
    pub fn red(&self, text: &str) -> String {
        self.paint(RED, text)
    }

    /// Cyan text.
    pub fn cyan(&self, text: &str) -> String {
        self.paint(CYAN, text)
    }
}

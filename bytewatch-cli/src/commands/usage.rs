//! Usage command - show current counters against limits.

use anyhow::Result;
use bytewatch_monitor::{ConnectionStatus, UsageView};
use bytewatch_store::SettingsStore;
use tracing::debug;

use super::print_view;
use crate::{Cli, context};

/// Runs the usage command.
///
/// Applies any pending rollover first so a record left over from an earlier
/// day is shown with the correct counters.
pub async fn run(cli: &Cli, settings: &SettingsStore) -> Result<()> {
    let store = context::open_store(cli, settings).await;
    let (counters, archived) = store.apply_rollover(context::today()).await;
    if let Some(entry) = archived {
        debug!(date = %entry.date, usage = entry.usage, "Archived day");
    }

    let mut view = UsageView::new(settings.limits().await);
    view.apply_counters(counters);
    view.status = if store.is_dirty().await {
        ConnectionStatus::Disconnected
    } else {
        ConnectionStatus::Connected
    };

    print_view(&view, cli)
}

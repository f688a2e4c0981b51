//! Ping command - liveness probe over the message bus.

use anyhow::Result;
use bytewatch_monitor::Response;
use bytewatch_store::SettingsStore;

use crate::output::JsonFormatter;
use crate::{Cli, OutputFormat, context};

/// Runs the ping command.
///
/// Starts a monitor on the usage record, sends one ping and waits for the
/// reply.
pub async fn run(cli: &Cli, settings: &SettingsStore) -> Result<()> {
    let (handle, task) = context::spawn_monitor(cli, settings).await;
    let response = handle.ping().await?;
    let counters = handle.snapshot().await?;
    handle.shutdown().await?;
    task.await?;

    match cli.format {
        OutputFormat::Text => match response {
            Response::Pong => println!("pong (daily: {})", bytewatch_core::format_usage(counters.daily)),
        },
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!(
                "{}",
                formatter.format(&serde_json::json!({ "response": response, "counters": counters }))?
            );
        }
    }

    Ok(())
}

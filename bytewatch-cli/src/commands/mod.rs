//! CLI command implementations.

pub mod config;
pub mod history;
pub mod ingest;
pub mod limits;
pub mod ping;
pub mod reset;
pub mod run;
pub mod usage;
pub mod watch;

use bytewatch_monitor::UsageView;

use crate::output::{JsonFormatter, TextFormatter};
use crate::{Cli, OutputFormat};

/// Prints a view in the selected format.
pub(crate) fn print_view(view: &UsageView, cli: &Cli) -> anyhow::Result<()> {
    match cli.format {
        OutputFormat::Text => {
            let formatter = TextFormatter::new(!cli.no_color);
            println!("{}", formatter.format_view(view));
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format_view(view)?);
        }
    }
    Ok(())
}

//! Sync command - Create accounts and rewrite roles

use clap::Args;
use tracing::info;

use crate::commands::Connection;
use crate::config::Config;
use crate::error::CliResult;
use crate::output::render_report;

/// Arguments for the sync command
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Output the report as JSON
    #[arg(long)]
    pub json: bool,
}

/// Execute the sync command
///
/// Per-account failures are part of the report and do not fail the command.
pub async fn execute(args: SyncArgs, config: &Config) -> CliResult<()> {
    let connection = Connection::open(config).await?;
    let result = connection.pipeline(config).run(&connection.session).await;
    connection.close().await;
    let report = result?;

    info!(
        run_id = %report.run_id,
        failed = report.statistics.failed,
        "Sync finished"
    );

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", render_report(&report));
    }

    Ok(())
}

//! Overview command - Show what a sync would change

use clap::Args;

use crate::commands::Connection;
use crate::config::Config;
use crate::error::CliResult;
use crate::output::render_overview;

/// Arguments for the overview command
#[derive(Args, Debug)]
pub struct OverviewArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Execute the overview command
pub async fn execute(args: OverviewArgs, config: &Config) -> CliResult<()> {
    let connection = Connection::open(config).await?;
    let result = connection
        .pipeline(config)
        .overview(&connection.session)
        .await;
    connection.close().await;
    let overview = result?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&overview)?);
    } else {
        print!("{}", render_overview(&overview));
    }

    Ok(())
}

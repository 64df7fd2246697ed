//! ldapsync - Keep Uyuni accounts in line with an LDAP directory
//!
//! This CLI enables administrators to:
//! - Preview which accounts would be created or updated
//! - Create missing accounts and rewrite their roles

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use ldapsync_cli::commands;
use ldapsync_cli::config::{Config, DEFAULT_CONFIG_PATH};
use ldapsync_cli::error::CliResult;
use ldapsync_cli::logging::init_logging;

/// ldapsync - LDAP to Uyuni account synchronization
#[derive(Parser)]
#[command(name = "ldapsync")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file
    #[arg(short, long, env = "LDAPSYNC_CONFIG", default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Log debug output to stderr instead of the log file
    #[arg(short = 'd', long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show what a sync would change, without changing anything
    Overview(commands::overview::OverviewArgs),

    /// Create missing accounts and rewrite outdated roles
    Sync(commands::sync::SyncArgs),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = run(cli).await;

    match result {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            tracing::error!(error = %e, "ldapsync failed");
            e.print();
            std::process::exit(e.exit_code());
        }
    }
}

async fn run(cli: Cli) -> CliResult<()> {
    let config = Config::load(&cli.config)?;
    init_logging(cli.verbose, &config.common.logpath);
    tracing::debug!(config = ?config, "Configuration loaded");

    match cli.command {
        Commands::Overview(args) => commands::overview::execute(args, &config).await,
        Commands::Sync(args) => commands::sync::execute(args, &config).await,
    }
}

//! CLI error types and exit codes

use ldapsync_connector::error::ConnectorError;
use ldapsync_provisioning::SyncError;
use thiserror::Error;

/// Exit codes for the CLI
/// - 0: Success
/// - 1: Configuration or I/O error
/// - 2: Authentication rejected
/// - 3: Connection or network error
/// - 4: Snapshot could not be resolved
pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Cannot read accounts: {0}")]
    Snapshot(String),
}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Config(_) | CliError::Io(_) => 1,
            CliError::AuthenticationFailed(_) => 2,
            CliError::ConnectionFailed(_) => 3,
            CliError::Snapshot(_) => 4,
        }
    }

    /// Print the error to stderr with appropriate formatting
    pub fn print(&self) {
        let use_color = std::env::var("NO_COLOR").is_err();

        if use_color {
            eprintln!("\x1b[31mError:\x1b[0m {}", self);
        } else {
            eprintln!("Error: {}", self);
        }

        if let Some(suggestion) = self.suggestion() {
            if use_color {
                eprintln!("\n\x1b[33mSuggestion:\x1b[0m {}", suggestion);
            } else {
                eprintln!("\nSuggestion: {}", suggestion);
            }
        }
    }

    fn suggestion(&self) -> Option<&'static str> {
        match self {
            CliError::Config(_) => Some("Check the configuration file passed with --config."),
            CliError::AuthenticationFailed(_) => {
                Some("Check directory/bind_password and registry/password in the configuration.")
            }
            CliError::ConnectionFailed(_) => {
                Some("Check that the directory and registry hosts are reachable.")
            }
            _ => None,
        }
    }
}

impl From<ConnectorError> for CliError {
    fn from(e: ConnectorError) -> Self {
        match e {
            ConnectorError::AuthenticationFailed => CliError::AuthenticationFailed(e.to_string()),
            ConnectorError::InvalidConfiguration { message } => CliError::Config(message),
            e if e.is_connection_level() => CliError::ConnectionFailed(e.to_string()),
            e => CliError::Snapshot(e.to_string()),
        }
    }
}

impl From<SyncError> for CliError {
    fn from(e: SyncError) -> Self {
        match e {
            SyncError::Configuration { message } => CliError::Config(message),
            SyncError::Connector(e) => e.into(),
            e @ SyncError::Resolution { .. } => CliError::Snapshot(e.to_string()),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(e: std::io::Error) -> Self {
        CliError::Io(e.to_string())
    }
}

impl From<serde_yaml::Error> for CliError {
    fn from(e: serde_yaml::Error) -> Self {
        CliError::Config(format!("YAML error: {}", e))
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        CliError::Io(format!("JSON error: {}", e))
    }
}

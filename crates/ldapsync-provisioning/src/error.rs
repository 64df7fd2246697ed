//! Sync error types.

use ldapsync_connector::error::ConnectorError;
use thiserror::Error;

/// Errors that can occur during synchronization.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Configuration error.
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// A directory path did not resolve to exactly one identity.
    #[error("Cannot resolve {path}: {message}")]
    Resolution { path: String, message: String },

    /// Connector error.
    #[error(transparent)]
    Connector(#[from] ConnectorError),
}

impl SyncError {
    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create a resolution error.
    pub fn resolution(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Resolution {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Whether the error aborts the whole run.
    ///
    /// Resolution errors concern a single directory path and are collected
    /// instead.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Resolution { .. })
    }

    /// Whether the error means a system could not be reached or used.
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connector(e) if e.is_connection_level())
    }
}

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

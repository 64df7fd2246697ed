//! Uyuni Connector configuration

use serde::{Deserialize, Serialize};
use ldapsync_connector::config::{ConnectionSettings, ConnectorConfig, TlsConfig};
use ldapsync_connector::error::{ConnectorError, ConnectorResult};

/// Configuration for the Uyuni XML-RPC connector.
///
/// Credentials are not part of it; they are handed to
/// `RegistryClient::authenticate` once per run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UyuniConfig {
    /// XML-RPC endpoint (e.g., `https://uyuni.example.com/rpc/api`).
    pub url: String,

    /// Connection settings (timeouts).
    #[serde(default)]
    pub connection: ConnectionSettings,

    /// TLS configuration.
    #[serde(default)]
    pub tls: TlsConfig,
}

impl UyuniConfig {
    /// Create a new config for the given endpoint.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            connection: ConnectionSettings::default(),
            tls: TlsConfig::default(),
        }
    }

    /// Skip server certificate verification.
    #[must_use]
    pub fn with_unverified_tls(mut self) -> Self {
        self.tls = TlsConfig::unverified();
        self
    }
}

impl ConnectorConfig for UyuniConfig {
    fn validate(&self) -> ConnectorResult<()> {
        if self.url.is_empty() {
            return Err(ConnectorError::invalid_configuration("url is required"));
        }

        let parsed = url::Url::parse(&self.url).map_err(|e| {
            ConnectorError::invalid_configuration(format!("invalid url '{}': {}", self.url, e))
        })?;

        match parsed.scheme() {
            "http" | "https" => {}
            other => {
                return Err(ConnectorError::invalid_configuration(format!(
                    "unsupported url scheme '{other}', expected http or https"
                )));
            }
        }

        if parsed.host_str().is_none() {
            return Err(ConnectorError::invalid_configuration("url has no host"));
        }

        Ok(())
    }

    fn redacted(&self) -> Self {
        self.clone()
    }
}

//! # Uyuni Connector
//!
//! Registry client for Uyuni / SUSE Manager over the XML-RPC API.
//!
//! ## Example
//!
//! ```ignore
//! use ldapsync_connector_uyuni::{UyuniConfig, UyuniConnector};
//! use ldapsync_connector::traits::RegistryClient;
//!
//! let connector = UyuniConnector::new(UyuniConfig::new("https://uyuni.example.com/rpc/api"))?;
//! let session = connector.authenticate("admin", "secret").await?;
//! let logins = connector.list_users(&session).await?;
//! connector.logout(&session).await?;
//! ```

pub mod config;
pub mod connector;
pub mod xmlrpc;

// Re-exports
pub use config::UyuniConfig;
pub use connector::UyuniConnector;

//! # LDAP Connector
//!
//! LDAP directory client for ldapsync.
//!
//! The directory is only ever read: the connector binds once, answers
//! subtree searches and unbinds at the end of the run.
//!
//! ## Example
//!
//! ```ignore
//! use ldapsync_connector_ldap::{LdapConfig, LdapConnector};
//! use ldapsync_connector::traits::DirectoryClient;
//! use ldapsync_connector::types::SearchScope;
//!
//! let config = LdapConfig::new("ldap.example.com", "cn=admin,dc=example,dc=com")
//!     .with_password("secret");
//!
//! let connector = LdapConnector::new(config)?;
//! connector.connect().await?;
//! let entries = connector
//!     .search("ou=groups,dc=example,dc=com", SearchScope::Subtree, "(objectClass=*)", &["member"])
//!     .await?;
//! ```

pub mod config;
pub mod connector;

// Re-exports
pub use config::LdapConfig;
pub use connector::LdapConnector;

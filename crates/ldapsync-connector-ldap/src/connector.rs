//! LDAP Connector implementation
//!
//! Implements the DirectoryClient trait for LDAP/Active Directory.

use async_trait::async_trait;
use ldap3::{Ldap, LdapConnAsync, LdapConnSettings, Scope, SearchEntry, SearchResult};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

use ldapsync_connector::config::ConnectorConfig;
use ldapsync_connector::error::{ConnectorError, ConnectorResult};
use ldapsync_connector::traits::DirectoryClient;
use ldapsync_connector::types::{DirectoryEntry, SearchScope};

use crate::config::LdapConfig;

/// noSuchObject (RFC 4511 appendix A).
const RC_NO_SUCH_OBJECT: u32 = 32;
/// invalidCredentials (RFC 4511 appendix A).
const RC_INVALID_CREDENTIALS: u32 = 49;

/// LDAP connector reading identities and group membership.
pub struct LdapConnector {
    /// Configuration.
    config: LdapConfig,

    /// Display name for this connector instance.
    display_name: String,

    /// Cached LDAP connection (lazily initialized).
    connection: Arc<RwLock<Option<Ldap>>>,

    /// Whether the connection has been released.
    disposed: Arc<RwLock<bool>>,
}

impl LdapConnector {
    /// Create a new LDAP connector with the given configuration.
    pub fn new(config: LdapConfig) -> ConnectorResult<Self> {
        config.validate()?;
        config.tls.validate_security();

        let display_name = format!("LDAP: {}", config.host);

        Ok(Self {
            config,
            display_name,
            connection: Arc::new(RwLock::new(None)),
            disposed: Arc::new(RwLock::new(false)),
        })
    }

    /// Connect and bind now instead of on the first search.
    ///
    /// Lets the caller surface bind failures before any other work.
    #[instrument(skip(self), fields(host = %self.config.host))]
    pub async fn connect(&self) -> ConnectorResult<()> {
        self.get_connection().await.map(|_| ())
    }

    /// Get an LDAP connection, creating one if necessary.
    async fn get_connection(&self) -> ConnectorResult<Ldap> {
        if *self.disposed.read().await {
            return Err(ConnectorError::invalid_configuration(
                "LDAP connection has already been released",
            ));
        }

        {
            let conn_guard = self.connection.read().await;
            if let Some(ref conn) = *conn_guard {
                return Ok(conn.clone());
            }
        }

        let conn = self.create_connection().await?;

        {
            let mut conn_guard = self.connection.write().await;
            *conn_guard = Some(conn.clone());
        }

        Ok(conn)
    }

    /// Create a new LDAP connection and bind.
    async fn create_connection(&self) -> ConnectorResult<Ldap> {
        let url = self.config.url();

        debug!(url = %url, "Connecting to LDAP server");

        let settings = LdapConnSettings::new()
            .set_conn_timeout(self.config.connection.connection_timeout())
            .set_starttls(self.config.use_starttls)
            .set_no_tls_verify(!self.config.tls.verify_certificate);

        let (conn, mut ldap) = LdapConnAsync::with_settings(settings, &url)
            .await
            .map_err(|e| {
                ConnectorError::connection_failed_with_source(
                    format!("Failed to connect to LDAP server at {}", url),
                    e,
                )
            })?;

        tokio::spawn(async move {
            if let Err(e) = conn.drive().await {
                warn!(error = %e, "LDAP connection driver error");
            }
        });

        let bind_dn = &self.config.bind_dn;
        let bind_password = self.config.bind_password.as_deref().unwrap_or("");

        debug!(bind_dn = %bind_dn, "Performing LDAP bind");

        let result = ldap
            .simple_bind(bind_dn, bind_password)
            .await
            .map_err(|e| {
                ConnectorError::connection_failed_with_source(
                    format!("LDAP bind failed for {}", bind_dn),
                    e,
                )
            })?;

        if result.rc != 0 {
            if result.rc == RC_INVALID_CREDENTIALS {
                return Err(ConnectorError::AuthenticationFailed);
            }
            return Err(ConnectorError::connection_failed(format!(
                "LDAP bind failed with code {}: {}",
                result.rc, result.text
            )));
        }

        info!(host = %self.config.host, "LDAP connection established successfully");

        Ok(ldap)
    }

    fn to_ldap_scope(scope: SearchScope) -> Scope {
        match scope {
            SearchScope::Base => Scope::Base,
            SearchScope::OneLevel => Scope::OneLevel,
            SearchScope::Subtree => Scope::Subtree,
        }
    }

    /// Convert an ldap3 entry into a directory entry.
    ///
    /// Binary attributes are dropped; nothing read by the sync is binary.
    fn entry_from_search(entry: SearchEntry) -> DirectoryEntry {
        let mut converted = DirectoryEntry::new(entry.dn);
        for (name, values) in entry.attrs {
            for value in values {
                converted.push(&name, value);
            }
        }
        converted
    }
}

#[async_trait]
impl DirectoryClient for LdapConnector {
    fn display_name(&self) -> &str {
        &self.display_name
    }

    #[instrument(skip(self, attributes), fields(base = %base, filter = %filter))]
    async fn search(
        &self,
        base: &str,
        scope: SearchScope,
        filter: &str,
        attributes: &[&str],
    ) -> ConnectorResult<Vec<DirectoryEntry>> {
        let mut ldap = self.get_connection().await?;

        let attrs: Vec<&str> = if attributes.is_empty() {
            vec!["*"]
        } else {
            attributes.to_vec()
        };

        let SearchResult(entries, result) = ldap
            .with_timeout(self.config.connection.read_timeout())
            .search(base, Self::to_ldap_scope(scope), filter, attrs)
            .await
            .map_err(|e| {
                ConnectorError::operation_failed_with_source(
                    format!("LDAP search failed under {}", base),
                    e,
                )
            })?;

        if result.rc == RC_NO_SUCH_OBJECT {
            debug!(base = %base, "Search base does not exist");
            return Ok(Vec::new());
        }

        if result.rc != 0 {
            return Err(ConnectorError::operation_failed(format!(
                "LDAP search under {} failed with code {}: {}",
                base, result.rc, result.text
            )));
        }

        let entries: Vec<DirectoryEntry> = entries
            .into_iter()
            .map(SearchEntry::construct)
            .map(Self::entry_from_search)
            .collect();

        debug!(count = entries.len(), "LDAP search completed");

        Ok(entries)
    }

    async fn unbind(&self) -> ConnectorResult<()> {
        *self.disposed.write().await = true;

        let conn = self.connection.write().await.take();
        if let Some(mut ldap) = conn {
            ldap.unbind().await.map_err(|e| {
                ConnectorError::operation_failed_with_source("LDAP unbind failed", e)
            })?;
            info!(host = %self.config.host, "LDAP connection closed");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_connector_rejects_invalid_config() {
        let config = LdapConfig::new("", "cn=admin,dc=example,dc=com");
        assert!(LdapConnector::new(config).is_err());
    }

    #[test]
    fn test_display_name() {
        let config = LdapConfig::new("ldap.example.com", "cn=admin,dc=example,dc=com");
        let connector = LdapConnector::new(config).unwrap();
        assert_eq!(connector.display_name(), "LDAP: ldap.example.com");
    }

    #[test]
    fn test_scope_mapping() {
        assert!(matches!(
            LdapConnector::to_ldap_scope(SearchScope::Base),
            Scope::Base
        ));
        assert!(matches!(
            LdapConnector::to_ldap_scope(SearchScope::Subtree),
            Scope::Subtree
        ));
    }

    #[test]
    fn test_entry_from_search() {
        let mut attrs = HashMap::new();
        attrs.insert("uid".to_string(), vec!["jdoe".to_string()]);
        attrs.insert(
            "roleOccupant".to_string(),
            vec![
                "uid=a,dc=example,dc=com".to_string(),
                "uid=b,dc=example,dc=com".to_string(),
            ],
        );
        let entry = SearchEntry {
            dn: "cn=admins,dc=example,dc=com".to_string(),
            attrs,
            bin_attrs: HashMap::new(),
        };

        let converted = LdapConnector::entry_from_search(entry);
        assert_eq!(converted.dn, "cn=admins,dc=example,dc=com");
        assert_eq!(converted.first("uid"), Some("jdoe"));
        assert_eq!(converted.values("roleoccupant").len(), 2);
    }

    #[tokio::test]
    async fn test_search_after_unbind_fails() {
        let config = LdapConfig::new("ldap.example.com", "cn=admin,dc=example,dc=com");
        let connector = LdapConnector::new(config).unwrap();

        connector.unbind().await.unwrap();
        let result = connector
            .search("dc=example,dc=com", SearchScope::Base, "(objectClass=*)", &[])
            .await;
        assert!(result.is_err());
    }
}

//! Connector Framework traits
//!
//! Capability traits for the directory side and the registry side.

use async_trait::async_trait;

use crate::error::ConnectorResult;
use crate::types::{AccountDetails, DirectoryEntry, NewAccount, SearchScope, Session};

/// Read access to the directory.
///
/// Binding happens when the concrete client is connected; a value
/// implementing this trait is always ready to search.
#[async_trait]
pub trait DirectoryClient: Send + Sync {
    /// Display name for this client instance.
    fn display_name(&self) -> &str;

    /// Search below `base` with an RFC 4515 filter.
    ///
    /// # Arguments
    /// * `base` - Search base DN
    /// * `scope` - Search scope
    /// * `filter` - LDAP filter string, already escaped
    /// * `attributes` - Attributes to fetch (empty = all user attributes)
    async fn search(
        &self,
        base: &str,
        scope: SearchScope,
        filter: &str,
        attributes: &[&str],
    ) -> ConnectorResult<Vec<DirectoryEntry>>;

    /// Release the directory connection.
    async fn unbind(&self) -> ConnectorResult<()>;
}

/// Account and role operations of the registry.
///
/// Every call except [`RegistryClient::authenticate`] takes the run's
/// [`Session`] explicitly.
#[async_trait]
pub trait RegistryClient: Send + Sync {
    /// Display name for this client instance.
    fn display_name(&self) -> &str;

    /// Log in and obtain a session token.
    async fn authenticate(&self, user: &str, password: &str) -> ConnectorResult<Session>;

    /// Invalidate the session.
    async fn logout(&self, session: &Session) -> ConnectorResult<()>;

    /// Logins of every account in the registry.
    async fn list_users(&self, session: &Session) -> ConnectorResult<Vec<String>>;

    /// Profile attributes of one account.
    async fn get_details(&self, session: &Session, login: &str)
        -> ConnectorResult<AccountDetails>;

    /// Roles currently granted to one account (possibly empty).
    async fn list_roles(&self, session: &Session, login: &str) -> ConnectorResult<Vec<String>>;

    /// Create a password-less, externally authenticated account.
    ///
    /// Not idempotent: creating an existing login is an error.
    async fn create_user(&self, session: &Session, account: &NewAccount) -> ConnectorResult<()>;

    /// Grant a role.
    async fn add_role(&self, session: &Session, login: &str, role: &str) -> ConnectorResult<()>;

    /// Revoke a role.
    async fn remove_role(&self, session: &Session, login: &str, role: &str)
        -> ConnectorResult<()>;
}

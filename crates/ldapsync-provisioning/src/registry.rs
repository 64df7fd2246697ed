//! Registry side of the reconciliation.
//!
//! Every failure here is fatal for the run: a partial registry snapshot
//! would make present accounts look new.

use tracing::{debug, info, instrument};

use ldapsync_connector::traits::RegistryClient;
use ldapsync_connector::types::{AccountDetails, Session};

use crate::error::SyncResult;
use crate::identity::Identity;
use crate::roles::RoleSet;

/// Reads the accounts of the registry with one session.
pub struct RegistrySnapshot<'a> {
    client: &'a dyn RegistryClient,
    session: &'a Session,
}

impl<'a> RegistrySnapshot<'a> {
    pub fn new(client: &'a dyn RegistryClient, session: &'a Session) -> Self {
        Self { client, session }
    }

    /// Logins of all accounts.
    pub async fn list_identities(&self) -> SyncResult<Vec<String>> {
        Ok(self.client.list_users(self.session).await?)
    }

    pub async fn get_details(&self, key: &str) -> SyncResult<AccountDetails> {
        Ok(self.client.get_details(self.session, key).await?)
    }

    /// Granted roles, normalized the same way as directory roles.
    pub async fn list_roles(&self, key: &str) -> SyncResult<RoleSet> {
        let roles = self.client.list_roles(self.session, key).await?;
        Ok(roles.into_iter().collect())
    }

    /// Load every account.
    pub async fn load(&self) -> SyncResult<Vec<Identity>> {
        self.load_where(|_| true).await
    }

    /// Load the accounts whose login passes `keep`.
    ///
    /// Details and roles are only fetched for kept accounts.
    #[instrument(skip_all)]
    pub async fn load_where<F>(&self, keep: F) -> SyncResult<Vec<Identity>>
    where
        F: Fn(&str) -> bool,
    {
        let logins = self.list_identities().await?;
        let mut identities = Vec::with_capacity(logins.len());

        for login in logins {
            if !keep(&login) {
                debug!(login = %login, "Skipping registry account");
                continue;
            }
            let details = self.get_details(&login).await?;
            let roles = self.list_roles(&login).await?;
            identities.push(Identity::from_account(login, details, roles));
        }

        info!(identities = identities.len(), "Registry snapshot loaded");
        Ok(identities)
    }
}

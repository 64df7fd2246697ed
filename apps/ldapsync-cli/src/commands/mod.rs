//! CLI command implementations

pub mod overview;
pub mod sync;

use std::sync::Arc;

use tracing::{info, warn};

use ldapsync_connector::traits::{DirectoryClient, RegistryClient};
use ldapsync_connector::types::Session;
use ldapsync_connector_ldap::LdapConnector;
use ldapsync_connector_uyuni::UyuniConnector;
use ldapsync_provisioning::SyncPipeline;

use crate::config::Config;
use crate::error::CliResult;

/// Both systems connected and a registry session open.
pub struct Connection {
    pub directory: Arc<LdapConnector>,
    pub registry: Arc<UyuniConnector>,
    pub session: Session,
}

impl Connection {
    /// Bind to the directory, then log in to the registry.
    pub async fn open(config: &Config) -> CliResult<Self> {
        let directory = Arc::new(LdapConnector::new(config.ldap_config())?);
        let registry = Arc::new(UyuniConnector::new(config.uyuni_config())?);

        directory.connect().await?;
        info!(directory = directory.display_name(), "Directory bound");

        let session = match registry
            .authenticate(&config.registry.user, &config.registry.password)
            .await
        {
            Ok(session) => session,
            Err(e) => {
                Self::unbind(directory.as_ref()).await;
                return Err(e.into());
            }
        };
        info!(registry = registry.display_name(), "Registry session opened");

        Ok(Self {
            directory,
            registry,
            session,
        })
    }

    pub fn pipeline(&self, config: &Config) -> SyncPipeline {
        let directory: Arc<dyn DirectoryClient> = self.directory.clone();
        let registry: Arc<dyn RegistryClient> = self.registry.clone();
        SyncPipeline::new(directory, registry, config.sync_settings())
    }

    /// Log out and unbind. Failures are only logged.
    pub async fn close(self) {
        if let Err(e) = self.registry.logout(&self.session).await {
            warn!(error = %e, "Registry logout failed");
        }
        Self::unbind(self.directory.as_ref()).await;
    }

    async fn unbind(directory: &LdapConnector) {
        if let Err(e) = directory.unbind().await {
            warn!(error = %e, "Directory unbind failed");
        }
    }
}

//! One reconciliation run: read directory, read registry, reconcile,
//! optionally execute.

use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{info, instrument};

use ldapsync_connector::traits::{DirectoryClient, RegistryClient};
use ldapsync_connector::types::Session;

use crate::directory::{DirectoryReader, UnresolvedPath};
use crate::error::SyncResult;
use crate::executor::SyncExecutor;
use crate::identity::Identity;
use crate::reconciliation::{Reconciler, SyncPlan};
use crate::registry::RegistrySnapshot;
use crate::report::SyncReport;
use crate::roles::RoleMapping;

/// What to read and what to leave alone.
#[derive(Debug, Clone, Default)]
pub struct SyncSettings {
    /// Only member paths below this DN are considered.
    pub users_base: Option<String>,
    /// Containers whose groups list the candidate identities.
    pub member_groups: Vec<String>,
    pub role_mappings: Vec<RoleMapping>,
    /// Logins excluded from both snapshots.
    pub frozen: BTreeSet<String>,
}

impl SyncSettings {
    pub fn is_frozen(&self, key: &str) -> bool {
        self.frozen.contains(key)
    }
}

/// Read-only result of a run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SyncOverview {
    /// Frozen logins, as configured.
    pub ignored: Vec<String>,
    /// New identities that will be created. Incomplete ones are listed
    /// only under `incomplete`.
    pub new: Vec<Identity>,
    pub outdated: Vec<Identity>,
    pub unchanged: Vec<Identity>,
    /// New identities that cannot be created.
    pub incomplete: Vec<Identity>,
    pub removed: Vec<Identity>,
    pub unresolved: Vec<UnresolvedPath>,
    #[serde(skip)]
    pub plan: SyncPlan,
}

/// Reconciliation run over a directory and a registry.
pub struct SyncPipeline {
    directory: Arc<dyn DirectoryClient>,
    registry: Arc<dyn RegistryClient>,
    settings: SyncSettings,
}

impl SyncPipeline {
    pub fn new(
        directory: Arc<dyn DirectoryClient>,
        registry: Arc<dyn RegistryClient>,
        settings: SyncSettings,
    ) -> Self {
        Self {
            directory,
            registry,
            settings,
        }
    }

    pub fn settings(&self) -> &SyncSettings {
        &self.settings
    }

    /// Read both systems and plan, without mutating the registry.
    #[instrument(skip_all)]
    pub async fn overview(&self, session: &Session) -> SyncResult<SyncOverview> {
        let mut reader = DirectoryReader::new(self.directory.as_ref());
        if let Some(base) = &self.settings.users_base {
            reader = reader.with_users_base(base.clone());
        }
        let snapshot = reader
            .read_identities(&self.settings.member_groups, &self.settings.role_mappings)
            .await?;

        let registry = RegistrySnapshot::new(self.registry.as_ref(), session)
            .load_where(|key| !self.settings.is_frozen(key))
            .await?;

        let directory: Vec<Identity> = snapshot
            .identities
            .into_iter()
            .filter(|i| !self.settings.is_frozen(&i.correlation_key))
            .collect();

        let reconciler = Reconciler::new(directory, registry);
        let overview = SyncOverview {
            ignored: self.settings.frozen.iter().cloned().collect(),
            new: reconciler
                .get_new()
                .into_iter()
                .filter(|i| i.is_complete())
                .cloned()
                .collect(),
            outdated: reconciler.get_outdated().into_iter().cloned().collect(),
            unchanged: reconciler.get_unchanged().into_iter().cloned().collect(),
            incomplete: reconciler.get_incomplete().into_iter().cloned().collect(),
            removed: reconciler.removed().to_vec(),
            unresolved: snapshot.unresolved,
            plan: reconciler.plan(),
        };

        info!(
            new = overview.new.len(),
            outdated = overview.outdated.len(),
            unchanged = overview.unchanged.len(),
            incomplete = overview.incomplete.len(),
            removed = overview.removed.len(),
            unresolved = overview.unresolved.len(),
            "Reconciliation complete"
        );
        Ok(overview)
    }

    /// Plan and execute.
    pub async fn run(&self, session: &Session) -> SyncResult<SyncReport> {
        let overview = self.overview(session).await?;
        let executor = SyncExecutor::new(self.registry.as_ref(), session);
        Ok(executor.execute(&overview.plan).await)
    }
}

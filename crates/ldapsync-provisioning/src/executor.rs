//! Sync executor.
//!
//! Applies a plan to the registry one identity at a time. A failure is
//! recorded against its identity and the next one is processed.

use tracing::{info, instrument, warn};

use ldapsync_connector::traits::RegistryClient;
use ldapsync_connector::types::Session;

use crate::identity::Identity;
use crate::reconciliation::{Action, SyncPlan};
use crate::report::{ReportEntry, SyncOutcome, SyncReport};
use crate::roles::ROLE_CATALOGUE;

/// Issues registry mutations for planned identities.
pub struct SyncExecutor<'a> {
    client: &'a dyn RegistryClient,
    session: &'a Session,
}

impl<'a> SyncExecutor<'a> {
    pub fn new(client: &'a dyn RegistryClient, session: &'a Session) -> Self {
        Self { client, session }
    }

    /// Create an externally authenticated account for each identity.
    pub async fn create_missing(&self, identities: &[Identity]) -> Vec<ReportEntry> {
        let mut entries = Vec::with_capacity(identities.len());
        for identity in identities {
            let outcome = self.create(identity).await;
            entries.push(ReportEntry::new(
                &identity.correlation_key,
                Action::Create,
                outcome,
            ));
        }
        entries
    }

    /// Rewrite the roles of each identity.
    ///
    /// Every `catalogue` role is revoked first, then the identity's roles
    /// are granted. Revoke failures do not stop the grants.
    pub async fn update_roles(&self, identities: &[Identity], catalogue: &[&str]) -> Vec<ReportEntry> {
        let mut entries = Vec::with_capacity(identities.len());
        for identity in identities {
            let outcome = self.apply_roles(identity, catalogue).await;
            entries.push(ReportEntry::new(
                &identity.correlation_key,
                Action::UpdateRoles,
                outcome,
            ));
        }
        entries
    }

    /// Execute a plan.
    ///
    /// Created accounts also get their roles, so a re-run finds them
    /// unchanged. Skip entries make no call; an identity skipped with a
    /// sync error is recorded as failed.
    #[instrument(skip_all, fields(entries = plan.len()))]
    pub async fn execute(&self, plan: &SyncPlan) -> SyncReport {
        let mut report = SyncReport::new();

        for entry in plan {
            let identity = &entry.identity;
            let outcome = match entry.action {
                Action::Create => {
                    let created = self.create(identity).await;
                    if created.is_ok() && !identity.roles.is_empty() {
                        self.grant(identity).await
                    } else {
                        created
                    }
                }
                Action::UpdateRoles => self.apply_roles(identity, &ROLE_CATALOGUE).await,
                Action::Skip => match &identity.sync_error {
                    Some(error) => SyncOutcome::Failed(error.clone()),
                    None => SyncOutcome::Ok,
                },
            };

            report.record(ReportEntry::new(
                &identity.correlation_key,
                entry.action,
                outcome,
            ));
        }

        report.finish();
        info!(
            created = report.statistics.created,
            updated = report.statistics.updated,
            skipped = report.statistics.skipped,
            failed = report.statistics.failed,
            "Sync plan executed"
        );
        report
    }

    async fn create(&self, identity: &Identity) -> SyncOutcome {
        match self
            .client
            .create_user(self.session, &identity.to_new_account())
            .await
        {
            Ok(()) => {
                info!(login = %identity.correlation_key, "Account created");
                SyncOutcome::Ok
            }
            Err(e) => {
                warn!(login = %identity.correlation_key, error = %e, "Account creation failed");
                SyncOutcome::Failed(e.to_string())
            }
        }
    }

    async fn apply_roles(&self, identity: &Identity, catalogue: &[&str]) -> SyncOutcome {
        let mut errors = self.revoke(identity, catalogue).await;
        errors.extend(self.grant_all(identity).await);
        Self::outcome(identity, errors)
    }

    async fn grant(&self, identity: &Identity) -> SyncOutcome {
        let errors = self.grant_all(identity).await;
        Self::outcome(identity, errors)
    }

    async fn revoke(&self, identity: &Identity, catalogue: &[&str]) -> Vec<String> {
        let login = &identity.correlation_key;
        let mut errors = Vec::new();
        for role in catalogue {
            if let Err(e) = self.client.remove_role(self.session, login, role).await {
                errors.push(format!("remove {role}: {e}"));
            }
        }
        errors
    }

    async fn grant_all(&self, identity: &Identity) -> Vec<String> {
        let login = &identity.correlation_key;
        let mut errors = Vec::new();
        for role in identity.roles.iter() {
            if let Err(e) = self.client.add_role(self.session, login, role).await {
                errors.push(format!("add {role}: {e}"));
            }
        }
        errors
    }

    fn outcome(identity: &Identity, errors: Vec<String>) -> SyncOutcome {
        if errors.is_empty() {
            info!(login = %identity.correlation_key, roles = %identity.roles, "Roles applied");
            SyncOutcome::Ok
        } else {
            let reason = errors.join("; ");
            warn!(login = %identity.correlation_key, error = %reason, "Role update failed");
            SyncOutcome::Failed(reason)
        }
    }
}

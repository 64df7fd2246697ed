//! Reconciliation engine.
//!
//! Classification is a pure function of the two snapshots: the same inputs
//! always yield the same flags and the same plan.

use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tracing::debug;

use crate::identity::Identity;

use super::plan::{Action, PlanEntry, SyncPlan};

/// The directory population split by classification.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub new: Vec<Identity>,
    pub outdated: Vec<Identity>,
    pub unchanged: Vec<Identity>,
    /// Registry accounts without a directory identity.
    pub removed: Vec<Identity>,
}

/// Classify the directory identities against the registry identities.
pub fn classify(directory: Vec<Identity>, registry: Vec<Identity>) -> Classification {
    Reconciler::new(directory, registry).into_classification()
}

/// Classified directory population and the registry accounts it lacks.
#[derive(Debug, Clone)]
pub struct Reconciler {
    identities: Vec<Identity>,
    removed: Vec<Identity>,
}

impl Reconciler {
    /// Correlate both snapshots by login.
    ///
    /// A directory identity without a match is flagged new and joins the
    /// working registry snapshot, so a later directory identity with the
    /// same login is matched against it rather than created twice.
    pub fn new(directory: Vec<Identity>, registry: Vec<Identity>) -> Self {
        let directory_keys: HashSet<&str> = directory
            .iter()
            .map(|i| i.correlation_key.as_str())
            .collect();
        let removed: Vec<Identity> = registry
            .iter()
            .filter(|r| !directory_keys.contains(r.correlation_key.as_str()))
            .cloned()
            .collect();

        let mut working: HashMap<String, Identity> = registry
            .into_iter()
            .map(|i| (i.correlation_key.clone(), i))
            .collect();

        let mut identities = Vec::with_capacity(directory.len());
        for mut identity in directory {
            match working.get(&identity.correlation_key) {
                None => {
                    identity.is_new = true;
                    identity.is_outdated = false;
                    identity.changes = None;
                    working.insert(identity.correlation_key.clone(), identity.clone());
                }
                Some(existing) => {
                    let changes = identity.diff(existing);
                    identity.is_new = false;
                    identity.is_outdated = !changes.is_empty();
                    identity.changes = identity.is_outdated.then_some(changes);
                }
            }
            identities.push(identity);
        }

        debug!(
            identities = identities.len(),
            removed = removed.len(),
            "Snapshots correlated"
        );

        Self {
            identities,
            removed,
        }
    }

    /// The classified directory population, in snapshot order.
    pub fn identities(&self) -> &[Identity] {
        &self.identities
    }

    pub fn get_new(&self) -> Vec<&Identity> {
        self.identities.iter().filter(|i| i.is_new).collect()
    }

    /// Outdated identities; never includes new ones.
    pub fn get_outdated(&self) -> Vec<&Identity> {
        self.identities
            .iter()
            .filter(|i| i.is_outdated && !i.is_new)
            .collect()
    }

    pub fn get_unchanged(&self) -> Vec<&Identity> {
        self.identities
            .iter()
            .filter(|i| !i.is_new && !i.is_outdated)
            .collect()
    }

    /// New identities that cannot be created for lack of attributes.
    pub fn get_incomplete(&self) -> Vec<&Identity> {
        self.identities
            .iter()
            .filter(|i| i.is_new && !i.is_complete())
            .collect()
    }

    pub fn removed(&self) -> &[Identity] {
        &self.removed
    }

    /// Derive the plan, in snapshot order.
    pub fn plan(&self) -> SyncPlan {
        let entries = self
            .identities
            .iter()
            .map(|identity| {
                let mut identity = identity.clone();
                let action = if identity.is_new {
                    let missing = identity.missing_attributes();
                    if missing.is_empty() {
                        Action::Create
                    } else {
                        identity.sync_error =
                            Some(format!("missing required attributes: {}", missing.join(", ")));
                        Action::Skip
                    }
                } else if identity.is_outdated {
                    Action::UpdateRoles
                } else {
                    Action::Skip
                };
                PlanEntry { identity, action }
            })
            .collect();

        SyncPlan::new(entries)
    }

    pub fn into_classification(self) -> Classification {
        let mut classification = Classification {
            removed: self.removed,
            ..Classification::default()
        };

        for identity in self.identities {
            if identity.is_new {
                classification.new.push(identity);
            } else if identity.is_outdated {
                classification.outdated.push(identity);
            } else {
                classification.unchanged.push(identity);
            }
        }

        classification
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roles::RoleSet;

    fn person(key: &str, roles: &[&str]) -> Identity {
        Identity::new(key)
            .with_names("First", key)
            .with_email(format!("{key}@x.com"))
            .with_roles(roles.iter().copied().collect::<RoleSet>())
    }

    #[test]
    fn test_unmatched_identity_is_new() {
        let reconciler = Reconciler::new(vec![person("jdoe", &[])], vec![]);

        let new = reconciler.get_new();
        assert_eq!(new.len(), 1);
        assert!(new[0].is_new);
        assert!(reconciler.get_outdated().is_empty());
    }

    #[test]
    fn test_identical_identity_is_unchanged() {
        let reconciler = Reconciler::new(
            vec![person("jdoe", &["channel_admin", "config_admin"])],
            vec![person("jdoe", &["config_admin", "channel_admin"])],
        );

        assert!(reconciler.get_new().is_empty());
        assert!(reconciler.get_outdated().is_empty());
        assert_eq!(reconciler.get_unchanged().len(), 1);
        assert!(!reconciler.plan().has_changes());
    }

    #[test]
    fn test_role_difference_is_outdated() {
        let reconciler = Reconciler::new(
            vec![person("jdoe", &["channel_admin"])],
            vec![person("jdoe", &[])],
        );

        let outdated = reconciler.get_outdated();
        assert_eq!(outdated.len(), 1);
        let changes = outdated[0].changes.unwrap();
        assert!(changes.roles);
        assert!(!changes.account);

        let plan = reconciler.plan();
        assert_eq!(plan.find("jdoe").map(|e| e.action), Some(Action::UpdateRoles));
    }

    #[test]
    fn test_account_difference_is_outdated() {
        let registry = person("jdoe", &[]).with_email("old@x.com");
        let reconciler = Reconciler::new(vec![person("jdoe", &[])], vec![registry]);

        let outdated = reconciler.get_outdated();
        assert_eq!(outdated.len(), 1);
        assert!(outdated[0].changes.unwrap().account);
    }

    #[test]
    fn test_duplicate_directory_key_is_created_once() {
        let reconciler = Reconciler::new(
            vec![person("jdoe", &[]), person("jdoe", &[])],
            vec![],
        );

        let plan = reconciler.plan();
        assert_eq!(plan.count(Action::Create), 1);
        assert_eq!(plan.count(Action::Skip), 1);
        assert_eq!(reconciler.get_new().len(), 1);
    }

    #[test]
    fn test_incomplete_new_identity_is_skipped() {
        let incomplete = Identity::new("ghost").with_names("Casper", "");
        let reconciler = Reconciler::new(vec![incomplete], vec![]);

        assert_eq!(reconciler.get_incomplete().len(), 1);

        let plan = reconciler.plan();
        let entry = plan.find("ghost").unwrap();
        assert_eq!(entry.action, Action::Skip);
        assert_eq!(
            entry.identity.sync_error.as_deref(),
            Some("missing required attributes: surname, email")
        );
    }

    #[test]
    fn test_removed_accounts() {
        let reconciler = Reconciler::new(
            vec![person("jdoe", &[])],
            vec![person("jdoe", &[]), person("gone", &[])],
        );

        let removed: Vec<&str> = reconciler
            .removed()
            .iter()
            .map(|i| i.correlation_key.as_str())
            .collect();
        assert_eq!(removed, vec!["gone"]);
    }

    #[test]
    fn test_plan_keeps_snapshot_order() {
        let reconciler = Reconciler::new(
            vec![person("c", &[]), person("a", &[]), person("b", &["image_admin"])],
            vec![person("b", &[])],
        );

        let plan = reconciler.plan();
        let keys: Vec<&str> = plan
            .iter()
            .map(|e| e.identity.correlation_key.as_str())
            .collect();
        assert_eq!(keys, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_classification_is_deterministic() {
        let directory = vec![person("a", &["org_admin"]), person("b", &[])];
        let registry = vec![person("b", &["channel_admin"]), person("z", &[])];

        let first = classify(directory.clone(), registry.clone());
        let second = classify(directory, registry);

        assert_eq!(first, second);
        assert_eq!(first.new.len(), 1);
        assert_eq!(first.outdated.len(), 1);
        assert_eq!(first.removed.len(), 1);
    }
}

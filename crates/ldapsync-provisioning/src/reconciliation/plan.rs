//! Sync plan types.

use serde::Serialize;
use std::fmt;

use crate::identity::Identity;

/// What the executor does for one identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Create the account (and grant its roles).
    Create,
    /// Revoke the catalogue roles, then grant the resolved ones.
    UpdateRoles,
    /// Nothing to do.
    Skip,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Create => "create",
            Action::UpdateRoles => "update_roles",
            Action::Skip => "skip",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One planned step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanEntry {
    pub identity: Identity,
    pub action: Action,
}

/// Ordered list of planned steps, in directory snapshot order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct SyncPlan {
    entries: Vec<PlanEntry>,
}

impl SyncPlan {
    pub fn new(entries: Vec<PlanEntry>) -> Self {
        Self { entries }
    }

    pub fn entries(&self) -> &[PlanEntry] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PlanEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries with the given action.
    pub fn count(&self, action: Action) -> usize {
        self.entries.iter().filter(|e| e.action == action).count()
    }

    /// Entry for a login, if planned.
    pub fn find(&self, key: &str) -> Option<&PlanEntry> {
        self.entries
            .iter()
            .find(|e| e.identity.correlation_key == key)
    }

    /// Whether any entry mutates the registry.
    pub fn has_changes(&self) -> bool {
        self.entries.iter().any(|e| e.action != Action::Skip)
    }
}

impl IntoIterator for SyncPlan {
    type Item = PlanEntry;
    type IntoIter = std::vec::IntoIter<PlanEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a SyncPlan {
    type Item = &'a PlanEntry;
    type IntoIter = std::slice::Iter<'a, PlanEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

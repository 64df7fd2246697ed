//! Directory side of the reconciliation.
//!
//! Discovers candidate identities from group membership, reads their
//! attributes and attaches the roles granted by the role mappings.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, instrument, warn};

use ldapsync_connector::traits::DirectoryClient;
use ldapsync_connector::types::{DirectoryEntry, SearchScope};

use crate::error::{SyncError, SyncResult};
use crate::identity::Identity;
use crate::roles::{self, normalize_dn, MembershipKind, ResolvedMapping, RoleMapping};

/// Attributes read for every identity.
const IDENTITY_ATTRIBUTES: [&str; 6] = ["uid", "cn", "name", "givenName", "sn", "mail"];

/// A member path that did not yield an identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnresolvedPath {
    pub path: String,
    pub reason: String,
}

/// Identities read from the directory in one run.
#[derive(Debug, Clone, Default)]
pub struct DirectorySnapshot {
    pub identities: Vec<Identity>,
    pub unresolved: Vec<UnresolvedPath>,
}

/// Reads identities and their role grants from the directory.
pub struct DirectoryReader<'a> {
    client: &'a dyn DirectoryClient,
    users_base: Option<String>,
}

impl<'a> DirectoryReader<'a> {
    pub fn new(client: &'a dyn DirectoryClient) -> Self {
        Self {
            client,
            users_base: None,
        }
    }

    /// Only accept member paths at or below `base`.
    #[must_use]
    pub fn with_users_base(mut self, base: impl Into<String>) -> Self {
        let base = base.into();
        self.users_base = (!base.trim().is_empty()).then_some(base);
        self
    }

    /// Collect the `member` values of every group under the given containers.
    ///
    /// Paths are deduplicated by their normalized form; the first spelling
    /// seen is kept.
    #[instrument(skip(self, group_paths), fields(groups = group_paths.len()))]
    pub async fn discover_member_paths(&self, group_paths: &[String]) -> SyncResult<BTreeSet<String>> {
        let kind = MembershipKind::GroupMember;
        let mut members: BTreeMap<String, String> = BTreeMap::new();

        for group in group_paths {
            let entries = self
                .client
                .search(group, SearchScope::Subtree, kind.filter(), &[kind.attribute()])
                .await?;

            for entry in &entries {
                for member in entry.values(kind.attribute()) {
                    if !self.in_scope(member) {
                        debug!(member = %member, "Member outside of the users base, ignoring");
                        continue;
                    }
                    members
                        .entry(normalize_dn(member))
                        .or_insert_with(|| member.clone());
                }
            }
        }

        debug!(count = members.len(), "Discovered member paths");
        Ok(members.into_values().collect())
    }

    /// Read the single identity stored at `path`.
    ///
    /// Zero or several entries, or an entry without `uid`, make the path
    /// unresolved. Connection-level failures are returned as they are.
    #[instrument(skip(self))]
    pub async fn fetch_identity(&self, path: &str) -> SyncResult<Identity> {
        let entries = match self
            .client
            .search(path, SearchScope::Subtree, "(objectClass=*)", &IDENTITY_ATTRIBUTES)
            .await
        {
            Ok(entries) => entries,
            Err(e) if e.is_connection_level() => return Err(e.into()),
            Err(e) => return Err(SyncError::resolution(path, e.to_string())),
        };

        let entry = match entries.as_slice() {
            [entry] => entry,
            [] => return Err(SyncError::resolution(path, "no entry found")),
            many => {
                return Err(SyncError::resolution(
                    path,
                    format!("expected one entry, found {}", many.len()),
                ))
            }
        };

        let uid = entry.first_or_empty("uid").trim();
        if uid.is_empty() {
            return Err(SyncError::resolution(path, "entry has no uid"));
        }

        let (name, secondname) = derive_names(entry);

        Ok(Identity::new(uid)
            .with_names(name, secondname)
            .with_email(entry.first_or_empty("mail").trim())
            .with_origin(path))
    }

    /// Pre-fetch the membership of every role mapping.
    #[instrument(skip(self, mappings), fields(mappings = mappings.len()))]
    pub async fn resolve_mappings(&self, mappings: &[RoleMapping]) -> SyncResult<Vec<ResolvedMapping>> {
        let mut resolved = Vec::with_capacity(mappings.len());

        for mapping in mappings {
            let kind = mapping.kind;
            let entries = self
                .client
                .search(&mapping.path, SearchScope::Subtree, kind.filter(), &[kind.attribute()])
                .await?;

            let members = entries
                .iter()
                .flat_map(|entry| entry.values(kind.attribute()).iter());
            let resolved_mapping = ResolvedMapping::new(mapping.clone(), members);

            debug!(
                path = %mapping.path,
                kind = ?kind,
                members = resolved_mapping.member_count(),
                "Resolved role mapping"
            );
            resolved.push(resolved_mapping);
        }

        Ok(resolved)
    }

    /// Build the directory snapshot.
    ///
    /// Unresolved paths are logged and collected; the remaining identities
    /// are still returned.
    #[instrument(skip_all)]
    pub async fn read_identities(
        &self,
        group_paths: &[String],
        mappings: &[RoleMapping],
    ) -> SyncResult<DirectorySnapshot> {
        let resolved = self.resolve_mappings(mappings).await?;
        let paths = self.discover_member_paths(group_paths).await?;

        let mut snapshot = DirectorySnapshot::default();
        for path in paths {
            match self.fetch_identity(&path).await {
                Ok(identity) => {
                    let roles = roles::resolve(&path, &resolved);
                    snapshot.identities.push(identity.with_roles(roles));
                }
                Err(e) if !e.is_fatal() => {
                    warn!(path = %path, error = %e, "Skipping unresolved directory path");
                    snapshot.unresolved.push(UnresolvedPath {
                        path,
                        reason: e.to_string(),
                    });
                }
                Err(e) => return Err(e),
            }
        }

        info!(
            identities = snapshot.identities.len(),
            unresolved = snapshot.unresolved.len(),
            "Directory snapshot loaded"
        );
        Ok(snapshot)
    }

    fn in_scope(&self, dn: &str) -> bool {
        self.users_base
            .as_deref()
            .map_or(true, |base| roles::is_under(dn, base))
    }
}

/// Split `cn` into given name and surname, falling back to
/// `name`/`givenName` and `sn` unless it has exactly two words.
pub fn derive_names(entry: &DirectoryEntry) -> (String, String) {
    let cn: Vec<&str> = entry.first_or_empty("cn").split_whitespace().collect();
    if let [given, surname] = cn.as_slice() {
        return ((*given).to_string(), (*surname).to_string());
    }

    let given = ["name", "givenName"]
        .iter()
        .map(|attr| entry.first_or_empty(attr).trim())
        .find(|value| !value.is_empty())
        .unwrap_or_default();

    (given.to_string(), entry.first_or_empty("sn").trim().to_string())
}

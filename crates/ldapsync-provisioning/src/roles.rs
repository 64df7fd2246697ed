//! Role resolution.
//!
//! Maps a directory path to the registry roles granted by the configured
//! role mappings. Granting [`ESCALATION_ROLE`] grants the whole
//! [`ROLE_CATALOGUE`].

use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

/// Role that implies every role of the catalogue.
pub const ESCALATION_ROLE: &str = "org_admin";

/// Privileged registry roles managed by the sync.
pub const ROLE_CATALOGUE: [&str; 7] = [
    "satellite_admin",
    "org_admin",
    "channel_admin",
    "config_admin",
    "system_group_admin",
    "activation_key_admin",
    "image_admin",
];

/// Set of canonical (lowercase) role names.
///
/// Once the escalation role is present the set equals the catalogue and
/// further inserts are no-ops, so the result does not depend on insertion
/// order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct RoleSet(BTreeSet<String>);

impl RoleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// The full catalogue.
    pub fn catalogue() -> Self {
        Self(ROLE_CATALOGUE.iter().map(|r| (*r).to_string()).collect())
    }

    /// Insert a role, returning whether the set changed.
    pub fn insert(&mut self, role: &str) -> bool {
        let role = role.trim().to_lowercase();
        if role.is_empty() || self.is_escalated() {
            return false;
        }
        if role == ESCALATION_ROLE {
            *self = Self::catalogue();
            return true;
        }
        self.0.insert(role)
    }

    pub fn contains(&self, role: &str) -> bool {
        self.0.contains(&role.trim().to_lowercase())
    }

    pub fn is_escalated(&self) -> bool {
        self.0.contains(ESCALATION_ROLE)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: AsRef<str>> Extend<S> for RoleSet {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        for role in iter {
            self.insert(role.as_ref());
        }
    }
}

impl<S: AsRef<str>> FromIterator<S> for RoleSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

impl fmt::Display for RoleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let roles: Vec<&str> = self.iter().collect();
        f.write_str(&roles.join(", "))
    }
}

/// How membership of a mapped container is expressed in the directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipKind {
    /// `organizationalRole` entries listing `roleOccupant`s.
    RoleOccupant,
    /// `groupOfNames` / `group` entries listing `member`s.
    GroupMember,
}

impl MembershipKind {
    /// Search filter selecting the membership-bearing entries.
    pub fn filter(&self) -> &'static str {
        match self {
            Self::RoleOccupant => "(objectClass=organizationalRole)",
            Self::GroupMember => "(|(objectClass=groupOfNames)(objectClass=group))",
        }
    }

    /// Attribute holding member DNs.
    pub fn attribute(&self) -> &'static str {
        match self {
            Self::RoleOccupant => "roleOccupant",
            Self::GroupMember => "member",
        }
    }
}

/// A directory container whose members are granted roles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleMapping {
    pub path: String,
    pub roles: Vec<String>,
    pub kind: MembershipKind,
}

impl RoleMapping {
    pub fn new(path: impl Into<String>, roles: Vec<String>, kind: MembershipKind) -> Self {
        Self {
            path: path.into(),
            roles,
            kind,
        }
    }
}

/// A role mapping together with the member DNs found under its path.
#[derive(Debug, Clone)]
pub struct ResolvedMapping {
    pub mapping: RoleMapping,
    members: BTreeSet<String>,
}

impl ResolvedMapping {
    pub fn new<I, S>(mapping: RoleMapping, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            mapping,
            members: members.into_iter().map(|m| normalize_dn(m.as_ref())).collect(),
        }
    }

    /// Whether the DN is a member, comparing normalized DNs.
    pub fn has_member(&self, dn: &str) -> bool {
        self.members.contains(&normalize_dn(dn))
    }

    pub fn member_count(&self) -> usize {
        self.members.len()
    }
}

/// Roles granted to `path` by the mappings it is a member of.
pub fn resolve(path: &str, mappings: &[ResolvedMapping]) -> RoleSet {
    let mut roles = RoleSet::new();
    for resolved in mappings.iter().filter(|m| m.has_member(path)) {
        roles.extend(&resolved.mapping.roles);
    }
    roles
}

/// Canonical form of a DN for comparison.
///
/// Lowercases and drops whitespace around RDN separators and around `=`.
/// Escaped separators (`\,`) are kept as they are.
pub fn normalize_dn(dn: &str) -> String {
    split_unescaped(dn, ',')
        .into_iter()
        .map(|rdn| {
            split_unescaped(rdn, '=')
                .into_iter()
                .map(|part| part.trim().to_lowercase())
                .collect::<Vec<_>>()
                .join("=")
        })
        .filter(|rdn| !rdn.is_empty())
        .collect::<Vec<_>>()
        .join(",")
}

/// Whether `dn` equals `base` or lies below it.
pub fn is_under(dn: &str, base: &str) -> bool {
    let dn = normalize_dn(dn);
    let base = normalize_dn(base);
    base.is_empty() || dn == base || dn.ends_with(&format!(",{base}"))
}

fn split_unescaped(s: &str, separator: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut escaped = false;
    for (i, c) in s.char_indices() {
        if escaped {
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == separator {
            parts.push(&s[start..i]);
            start = i + c.len_utf8();
        }
    }
    parts.push(&s[start..]);
    parts
}

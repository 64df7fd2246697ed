//! Identity records shared by both snapshots.

use serde::Serialize;
use std::fmt;

use ldapsync_connector::types::{AccountDetails, NewAccount};

use crate::roles::RoleSet;

/// A user as seen by one of the two systems.
///
/// Two identities denote the same person iff their `correlation_key`
/// values are equal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    /// Login name.
    pub correlation_key: String,
    pub display_name: String,
    pub display_secondname: String,
    pub email: String,
    pub roles: RoleSet,
    /// Directory DN; only set for directory-sourced identities.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin_path: Option<String>,
    pub is_new: bool,
    pub is_outdated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub changes: Option<IdentityChanges>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sync_error: Option<String>,
}

/// Which facets of a matched identity differ from the registry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IdentityChanges {
    /// Name, second name or email.
    pub account: bool,
    pub roles: bool,
}

impl IdentityChanges {
    pub fn is_empty(&self) -> bool {
        !self.account && !self.roles
    }
}

impl Identity {
    pub fn new(correlation_key: impl Into<String>) -> Self {
        Self {
            correlation_key: correlation_key.into(),
            display_name: String::new(),
            display_secondname: String::new(),
            email: String::new(),
            roles: RoleSet::new(),
            origin_path: None,
            is_new: false,
            is_outdated: false,
            changes: None,
            sync_error: None,
        }
    }

    /// Registry-side identity from an account's details.
    pub fn from_account(login: impl Into<String>, details: AccountDetails, roles: RoleSet) -> Self {
        Self {
            display_name: details.first_name,
            display_secondname: details.last_name,
            email: details.email,
            roles,
            ..Self::new(login)
        }
    }

    #[must_use]
    pub fn with_names(mut self, name: impl Into<String>, secondname: impl Into<String>) -> Self {
        self.display_name = name.into();
        self.display_secondname = secondname.into();
        self
    }

    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = email.into();
        self
    }

    #[must_use]
    pub fn with_roles(mut self, roles: RoleSet) -> Self {
        self.roles = roles;
        self
    }

    #[must_use]
    pub fn with_origin(mut self, path: impl Into<String>) -> Self {
        self.origin_path = Some(path.into());
        self
    }

    /// Whether every attribute needed to create the account is present.
    pub fn is_complete(&self) -> bool {
        self.missing_attributes().is_empty()
    }

    /// Names of the required attributes that are empty.
    pub fn missing_attributes(&self) -> Vec<&'static str> {
        [
            ("login", &self.correlation_key),
            ("name", &self.display_name),
            ("surname", &self.display_secondname),
            ("email", &self.email),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect()
    }

    /// Compare the reconciled attributes with another view of the same person.
    pub fn diff(&self, other: &Identity) -> IdentityChanges {
        IdentityChanges {
            account: self.display_name != other.display_name
                || self.display_secondname != other.display_secondname
                || self.email != other.email,
            roles: self.roles != other.roles,
        }
    }

    /// Payload for creating this identity in the registry.
    pub fn to_new_account(&self) -> NewAccount {
        NewAccount {
            login: self.correlation_key.clone(),
            first_name: self.display_name.clone(),
            last_name: self.display_secondname.clone(),
            email: self.email.clone(),
        }
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} {}) at {}",
            self.correlation_key, self.display_name, self.display_secondname, self.email
        )
    }
}

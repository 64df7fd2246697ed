//! Connector Framework type definitions
//!
//! Enums and records exchanged between connectors and the sync engine.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Scope of a directory search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchScope {
    /// Only the base entry itself.
    Base,
    /// Direct children of the base entry.
    OneLevel,
    /// The base entry and everything below it.
    #[default]
    Subtree,
}

/// A single entry returned by a directory search.
///
/// Attribute names are stored lowercased; LDAP attribute names are
/// case-insensitive (RFC 4512).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryEntry {
    /// Distinguished name of the entry.
    pub dn: String,
    attrs: HashMap<String, Vec<String>>,
}

impl DirectoryEntry {
    /// Create an entry with no attributes.
    pub fn new(dn: impl Into<String>) -> Self {
        Self {
            dn: dn.into(),
            attrs: HashMap::new(),
        }
    }

    /// Builder-style attribute setter, appending to existing values.
    #[must_use]
    pub fn with(mut self, name: &str, value: impl Into<String>) -> Self {
        self.push(name, value);
        self
    }

    /// Append a value to an attribute.
    pub fn push(&mut self, name: &str, value: impl Into<String>) {
        self.attrs
            .entry(name.to_lowercase())
            .or_default()
            .push(value.into());
    }

    /// First value of an attribute, or `None` when absent.
    pub fn first(&self, name: &str) -> Option<&str> {
        self.attrs
            .get(&name.to_lowercase())
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// First non-empty value of an attribute, or an empty string.
    pub fn first_or_empty(&self, name: &str) -> &str {
        self.first(name).unwrap_or("")
    }

    /// All values of an attribute.
    pub fn values(&self, name: &str) -> &[String] {
        self.attrs
            .get(&name.to_lowercase())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Authenticated registry session.
///
/// Obtained once per run and passed by reference to every registry call.
#[derive(Clone, PartialEq, Eq)]
pub struct Session(String);

impl Session {
    /// Wrap a session token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token to put on the wire.
    pub fn token(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Session(***)")
    }
}

/// Profile attributes of a registry account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountDetails {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

/// Payload for creating a registry account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    pub login: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

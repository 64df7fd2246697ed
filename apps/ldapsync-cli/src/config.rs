//! Configuration file for the ldapsync CLI
//!
//! A YAML document with three sections:
//!
//! ```yaml
//! common:
//!   logpath: /var/log/rhn/ldapsync.log
//! directory:
//!   host: ldap.example.com
//!   bind_user: cn=admin,dc=example,dc=com
//!   bind_password: secret
//!   users_base: ou=people,dc=example,dc=com
//!   groups: { "cn=channels,ou=groups,dc=example,dc=com": [channel_admin] }
//!   frozen: [administrator]
//! registry:
//!   url: https://uyuni.example.com/rpc/api
//!   user: admin
//!   password: secret
//! ```
//!
//! The `registry` section is also accepted under its former name `spacewalk`.

use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};

use ldapsync_connector::config::{ConnectorConfig, REDACTED};
use ldapsync_connector_ldap::LdapConfig;
use ldapsync_connector_uyuni::UyuniConfig;
use ldapsync_provisioning::{MembershipKind, RoleMapping, SyncError, SyncResult, SyncSettings};

use crate::error::{CliError, CliResult};

/// Default location of the configuration file.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/rhn/ldapsync.conf";

/// Default location of the log file.
pub const DEFAULT_LOG_PATH: &str = "/var/log/rhn/ldapsync.log";

/// Parsed configuration file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub common: CommonSection,
    #[serde(default)]
    pub directory: DirectorySection,
    #[serde(default, alias = "spacewalk")]
    pub registry: RegistrySection,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CommonSection {
    #[serde(default = "default_logpath")]
    pub logpath: PathBuf,
}

impl Default for CommonSection {
    fn default() -> Self {
        Self {
            logpath: default_logpath(),
        }
    }
}

fn default_logpath() -> PathBuf {
    PathBuf::from(DEFAULT_LOG_PATH)
}

#[derive(Clone, Default, Deserialize)]
pub struct DirectorySection {
    #[serde(default)]
    pub host: String,
    /// Defaults to 389, or 636 with `ssl`.
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub ssl: bool,
    /// Upgrade the plain connection with STARTTLS.
    #[serde(default)]
    pub starttls: bool,
    #[serde(default)]
    pub bind_user: String,
    #[serde(default)]
    pub bind_password: String,
    #[serde(default)]
    pub users_base: String,
    /// Defaults to the keys of `groups`.
    #[serde(default)]
    pub member_groups: Option<Vec<String>>,
    /// organizationalRole DN to registry roles.
    #[serde(default)]
    pub roles: BTreeMap<String, Vec<String>>,
    /// Group DN to registry roles.
    #[serde(default)]
    pub groups: BTreeMap<String, Vec<String>>,
    /// Logins the sync never touches.
    #[serde(default)]
    pub frozen: Vec<String>,
}

impl fmt::Debug for DirectorySection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DirectorySection")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("ssl", &self.ssl)
            .field("starttls", &self.starttls)
            .field("bind_user", &self.bind_user)
            .field("bind_password", &REDACTED)
            .field("users_base", &self.users_base)
            .field("member_groups", &self.member_groups)
            .field("roles", &self.roles)
            .field("groups", &self.groups)
            .field("frozen", &self.frozen)
            .finish()
    }
}

#[derive(Clone, Default, Deserialize)]
pub struct RegistrySection {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub skip_tls_verify: bool,
}

impl fmt::Debug for RegistrySection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistrySection")
            .field("url", &self.url)
            .field("user", &self.user)
            .field("password", &REDACTED)
            .field("skip_tls_verify", &self.skip_tls_verify)
            .finish()
    }
}

impl Config {
    /// Read, parse and validate the configuration file.
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CliError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse without validating.
    pub fn parse(content: &str) -> CliResult<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Check every requirement that can be checked without the network.
    pub fn validate(&self) -> SyncResult<()> {
        let dir = &self.directory;
        let reg = &self.registry;

        for (name, value) in [
            ("directory/host", &dir.host),
            ("directory/bind_user", &dir.bind_user),
            ("directory/bind_password", &dir.bind_password),
            ("directory/users_base", &dir.users_base),
            ("registry/url", &reg.url),
            ("registry/user", &reg.user),
            ("registry/password", &reg.password),
        ] {
            if value.trim().is_empty() {
                return Err(SyncError::configuration(format!("{name} is required")));
            }
        }

        if dir.port == Some(0) {
            return Err(SyncError::configuration("directory/port must be non-zero"));
        }

        if dir.frozen.iter().all(|login| login.trim().is_empty()) {
            return Err(SyncError::configuration(
                "directory/frozen needs at least one emergency account",
            ));
        }

        if dir.roles.is_empty() && dir.groups.is_empty() {
            return Err(SyncError::configuration(
                "either directory/groups or directory/roles needs to be specified",
            ));
        }

        for (section, mappings) in [("roles", &dir.roles), ("groups", &dir.groups)] {
            for (path, roles) in mappings {
                if path.trim().is_empty() {
                    return Err(SyncError::configuration(format!(
                        "directory/{section} has an entry with an empty DN"
                    )));
                }
                if roles.iter().all(|r| r.trim().is_empty()) {
                    return Err(SyncError::configuration(format!(
                        "directory/{section} entry {path} has no roles"
                    )));
                }
            }
        }

        if let Some(groups) = &dir.member_groups {
            if groups.iter().any(|g| g.trim().is_empty()) {
                return Err(SyncError::configuration(
                    "directory/member_groups has an empty DN",
                ));
            }
        }

        self.ldap_config()
            .validate()
            .map_err(|e| SyncError::configuration(format!("directory: {e}")))?;
        self.uyuni_config()
            .validate()
            .map_err(|e| SyncError::configuration(format!("registry: {e}")))?;

        Ok(())
    }

    /// Directory connection settings.
    pub fn ldap_config(&self) -> LdapConfig {
        let dir = &self.directory;
        let mut config = LdapConfig::new(dir.host.trim(), dir.bind_user.trim())
            .with_password(dir.bind_password.clone());
        if dir.ssl {
            config = config.with_ssl();
        }
        if dir.starttls {
            config = config.with_starttls();
        }
        if let Some(port) = dir.port {
            config = config.with_port(port);
        }
        config
    }

    /// Registry endpoint settings. Credentials are used at login.
    pub fn uyuni_config(&self) -> UyuniConfig {
        let config = UyuniConfig::new(self.registry.url.trim());
        if self.registry.skip_tls_verify {
            config.with_unverified_tls()
        } else {
            config
        }
    }

    /// Groups whose members are the sync candidates.
    pub fn member_groups(&self) -> Vec<String> {
        match &self.directory.member_groups {
            Some(groups) => groups.clone(),
            None => self.directory.groups.keys().cloned().collect(),
        }
    }

    pub fn frozen(&self) -> BTreeSet<String> {
        self.directory
            .frozen
            .iter()
            .map(|login| login.trim())
            .filter(|login| !login.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Reconciliation settings: `roles` entries map organizationalRole
    /// occupants, `groups` entries map group members.
    pub fn sync_settings(&self) -> SyncSettings {
        let dir = &self.directory;
        let role_mappings = dir
            .roles
            .iter()
            .map(|(path, roles)| RoleMapping::new(path, roles.clone(), MembershipKind::RoleOccupant))
            .chain(
                dir.groups
                    .iter()
                    .map(|(path, roles)| RoleMapping::new(path, roles.clone(), MembershipKind::GroupMember)),
            )
            .collect();

        SyncSettings {
            users_base: Some(dir.users_base.trim().to_string()),
            member_groups: self.member_groups(),
            role_mappings,
            frozen: self.frozen(),
        }
    }
}

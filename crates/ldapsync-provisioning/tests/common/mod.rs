//! Manual mock clients shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::{BTreeMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use ldapsync_connector::error::{ConnectorError, ConnectorResult};
use ldapsync_connector::traits::{DirectoryClient, RegistryClient};
use ldapsync_connector::types::{AccountDetails, DirectoryEntry, NewAccount, SearchScope, Session};
use ldapsync_provisioning::roles::is_under;

pub const USERS_BASE: &str = "ou=people,dc=example,dc=com";
pub const MEMBER_GROUP: &str = "cn=uyuni,ou=groups,dc=example,dc=com";
pub const PASSWORD: &str = "secret";

pub fn user_dn(uid: &str) -> String {
    format!("uid={uid},{USERS_BASE}")
}

/// A person entry with `cn` in "Given Surname" form.
pub fn person(uid: &str, given: &str, surname: &str) -> DirectoryEntry {
    DirectoryEntry::new(user_dn(uid))
        .with("objectClass", "inetOrgPerson")
        .with("uid", uid)
        .with("cn", format!("{given} {surname}"))
        .with("mail", format!("{uid}@example.com"))
}

pub fn group(dn: &str, members: &[String]) -> DirectoryEntry {
    members.iter().fold(
        DirectoryEntry::new(dn).with("objectClass", "groupOfNames"),
        |entry, member| entry.with("member", member.clone()),
    )
}

pub fn organizational_role(dn: &str, occupants: &[String]) -> DirectoryEntry {
    occupants.iter().fold(
        DirectoryEntry::new(dn).with("objectClass", "organizationalRole"),
        |entry, occupant| entry.with("roleOccupant", occupant.clone()),
    )
}

// =============================================================================
// Mock Directory
// =============================================================================

/// In-memory directory answering subtree searches.
pub struct MockDirectory {
    entries: Mutex<Vec<DirectoryEntry>>,
    failing_bases: Mutex<HashSet<String>>,
    connection_down: AtomicBool,
    search_call_count: AtomicUsize,
}

impl MockDirectory {
    pub fn new(entries: Vec<DirectoryEntry>) -> Self {
        Self {
            entries: Mutex::new(entries),
            failing_bases: Mutex::new(HashSet::new()),
            connection_down: AtomicBool::new(false),
            search_call_count: AtomicUsize::new(0),
        }
    }

    /// Searches based at `base` fail with an operation error.
    pub fn with_failing_base(self, base: &str) -> Self {
        self.failing_bases.lock().unwrap().insert(base.to_string());
        self
    }

    pub fn set_connection_down(&self, down: bool) {
        self.connection_down.store(down, Ordering::SeqCst);
    }

    pub fn search_calls(&self) -> usize {
        self.search_call_count.load(Ordering::SeqCst)
    }

    fn matches_filter(entry: &DirectoryEntry, filter: &str) -> bool {
        let classes: Vec<String> = entry
            .values("objectClass")
            .iter()
            .map(|c| c.to_lowercase())
            .collect();
        match filter {
            "(objectClass=*)" => true,
            "(objectClass=organizationalRole)" => classes.iter().any(|c| c == "organizationalrole"),
            "(|(objectClass=groupOfNames)(objectClass=group))" => classes
                .iter()
                .any(|c| c == "groupofnames" || c == "group"),
            other => panic!("unexpected filter in test: {other}"),
        }
    }
}

#[async_trait]
impl DirectoryClient for MockDirectory {
    fn display_name(&self) -> &str {
        "mock directory"
    }

    async fn search(
        &self,
        base: &str,
        scope: SearchScope,
        filter: &str,
        _attributes: &[&str],
    ) -> ConnectorResult<Vec<DirectoryEntry>> {
        self.search_call_count.fetch_add(1, Ordering::SeqCst);
        assert_eq!(scope, SearchScope::Subtree);

        if self.connection_down.load(Ordering::SeqCst) {
            return Err(ConnectorError::connection_failed("Can't contact LDAP server"));
        }
        if self.failing_bases.lock().unwrap().contains(base) {
            return Err(ConnectorError::operation_failed("size limit exceeded"));
        }

        Ok(self
            .entries
            .lock()
            .unwrap()
            .iter()
            .filter(|e| is_under(&e.dn, base) && Self::matches_filter(e, filter))
            .cloned()
            .collect())
    }

    async fn unbind(&self) -> ConnectorResult<()> {
        Ok(())
    }
}

// =============================================================================
// Mock Registry
// =============================================================================

#[derive(Debug, Clone)]
struct Account {
    details: AccountDetails,
    roles: Vec<String>,
}

/// In-memory registry with per-login and per-role failure injection.
pub struct MockRegistry {
    accounts: Mutex<BTreeMap<String, Account>>,
    failing_creates: Mutex<HashSet<String>>,
    failing_grants: Mutex<HashSet<String>>,
    failing_revokes: Mutex<HashSet<String>>,
    list_users_fails: AtomicBool,
    calls: Mutex<Vec<String>>,
}

impl MockRegistry {
    pub fn new() -> Self {
        Self {
            accounts: Mutex::new(BTreeMap::new()),
            failing_creates: Mutex::new(HashSet::new()),
            failing_grants: Mutex::new(HashSet::new()),
            failing_revokes: Mutex::new(HashSet::new()),
            list_users_fails: AtomicBool::new(false),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_account(self, login: &str, first: &str, last: &str, roles: &[&str]) -> Self {
        self.accounts.lock().unwrap().insert(
            login.to_string(),
            Account {
                details: AccountDetails {
                    first_name: first.to_string(),
                    last_name: last.to_string(),
                    email: format!("{login}@example.com"),
                },
                roles: roles.iter().map(|r| (*r).to_string()).collect(),
            },
        );
        self
    }

    pub fn with_create_error(self, login: &str) -> Self {
        self.failing_creates.lock().unwrap().insert(login.to_string());
        self
    }

    pub fn with_grant_error(self, role: &str) -> Self {
        self.failing_grants.lock().unwrap().insert(role.to_string());
        self
    }

    pub fn with_revoke_error(self, role: &str) -> Self {
        self.failing_revokes.lock().unwrap().insert(role.to_string());
        self
    }

    pub fn with_list_users_error(self) -> Self {
        self.list_users_fails.store(true, Ordering::SeqCst);
        self
    }

    pub fn has_account(&self, login: &str) -> bool {
        self.accounts.lock().unwrap().contains_key(login)
    }

    pub fn roles_of(&self, login: &str) -> Vec<String> {
        let mut roles = self
            .accounts
            .lock()
            .unwrap()
            .get(login)
            .map(|a| a.roles.clone())
            .unwrap_or_default();
        roles.sort();
        roles
    }

    /// Mutating calls made so far, as "method login [role]".
    pub fn mutations(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| !c.starts_with("user.list") && !c.starts_with("user.getDetails"))
            .cloned()
            .collect()
    }

    fn log(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }

    fn not_found(login: &str) -> ConnectorError {
        ConnectorError::RemoteFault {
            code: -213,
            message: format!("Could not find user {login}"),
        }
    }
}

#[async_trait]
impl RegistryClient for MockRegistry {
    fn display_name(&self) -> &str {
        "mock registry"
    }

    async fn authenticate(&self, _user: &str, password: &str) -> ConnectorResult<Session> {
        if password == PASSWORD {
            Ok(Session::new("mock-session"))
        } else {
            Err(ConnectorError::AuthenticationFailed)
        }
    }

    async fn logout(&self, _session: &Session) -> ConnectorResult<()> {
        Ok(())
    }

    async fn list_users(&self, _session: &Session) -> ConnectorResult<Vec<String>> {
        self.log("user.listUsers".to_string());
        if self.list_users_fails.load(Ordering::SeqCst) {
            return Err(ConnectorError::invalid_data("user.listUsers: expected array"));
        }
        Ok(self.accounts.lock().unwrap().keys().cloned().collect())
    }

    async fn get_details(&self, _session: &Session, login: &str) -> ConnectorResult<AccountDetails> {
        self.log(format!("user.getDetails {login}"));
        self.accounts
            .lock()
            .unwrap()
            .get(login)
            .map(|a| a.details.clone())
            .ok_or_else(|| Self::not_found(login))
    }

    async fn list_roles(&self, _session: &Session, login: &str) -> ConnectorResult<Vec<String>> {
        self.log(format!("user.listRoles {login}"));
        self.accounts
            .lock()
            .unwrap()
            .get(login)
            .map(|a| a.roles.clone())
            .ok_or_else(|| Self::not_found(login))
    }

    async fn create_user(&self, _session: &Session, account: &NewAccount) -> ConnectorResult<()> {
        self.log(format!("user.create {}", account.login));
        if self.failing_creates.lock().unwrap().contains(&account.login) {
            return Err(ConnectorError::RemoteFault {
                code: -501,
                message: format!("Invalid email address for {}", account.login),
            });
        }

        let mut accounts = self.accounts.lock().unwrap();
        if accounts.contains_key(&account.login) {
            return Err(ConnectorError::RemoteFault {
                code: -100,
                message: format!("User {} already exists", account.login),
            });
        }
        accounts.insert(
            account.login.clone(),
            Account {
                details: AccountDetails {
                    first_name: account.first_name.clone(),
                    last_name: account.last_name.clone(),
                    email: account.email.clone(),
                },
                roles: Vec::new(),
            },
        );
        Ok(())
    }

    async fn add_role(&self, _session: &Session, login: &str, role: &str) -> ConnectorResult<()> {
        self.log(format!("user.addRole {login} {role}"));
        if self.failing_grants.lock().unwrap().contains(role) {
            return Err(ConnectorError::RemoteFault {
                code: -210,
                message: format!("Cannot grant {role}"),
            });
        }
        let mut accounts = self.accounts.lock().unwrap();
        let account = accounts.get_mut(login).ok_or_else(|| Self::not_found(login))?;
        if !account.roles.iter().any(|r| r == role) {
            account.roles.push(role.to_string());
        }
        Ok(())
    }

    async fn remove_role(&self, _session: &Session, login: &str, role: &str) -> ConnectorResult<()> {
        self.log(format!("user.removeRole {login} {role}"));
        if self.failing_revokes.lock().unwrap().contains(role) {
            return Err(ConnectorError::RemoteFault {
                code: -211,
                message: format!("Cannot revoke {role}"),
            });
        }
        let mut accounts = self.accounts.lock().unwrap();
        let account = accounts.get_mut(login).ok_or_else(|| Self::not_found(login))?;
        account.roles.retain(|r| r != role);
        Ok(())
    }
}

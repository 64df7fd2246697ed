//! Uyuni Connector implementation
//!
//! Implements the RegistryClient trait over the Uyuni XML-RPC API.

use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use tracing::{debug, info, instrument, warn};

use ldapsync_connector::config::ConnectorConfig;
use ldapsync_connector::error::{ConnectorError, ConnectorResult};
use ldapsync_connector::traits::RegistryClient;
use ldapsync_connector::types::{AccountDetails, NewAccount, Session};

use crate::config::UyuniConfig;
use crate::xmlrpc::{self, Value};

/// `usePamAuth` flag of `user.create`: the account authenticates externally.
const USE_PAM_AUTH: i32 = 1;

/// Uyuni registry connector.
pub struct UyuniConnector {
    /// Configuration.
    config: UyuniConfig,

    /// Display name for this connector instance.
    display_name: String,

    /// HTTP client.
    client: Client,
}

impl std::fmt::Debug for UyuniConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UyuniConnector")
            .field("config", &self.config.redacted())
            .field("display_name", &self.display_name)
            .finish()
    }
}

impl UyuniConnector {
    /// Create a new Uyuni connector with the given configuration.
    pub fn new(config: UyuniConfig) -> ConnectorResult<Self> {
        config.validate()?;
        config.tls.validate_security();

        let display_name = format!("Uyuni: {}", config.url);
        let client = Self::build_client(&config)?;

        Ok(Self {
            config,
            display_name,
            client,
        })
    }

    /// Build the reqwest client with configuration.
    fn build_client(config: &UyuniConfig) -> ConnectorResult<Client> {
        let mut builder = Client::builder()
            .timeout(config.connection.read_timeout())
            .connect_timeout(config.connection.connection_timeout());

        if !config.tls.verify_certificate {
            builder = builder.danger_accept_invalid_certs(true);
        }

        builder
            .build()
            .map_err(|e| ConnectorError::InvalidConfiguration {
                message: format!("Failed to build HTTP client: {e}"),
            })
    }

    /// Issue one XML-RPC call and decode its result.
    ///
    /// Parameters are never logged; `auth.login` carries the password.
    async fn call(&self, method: &str, params: &[Value]) -> ConnectorResult<Value> {
        let body = xmlrpc::encode_call(method, params);

        debug!(method = %method, "Sending XML-RPC call");

        let response = self
            .client
            .post(&self.config.url)
            .header(header::CONTENT_TYPE, "text/xml")
            .header(header::ACCEPT, "text/xml")
            .body(body)
            .send()
            .await
            .map_err(|e| self.map_transport_error(method, e))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| ConnectorError::network_with_source("Failed to read XML-RPC response", e))?;

        if status.is_server_error() || status == StatusCode::NOT_FOUND {
            return Err(ConnectorError::connection_failed(format!(
                "{method}: endpoint {} returned HTTP {status}",
                self.config.url
            )));
        }
        if !status.is_success() {
            return Err(ConnectorError::operation_failed(format!(
                "{method} returned HTTP {status}"
            )));
        }

        let result = xmlrpc::parse_response(&text)?.into_result();
        if let Err(ConnectorError::RemoteFault { code, message }) = &result {
            debug!(method = %method, code = code, fault = %message, "XML-RPC fault");
        }
        result
    }

    fn map_transport_error(&self, method: &str, e: reqwest::Error) -> ConnectorError {
        if e.is_timeout() {
            ConnectorError::ConnectionTimeout {
                timeout_secs: self.config.connection.read_timeout_secs,
            }
        } else if e.is_connect() {
            ConnectorError::connection_failed_with_source(
                format!("Failed to reach {} for {}", self.config.url, method),
                e,
            )
        } else {
            ConnectorError::network_with_source(format!("{method} request failed"), e)
        }
    }

    fn expect_string(method: &str, value: &Value) -> ConnectorResult<String> {
        value.as_str().map(str::to_string).ok_or_else(|| {
            ConnectorError::invalid_data(format!(
                "{method}: expected string, got {}",
                value.type_name()
            ))
        })
    }

    fn expect_array<'a>(method: &str, value: &'a Value) -> ConnectorResult<&'a [Value]> {
        value.as_array().ok_or_else(|| {
            ConnectorError::invalid_data(format!(
                "{method}: expected array, got {}",
                value.type_name()
            ))
        })
    }

    /// Optional string member of a struct; absent or nil reads as empty.
    fn member_string(value: &Value, key: &str) -> String {
        value
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    }
}

#[async_trait]
impl RegistryClient for UyuniConnector {
    fn display_name(&self) -> &str {
        &self.display_name
    }

    #[instrument(skip(self, password), fields(url = %self.config.url))]
    async fn authenticate(&self, user: &str, password: &str) -> ConnectorResult<Session> {
        let value = match self
            .call("auth.login", &[Value::from(user), Value::from(password)])
            .await
        {
            Ok(value) => value,
            Err(ConnectorError::RemoteFault { code, message }) => {
                warn!(user = %user, code = code, fault = %message, "Registry login rejected");
                return Err(ConnectorError::AuthenticationFailed);
            }
            Err(e) => return Err(e),
        };

        let token = Self::expect_string("auth.login", &value)?;
        if token.is_empty() {
            return Err(ConnectorError::AuthenticationFailed);
        }

        info!(user = %user, "Registry session established");
        Ok(Session::new(token))
    }

    async fn logout(&self, session: &Session) -> ConnectorResult<()> {
        self.call("auth.logout", &[Value::from(session.token())])
            .await?;
        debug!("Registry session closed");
        Ok(())
    }

    #[instrument(skip(self, session))]
    async fn list_users(&self, session: &Session) -> ConnectorResult<Vec<String>> {
        let value = self
            .call("user.listUsers", &[Value::from(session.token())])
            .await?;

        let logins = Self::expect_array("user.listUsers", &value)?
            .iter()
            .map(|user| {
                user.get("login")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .ok_or_else(|| {
                        ConnectorError::invalid_data("user.listUsers: entry without login")
                    })
            })
            .collect::<ConnectorResult<Vec<_>>>()?;

        debug!(count = logins.len(), "Listed registry users");
        Ok(logins)
    }

    #[instrument(skip(self, session))]
    async fn get_details(&self, session: &Session, login: &str) -> ConnectorResult<AccountDetails> {
        let value = self
            .call(
                "user.getDetails",
                &[Value::from(session.token()), Value::from(login)],
            )
            .await?;

        if !matches!(value, Value::Struct(_)) {
            return Err(ConnectorError::invalid_data(format!(
                "user.getDetails: expected struct, got {}",
                value.type_name()
            )));
        }

        Ok(AccountDetails {
            first_name: Self::member_string(&value, "first_name"),
            last_name: Self::member_string(&value, "last_name"),
            email: Self::member_string(&value, "email"),
        })
    }

    #[instrument(skip(self, session))]
    async fn list_roles(&self, session: &Session, login: &str) -> ConnectorResult<Vec<String>> {
        let value = self
            .call(
                "user.listRoles",
                &[Value::from(session.token()), Value::from(login)],
            )
            .await?;

        // Some servers answer nil instead of an empty array.
        if value == Value::Nil {
            return Ok(Vec::new());
        }

        Self::expect_array("user.listRoles", &value)?
            .iter()
            .map(|role| Self::expect_string("user.listRoles", role))
            .collect()
    }

    #[instrument(skip(self, session, account), fields(login = %account.login))]
    async fn create_user(&self, session: &Session, account: &NewAccount) -> ConnectorResult<()> {
        self.call(
            "user.create",
            &[
                Value::from(session.token()),
                Value::from(account.login.as_str()),
                Value::from(""),
                Value::from(account.first_name.as_str()),
                Value::from(account.last_name.as_str()),
                Value::from(account.email.as_str()),
                Value::from(USE_PAM_AUTH),
            ],
        )
        .await?;

        info!(login = %account.login, "Registry account created");
        Ok(())
    }

    #[instrument(skip(self, session))]
    async fn add_role(&self, session: &Session, login: &str, role: &str) -> ConnectorResult<()> {
        self.call(
            "user.addRole",
            &[
                Value::from(session.token()),
                Value::from(login),
                Value::from(role),
            ],
        )
        .await?;
        Ok(())
    }

    #[instrument(skip(self, session))]
    async fn remove_role(&self, session: &Session, login: &str, role: &str) -> ConnectorResult<()> {
        self.call(
            "user.removeRole",
            &[
                Value::from(session.token()),
                Value::from(login),
                Value::from(role),
            ],
        )
        .await?;
        Ok(())
    }
}

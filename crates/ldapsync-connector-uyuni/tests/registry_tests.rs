//! Integration tests for the Uyuni connector using wiremock.
//!
//! These tests verify the XML-RPC wire behavior against a mock HTTP
//! server: the session handshake, typed decoding of list and struct
//! results, faults, and transport failures.

use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use ldapsync_connector::error::ConnectorError;
use ldapsync_connector::traits::RegistryClient;
use ldapsync_connector::types::{NewAccount, Session};
use ldapsync_connector_uyuni::{UyuniConfig, UyuniConnector};

// =============================================================================
// Test Helpers
// =============================================================================

fn create_connector(server: &MockServer) -> UyuniConnector {
    let config = UyuniConfig::new(format!("{}/rpc/api", server.uri()));
    UyuniConnector::new(config).unwrap()
}

fn xml_response(value: &str) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("content-type", "text/xml")
        .set_body_string(format!(
            "<?xml version=\"1.0\"?><methodResponse><params><param><value>{value}</value></param></params></methodResponse>"
        ))
}

fn fault_response(code: i64, message: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_string(format!(
        "<?xml version=\"1.0\"?><methodResponse><fault><value><struct>\
         <member><name>faultCode</name><value><int>{code}</int></value></member>\
         <member><name>faultString</name><value><string>{message}</string></value></member>\
         </struct></value></fault></methodResponse>"
    ))
}

fn session() -> Session {
    Session::new("session-token")
}

// =============================================================================
// Authentication Tests
// =============================================================================

#[tokio::test]
async fn test_authenticate_returns_session() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/rpc/api"))
        .and(header("content-type", "text/xml"))
        .and(body_string_contains("<methodName>auth.login</methodName>"))
        .and(body_string_contains("<string>admin</string>"))
        .respond_with(xml_response("<string>session-token</string>"))
        .expect(1)
        .mount(&server)
        .await;

    let connector = create_connector(&server);
    let session = connector.authenticate("admin", "secret").await.unwrap();

    assert_eq!(session.token(), "session-token");
}

#[tokio::test]
async fn test_authenticate_fault_is_authentication_failure() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(fault_response(
            2950,
            "Either the password or username is incorrect.",
        ))
        .mount(&server)
        .await;

    let connector = create_connector(&server);
    let err = connector.authenticate("admin", "wrong").await.unwrap_err();

    assert!(matches!(err, ConnectorError::AuthenticationFailed));
}

#[tokio::test]
async fn test_logout_sends_token() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(body_string_contains("<methodName>auth.logout</methodName>"))
        .and(body_string_contains("<string>session-token</string>"))
        .respond_with(xml_response("<int>1</int>"))
        .expect(1)
        .mount(&server)
        .await;

    let connector = create_connector(&server);
    connector.logout(&session()).await.unwrap();
}

// =============================================================================
// Read Tests
// =============================================================================

#[tokio::test]
async fn test_list_users_extracts_logins() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(body_string_contains("<methodName>user.listUsers</methodName>"))
        .respond_with(xml_response(
            "<array><data>\
             <value><struct><member><name>login</name><value><string>admin</string></value></member>\
             <member><name>id</name><value><i4>1</i4></value></member></struct></value>\
             <value><struct><member><name>login</name><value><string>jdoe</string></value></member>\
             <member><name>id</name><value><i4>2</i4></value></member></struct></value>\
             </data></array>",
        ))
        .mount(&server)
        .await;

    let connector = create_connector(&server);
    let logins = connector.list_users(&session()).await.unwrap();

    assert_eq!(logins, vec!["admin".to_string(), "jdoe".to_string()]);
}

#[tokio::test]
async fn test_get_details_decodes_struct() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(body_string_contains("<methodName>user.getDetails</methodName>"))
        .and(body_string_contains("<string>jdoe</string>"))
        .respond_with(xml_response(
            "<struct>\
             <member><name>first_name</name><value><string>John</string></value></member>\
             <member><name>last_name</name><value><string>Doe</string></value></member>\
             <member><name>email</name><value><string>j@x.com</string></value></member>\
             <member><name>use_pam</name><value><boolean>1</boolean></value></member>\
             </struct>",
        ))
        .mount(&server)
        .await;

    let connector = create_connector(&server);
    let details = connector.get_details(&session(), "jdoe").await.unwrap();

    assert_eq!(details.first_name, "John");
    assert_eq!(details.last_name, "Doe");
    assert_eq!(details.email, "j@x.com");
}

#[tokio::test]
async fn test_list_roles_empty() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(body_string_contains("<methodName>user.listRoles</methodName>"))
        .respond_with(xml_response("<array><data></data></array>"))
        .mount(&server)
        .await;

    let connector = create_connector(&server);
    let roles = connector.list_roles(&session(), "jdoe").await.unwrap();

    assert!(roles.is_empty());
}

#[tokio::test]
async fn test_list_roles_rejects_unexpected_type() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(xml_response("<int>7</int>"))
        .mount(&server)
        .await;

    let connector = create_connector(&server);
    let err = connector.list_roles(&session(), "jdoe").await.unwrap_err();

    assert!(matches!(err, ConnectorError::InvalidData { .. }));
}

// =============================================================================
// Write Tests
// =============================================================================

#[tokio::test]
async fn test_create_user_uses_external_authentication() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(body_string_contains("<methodName>user.create</methodName>"))
        .and(body_string_contains(
            "<param><value><string>jdoe</string></value></param>\
             <param><value><string></string></value></param>\
             <param><value><string>John</string></value></param>\
             <param><value><string>Doe</string></value></param>\
             <param><value><string>j@x.com</string></value></param>\
             <param><value><int>1</int></value></param>",
        ))
        .respond_with(xml_response("<int>1</int>"))
        .expect(1)
        .mount(&server)
        .await;

    let connector = create_connector(&server);
    let account = NewAccount {
        login: "jdoe".to_string(),
        first_name: "John".to_string(),
        last_name: "Doe".to_string(),
        email: "j@x.com".to_string(),
    };

    connector.create_user(&session(), &account).await.unwrap();
}

#[tokio::test]
async fn test_add_role_fault_is_remote_fault() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(body_string_contains("<methodName>user.addRole</methodName>"))
        .respond_with(fault_response(-210, "Role does not exist"))
        .mount(&server)
        .await;

    let connector = create_connector(&server);
    let err = connector
        .add_role(&session(), "jdoe", "bogus_admin")
        .await
        .unwrap_err();

    match err {
        ConnectorError::RemoteFault { code, message } => {
            assert_eq!(code, -210);
            assert_eq!(message, "Role does not exist");
        }
        other => panic!("expected remote fault, got {other:?}"),
    }
}

#[tokio::test]
async fn test_remove_role_success() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(body_string_contains("<methodName>user.removeRole</methodName>"))
        .and(body_string_contains("<string>channel_admin</string>"))
        .respond_with(xml_response("<int>1</int>"))
        .expect(1)
        .mount(&server)
        .await;

    let connector = create_connector(&server);
    connector
        .remove_role(&session(), "jdoe", "channel_admin")
        .await
        .unwrap();
}

// =============================================================================
// Transport Failure Tests
// =============================================================================

#[tokio::test]
async fn test_server_error_status_is_connection_level() {
    for status in [404, 500, 502, 503] {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(status).set_body_string("Bad Gateway"))
            .mount(&server)
            .await;

        let connector = create_connector(&server);
        let err = connector.authenticate("admin", "secret").await.unwrap_err();

        assert!(
            matches!(err, ConnectorError::ConnectionFailed { .. }),
            "HTTP {status}: {err:?}"
        );
    }
}

#[tokio::test]
async fn test_client_error_status_is_operation_failure() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_string("Bad Request"))
        .mount(&server)
        .await;

    let connector = create_connector(&server);
    let err = connector.list_users(&session()).await.unwrap_err();

    assert!(matches!(err, ConnectorError::OperationFailed { .. }));
}

#[tokio::test]
async fn test_malformed_body_is_invalid_data() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html><body>oops</body></html>"))
        .mount(&server)
        .await;

    let connector = create_connector(&server);
    let err = connector.list_users(&session()).await.unwrap_err();

    assert!(matches!(err, ConnectorError::InvalidData { .. }));
}

#[tokio::test]
async fn test_unreachable_server_is_connection_level() {
    // Reserve a port, then release it so nothing listens there.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let config = UyuniConfig::new(format!("http://127.0.0.1:{port}/rpc/api"));
    let connector = UyuniConnector::new(config).unwrap();
    let err = connector.authenticate("admin", "secret").await.unwrap_err();

    assert!(err.is_connection_level(), "unexpected error: {err:?}");
}

//! Google Secret Manager client tests against a mock HTTP server

mod common;

use common::{SECRET_VALUE, Settings, init_logging, shared, test_env};
use settings_secrets::{
    GoogleSecretManagerClient, SecretClientError, SecretManagerClient, SettingsLoader,
};

const PROJECT: &str = "test-project";
const TOKEN: &str = "ya29.test-token";

fn access_path(name: &str, version: &str) -> String {
    format!("/v1/projects/{PROJECT}/secrets/{name}/versions/{version}:access")
}

fn payload(data: &str) -> String {
    format!(
        r#"{{"name": "projects/123/secrets/x/versions/1", "payload": {{"data": "{data}"}}}}"#
    )
}

fn client(server: &mockito::ServerGuard) -> GoogleSecretManagerClient {
    GoogleSecretManagerClient::new(PROJECT, TOKEN).endpoint(server.url())
}

#[test]
fn test_access_secret_version() {
    let mut server = mockito::Server::new();
    let mock = server
        .mock("GET", access_path("db-pw", "v2").as_str())
        .match_header("authorization", format!("Bearer {TOKEN}").as_str())
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(payload("czNjcjN0Cg=="))
        .create();

    let value = client(&server).get_secret("db-pw", "v2").unwrap();

    assert_eq!(value, "s3cr3t\n");
    mock.assert();
}

#[test]
fn test_not_found() {
    let mut server = mockito::Server::new();
    server
        .mock("GET", access_path("missing", "latest").as_str())
        .with_status(404)
        .with_body(r#"{"error": {"code": 404, "status": "NOT_FOUND"}}"#)
        .create();

    let err = client(&server).get_secret("missing", "latest").unwrap_err();

    assert!(matches!(
        err,
        SecretClientError::NotFound { ref name, ref version } if name == "missing" && version == "latest"
    ));
}

#[test]
fn test_permission_denied() {
    let mut server = mockito::Server::new();
    server
        .mock("GET", access_path("db-pw", "v2").as_str())
        .with_status(403)
        .with_body("forbidden")
        .create();

    let err = client(&server).get_secret("db-pw", "v2").unwrap_err();

    assert!(matches!(err, SecretClientError::PermissionDenied { ref message, .. } if message == "forbidden"));
}

#[test]
fn test_server_error() {
    let mut server = mockito::Server::new();
    server
        .mock("GET", access_path("db-pw", "v2").as_str())
        .with_status(500)
        .with_body("boom")
        .create();

    let err = client(&server).get_secret("db-pw", "v2").unwrap_err();

    assert!(matches!(err, SecretClientError::Backend(_)));
    assert!(err.to_string().contains("db-pw"));
}

#[test]
fn test_payload_not_utf8() {
    let mut server = mockito::Server::new();
    server
        .mock("GET", access_path("binary", "1").as_str())
        .with_status(200)
        .with_body(payload("//4="))
        .create();

    let err = client(&server).get_secret("binary", "1").unwrap_err();

    assert!(matches!(err, SecretClientError::Decode { .. }));
}

#[test]
fn test_load_settings_from_gcp() {
    init_logging();
    let mut server = mockito::Server::new();
    let encoded = "dGVzdC12YWx1ZS1mcm9tLXNlY3JldC1tYW5hZ2Vy";
    for (name, version) in [
        ("test-secret", "v5"),
        ("test-var2-secret-name", "latest"),
        ("test-db-password", "v2"),
    ] {
        server
            .mock("GET", access_path(name, version).as_str())
            .with_status(200)
            .with_body(payload(encoded))
            .create();
    }

    let settings = SettingsLoader::<Settings>::builder()
        .env_nested_delimiter("__")
        .env_reader(shared(test_env()))
        .with_secret_manager(client(&server))
        .default_secret_version("latest")
        .build()
        .unwrap()
        .load()
        .unwrap()
        .settings;

    assert_eq!(settings.var1, SECRET_VALUE);
    assert_eq!(settings.var2, SECRET_VALUE);
    assert_eq!(settings.db.password, SECRET_VALUE);
    assert_eq!(settings.db.host, "test-db-host");
}

#[test]
fn test_api_error_fails_validation() {
    let mut server = mockito::Server::new();
    server
        .mock("GET", mockito::Matcher::Any)
        .with_status(500)
        .with_body("test-error")
        .create();

    let err = SettingsLoader::<Settings>::builder()
        .env_nested_delimiter("__")
        .env_reader(shared(test_env()))
        .with_secret_manager(client(&server))
        .default_secret_version("latest")
        .build()
        .unwrap()
        .load()
        .unwrap_err();

    assert!(err.is_validation_error());
    assert_eq!(err.missing_fields().len(), 3);
}

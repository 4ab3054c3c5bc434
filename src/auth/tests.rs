//! Tests for the auth module

use super::authenticator::AssertionClaims;
use super::*;
use crate::config::Connection;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::path::PathBuf;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SCOPE: &str = "https://www.googleapis.com/auth/analytics.readonly";

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn key_document(token_uri: Option<&str>) -> serde_json::Value {
    let private_key = std::fs::read_to_string(fixture("test_rsa_private.pem")).unwrap();
    let mut doc = json!({
        "type": "service_account",
        "project_id": "analytics-test",
        "private_key_id": "kid-1",
        "private_key": private_key,
        "client_email": "etl@analytics-test.iam.gserviceaccount.com",
    });
    if let Some(uri) = token_uri {
        doc["token_uri"] = json!(uri);
    }
    doc
}

fn service_account(token_uri: &str) -> Credentials {
    Credentials::ServiceAccount(ServiceAccountKey::from_value(&key_document(Some(token_uri))).unwrap())
}

// ============================================================================
// Credential selection
// ============================================================================

#[test]
fn test_bearer_token_takes_precedence() {
    let connection = Connection {
        password: Some("ya29.token".into()),
        extra: Some(json!({"client_secrets": key_document(None)})),
        ..Default::default()
    };

    let credentials = Credentials::from_connection(&connection, None).unwrap();
    assert!(matches!(credentials, Credentials::AccessToken(t) if t == "ya29.token"));
}

#[test]
fn test_empty_password_falls_through_to_client_secrets() {
    let connection = Connection {
        password: Some(String::new()),
        extra: Some(json!({"client_secrets": key_document(None)})),
        ..Default::default()
    };

    let credentials = Credentials::from_connection(&connection, None).unwrap();
    match credentials {
        Credentials::ServiceAccount(key) => {
            assert_eq!(key.client_email, "etl@analytics-test.iam.gserviceaccount.com");
            assert_eq!(key.token_uri(), DEFAULT_TOKEN_URI);
        }
        other => panic!("unexpected credentials: {other:?}"),
    }
}

#[test]
fn test_client_secrets_as_encoded_string() {
    let extra = json!({"client_secrets": key_document(None).to_string()}).to_string();
    let connection = Connection {
        extra: Some(json!(extra)),
        ..Default::default()
    };

    let credentials = Credentials::from_connection(&connection, None).unwrap();
    assert!(matches!(credentials, Credentials::ServiceAccount(_)));
}

#[test]
fn test_key_file_used_last() {
    let dir = tempfile::tempdir().unwrap();
    let key_path = dir.path().join("sa.json");
    std::fs::write(&key_path, key_document(Some("http://localhost/token")).to_string()).unwrap();

    let credentials = Credentials::from_connection(&Connection::default(), Some(&key_path)).unwrap();
    match credentials {
        Credentials::ServiceAccount(key) => assert_eq!(key.token_uri(), "http://localhost/token"),
        other => panic!("unexpected credentials: {other:?}"),
    }
}

#[test]
fn test_no_credentials_is_config_error() {
    let err = Credentials::from_connection(&Connection::default(), None).unwrap_err();
    assert!(err.is_configuration());
    assert!(err.to_string().contains("No valid credentials"));
}

#[test]
fn test_missing_key_file_is_config_error() {
    let err = Credentials::from_connection(
        &Connection::default(),
        Some(std::path::Path::new("/nonexistent/sa.json")),
    )
    .unwrap_err();
    assert!(err.is_configuration());
}

#[test]
fn test_malformed_key_documents() {
    let mut wrong_type = key_document(None);
    wrong_type["type"] = json!("authorized_user");
    assert!(ServiceAccountKey::from_value(&wrong_type).unwrap_err().is_configuration());

    let mut bad_pem = key_document(None);
    bad_pem["private_key"] = json!("not a key");
    assert!(ServiceAccountKey::from_value(&bad_pem).unwrap_err().is_configuration());

    let missing_email = json!({"type": "service_account", "private_key": "x"});
    assert!(ServiceAccountKey::from_value(&missing_email).unwrap_err().is_configuration());
}

#[test]
fn test_key_debug_hides_private_key() {
    let key = ServiceAccountKey::from_value(&key_document(None)).unwrap();
    let debug = format!("{key:?}");
    assert!(debug.contains("etl@analytics-test"));
    assert!(!debug.contains("PRIVATE KEY"));
}

#[test]
fn test_with_token_uri_overrides_service_account_only() {
    let sa = Credentials::ServiceAccount(ServiceAccountKey::from_value(&key_document(None)).unwrap())
        .with_token_uri(Some("http://127.0.0.1:9/token"));
    match sa {
        Credentials::ServiceAccount(key) => assert_eq!(key.token_uri(), "http://127.0.0.1:9/token"),
        other => panic!("unexpected credentials: {other:?}"),
    }

    let token = Credentials::AccessToken("abc".into()).with_token_uri(Some("http://x/token"));
    assert!(matches!(token, Credentials::AccessToken(t) if t == "abc"));
}

// ============================================================================
// Authenticator
// ============================================================================

#[tokio::test]
async fn test_access_token_applied_as_bearer() {
    let auth = Authenticator::new(Credentials::AccessToken("ya29.abc".into()), &[SCOPE]);
    let req = reqwest::Client::new().get("https://example.com/api");
    let built = auth.apply(req).await.unwrap().build().unwrap();

    assert_eq!(built.headers().get("Authorization").unwrap(), "Bearer ya29.abc");
}

#[test]
fn test_signed_assertion_claims() {
    let key = ServiceAccountKey::from_value(&key_document(Some("https://oauth.test/token"))).unwrap();
    let auth = Authenticator::new(Credentials::ServiceAccount(key.clone()), &[SCOPE, "openid"]);

    let jwt = auth.sign_assertion(&key).unwrap();

    let public = std::fs::read(fixture("test_rsa_public.pem")).unwrap();
    let mut validation = Validation::new(Algorithm::RS256);
    validation.set_audience(&["https://oauth.test/token"]);
    let decoded =
        decode::<AssertionClaims>(&jwt, &DecodingKey::from_rsa_pem(&public).unwrap(), &validation)
            .unwrap();

    assert_eq!(decoded.header.kid.as_deref(), Some("kid-1"));
    assert_eq!(decoded.claims.iss, "etl@analytics-test.iam.gserviceaccount.com");
    assert_eq!(decoded.claims.scope, format!("{SCOPE} openid"));
    assert_eq!(decoded.claims.exp - decoded.claims.iat, 3600);
}

#[tokio::test]
async fn test_service_account_token_exchange_is_cached() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("grant_type=urn%3Aietf%3Aparams%3Aoauth%3Agrant-type%3Ajwt-bearer"))
        .and(body_string_contains("assertion="))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "derived-token",
            "token_type": "Bearer",
            "expires_in": 3600
        })))
        .expect(1)
        .mount(&server)
        .await;

    let auth = Authenticator::new(service_account(&format!("{}/token", server.uri())), &[SCOPE]);

    assert_eq!(auth.token().await.unwrap(), "derived-token");
    assert_eq!(auth.token().await.unwrap(), "derived-token");
}

#[tokio::test]
async fn test_clear_cache_forces_new_exchange() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "derived-token",
            "expires_in": 3600
        })))
        .expect(2)
        .mount(&server)
        .await;

    let auth = Authenticator::new(service_account(&format!("{}/token", server.uri())), &[SCOPE]);
    auth.token().await.unwrap();
    auth.clear_cache().await;
    auth.token().await.unwrap();
}

#[tokio::test]
async fn test_rejected_exchange_is_auth_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"error": "invalid_grant"})))
        .mount(&server)
        .await;

    let auth = Authenticator::new(service_account(&format!("{}/token", server.uri())), &[SCOPE]);
    let err = auth.token().await.unwrap_err();

    assert!(matches!(err, crate::Error::Authentication { .. }));
    assert!(err.to_string().contains("invalid_grant"));
}

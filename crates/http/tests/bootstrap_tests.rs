//! Startup validation of persisted sessions

use serde_json::json;
use sessionguard_core::{FileSessionStore, SessionStore, tests::sample_session};
use sessionguard_http::{BootstrapOutcome, ClientError, SessionClient, TeardownReason};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn file_store(dir: &TempDir) -> Arc<FileSessionStore> {
    Arc::new(
        FileSessionStore::open(dir.path().join("session.json"))
            .await
            .unwrap(),
    )
}

fn client(server: &MockServer, store: Arc<FileSessionStore>) -> SessionClient {
    SessionClient::builder()
        .base_url(server.uri())
        .timeout(Duration::from_secs(5))
        .store(store)
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_bootstrap_without_session() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/auth/verify"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = client(&server, file_store(&dir).await);
    assert_eq!(
        client.bootstrap().await.unwrap(),
        BootstrapOutcome::Unauthenticated
    );
}

#[tokio::test]
async fn test_bootstrap_restores_persisted_session() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    file_store(&dir).await.save(sample_session(1)).await.unwrap();

    Mock::given(method("GET"))
        .and(path("/auth/verify"))
        .and(header("authorization", "Bearer access-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "valid": true,
            "user": { "id": "user-1", "name": "Test User", "email": "test@example.com" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let store = file_store(&dir).await;
    let client = client(&server, store.clone());

    let outcome = client.bootstrap().await.unwrap();
    let user = outcome.user().unwrap();
    assert_eq!(user.email.as_deref(), Some("test@example.com"));

    // The refreshed user record is persisted
    let reopened = file_store(&dir).await;
    let session = reopened.load().await.unwrap().unwrap();
    assert_eq!(session.user.email.as_deref(), Some("test@example.com"));
}

#[tokio::test]
async fn test_bootstrap_refreshes_expired_token() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    file_store(&dir).await.save(sample_session(1)).await.unwrap();

    Mock::given(method("GET"))
        .and(path("/auth/verify"))
        .and(header("authorization", "Bearer access-1"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({ "accessToken": "access-2", "refreshToken": "refresh-2" })),
        )
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/auth/verify"))
        .and(header("authorization", "Bearer access-2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "valid": true })))
        .expect(1)
        .mount(&server)
        .await;

    let store = file_store(&dir).await;
    let client = client(&server, store);

    let outcome = client.bootstrap().await.unwrap();
    assert_eq!(outcome.user().map(|user| user.id.0.as_str()), Some("user-1"));

    let session = file_store(&dir).await.load().await.unwrap().unwrap();
    assert_eq!(session.refresh_token.as_str(), "refresh-2");
}

#[tokio::test]
async fn test_bootstrap_ends_session_when_refresh_rejected() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    file_store(&dir).await.save(sample_session(1)).await.unwrap();

    Mock::given(method("GET"))
        .and(path("/auth/verify"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "valid": false })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/refresh"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/auth/logout"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let client = client(&server, file_store(&dir).await);

    assert_eq!(
        client.bootstrap().await.unwrap(),
        BootstrapOutcome::Ended(TeardownReason::RefreshRejected)
    );
    assert!(!dir.path().join("session.json").exists());
}

#[tokio::test]
async fn test_bootstrap_network_failure_keeps_session() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    file_store(&dir).await.save(sample_session(1)).await.unwrap();

    Mock::given(method("GET"))
        .and(path("/auth/verify"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server, file_store(&dir).await);

    let error = client.bootstrap().await.unwrap_err();
    assert!(matches!(error, ClientError::ServerError { status: 502, .. }));

    let session = file_store(&dir).await.load().await.unwrap();
    assert_eq!(session, Some(sample_session(1)));
}

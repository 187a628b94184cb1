mod auth_support;

use std::sync::Arc;
use std::time::Duration;

use jobmatch_client::auth::{CredentialBundle, FileStorage, TokenStore};
use jobmatch_client::client::ApiClient;
use jobmatch_client::config::ClientConfig;
use serde_json::Value;
use tempfile::TempDir;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use auth_support::{auth_body, SKEW};

fn file_client(server: &MockServer, dir: &TempDir) -> ApiClient {
    let config = ClientConfig::builder()
        .base_url(server.uri())
        .token_path(dir.path().join("credentials.toml"))
        .timeout(Duration::from_secs(5))
        .build();
    ApiClient::new(config).expect("client")
}

#[tokio::test]
async fn login_persists_across_client_instances() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(auth_body("A1", "R1")))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/me/profile"))
        .and(header("authorization", "Bearer A1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "success": true, "data": {} })))
        .expect(1)
        .mount(&server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    file_client(&server, &dir)
        .login(&jobmatch_client::auth::LoginRequest::new("ada@example.com", "pw"))
        .await
        .expect("login");

    let reopened = file_client(&server, &dir);
    assert!(reopened.is_authenticated());
    let _: Value = reopened.get("/me/profile").await.expect("uses persisted token");

    reopened.logout().await;
    assert!(!dir.path().join("credentials.toml").exists());
}

#[test]
fn corrupt_file_is_treated_as_logged_out() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("credentials.toml");
    std::fs::write(&file, "version = 1\n[bundle]\naccess_token = \"A1\"\n").unwrap();

    let store = TokenStore::new(Arc::new(FileStorage::new(&file)), SKEW);
    assert!(store.get().is_none());
    assert!(store.is_expired());
    assert!(store.is_near_expiry());
    assert_eq!(store.time_until_expiry(), Duration::ZERO);
}

#[test]
fn set_replaces_previous_bundle_wholesale() {
    let dir = tempfile::tempdir().unwrap();
    let store = TokenStore::new(
        Arc::new(FileStorage::new(dir.path().join("nested/credentials.toml"))),
        SKEW,
    );

    assert!(store.set(&CredentialBundle::new("A1", "R1", 3600).unwrap()));
    assert!(store.set(&CredentialBundle::new("A2", "R2", 600).unwrap()));

    let bundle = store.get().unwrap();
    assert_eq!(bundle.access_token(), "A2");
    assert_eq!(bundle.refresh_token(), "R2");
    assert_eq!(bundle.expires_in_secs(), 600);

    store.clear();
    store.clear();
    assert!(store.get().is_none());
}

#[tokio::test]
async fn concurrent_readers_never_see_partial_bundle() {
    let dir = tempfile::tempdir().unwrap();
    let store = TokenStore::new(Arc::new(FileStorage::new(dir.path().join("c.toml"))), SKEW);
    store.set(&CredentialBundle::new("A0", "R0", 3600).unwrap());

    let writer = {
        let store = store.clone();
        tokio::task::spawn_blocking(move || {
            for i in 1..50 {
                let bundle = CredentialBundle::new(format!("A{i}"), format!("R{i}"), 3600).unwrap();
                store.set(&bundle);
            }
        })
    };
    let reader = {
        let store = store.clone();
        tokio::task::spawn_blocking(move || {
            for _ in 0..200 {
                if let Some(bundle) = store.get() {
                    let suffix = &bundle.access_token()[1..];
                    assert_eq!(&bundle.refresh_token()[1..], suffix);
                }
            }
        })
    };

    writer.await.unwrap();
    reader.await.unwrap();
}

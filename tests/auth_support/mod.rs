#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use jobmatch_client::auth::{AuthError, CredentialBundle, CredentialStorage, SessionExpired, TokenStore};
use jobmatch_client::client::{ApiClient, ReqwestTransport};
use jobmatch_client::config::ClientConfig;
use serde_json::{json, Value};
use wiremock::MockServer;

/// Storage that records how often it was written and cleared.
#[derive(Default)]
pub struct RecordingStorage {
    bundle: Mutex<Option<CredentialBundle>>,
    saves: AtomicUsize,
    clears: AtomicUsize,
}

impl RecordingStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, bundle: CredentialBundle) {
        *self.bundle.lock().expect("storage lock poisoned") = Some(bundle);
    }

    pub fn current(&self) -> Option<CredentialBundle> {
        self.bundle.lock().expect("storage lock poisoned").clone()
    }

    pub fn saves(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    pub fn clears(&self) -> usize {
        self.clears.load(Ordering::SeqCst)
    }
}

impl CredentialStorage for RecordingStorage {
    fn load(&self) -> Result<Option<CredentialBundle>, AuthError> {
        Ok(self.current())
    }

    fn save(&self, bundle: &CredentialBundle) -> Result<(), AuthError> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        *self.bundle.lock().expect("storage lock poisoned") = Some(bundle.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), AuthError> {
        self.clears.fetch_add(1, Ordering::SeqCst);
        *self.bundle.lock().expect("storage lock poisoned") = None;
        Ok(())
    }
}

pub const SKEW: Duration = Duration::from_secs(60);

/// Bundle valid for an hour.
pub fn fresh(access: &str, refresh: &str) -> CredentialBundle {
    CredentialBundle::new(access, refresh, 3600).expect("valid bundle")
}

/// Bundle that expired a minute ago.
pub fn expired(access: &str, refresh: &str) -> CredentialBundle {
    CredentialBundle::issued_at(access, refresh, 60, Utc::now() - chrono::Duration::seconds(120))
        .expect("valid bundle")
}

/// Bundle still valid but inside the refresh skew.
pub fn near_expiry(access: &str, refresh: &str) -> CredentialBundle {
    CredentialBundle::issued_at(access, refresh, 3600, Utc::now() - chrono::Duration::seconds(3570))
        .expect("valid bundle")
}

pub fn auth_body(access: &str, refresh: &str) -> Value {
    json!({
        "success": true,
        "message": "ok",
        "data": {
            "token": access,
            "refreshToken": refresh,
            "tokenType": "Bearer",
            "expiresIn": 3600
        }
    })
}

pub struct Harness {
    pub client: ApiClient,
    pub storage: Arc<RecordingStorage>,
    pub expired_events: Arc<Mutex<Vec<SessionExpired>>>,
}

impl Harness {
    pub fn store(&self) -> &TokenStore {
        self.client.store()
    }

    pub fn expired_count(&self) -> usize {
        self.expired_events.lock().expect("events lock poisoned").len()
    }

    pub fn access_token(&self) -> Option<String> {
        self.storage.current().map(|b| b.access_token().to_string())
    }
}

/// Client against `server`, optionally seeded with credentials.
pub fn harness(server: &MockServer, seed: Option<CredentialBundle>) -> Harness {
    let storage = Arc::new(RecordingStorage::new());
    if let Some(bundle) = seed {
        storage.seed(bundle);
    }
    let config = ClientConfig::builder()
        .base_url(server.uri())
        .refresh_skew(SKEW)
        .timeout(Duration::from_secs(5))
        .build();
    let transport = Arc::new(ReqwestTransport::new(config.timeout).expect("transport"));
    let store = TokenStore::new(storage.clone(), SKEW);
    let client = ApiClient::with_parts(config, transport, store);

    let expired_events = Arc::new(Mutex::new(Vec::new()));
    let sink = expired_events.clone();
    client.on_session_expired(move |event| {
        sink.lock().expect("events lock poisoned").push(event.clone());
    });

    Harness {
        client,
        storage,
        expired_events,
    }
}

/// Poll `condition` until it holds or two seconds pass.
pub async fn eventually(mut condition: impl FnMut() -> bool) -> bool {
    for _ in 0..200 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}

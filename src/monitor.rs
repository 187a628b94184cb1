//! Background token monitoring and status snapshots.

use std::time::Duration;

use chrono::Utc;
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::auth::{format_remaining, TokenStore};
use crate::client::ApiClient;

/// Default interval between monitor checks.
pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_secs(60);

/// Floor applied to the interval passed to [`TokenMonitor::spawn`].
pub const MIN_CHECK_INTERVAL: Duration = Duration::from_millis(1);

/// Point-in-time view of the stored credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenStatus {
    pub has_token: bool,
    pub expires_in_secs: u64,
    pub expired: bool,
    pub near_expiry: bool,
    pub remaining: String,
}

impl TokenStatus {
    pub fn from_store(store: &TokenStore) -> Self {
        let Some(bundle) = store.get() else {
            return Self {
                has_token: false,
                expires_in_secs: 0,
                expired: true,
                near_expiry: true,
                remaining: "not logged in".to_string(),
            };
        };
        let now = Utc::now();
        let remaining = bundle.time_until_expiry_at(now);
        Self {
            has_token: true,
            expires_in_secs: remaining.as_secs(),
            expired: bundle.is_expired_at(now),
            near_expiry: bundle.is_near_expiry_at(now, store.skew()),
            remaining: format_remaining(remaining),
        }
    }
}

/// What a single monitor tick decided to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorAction {
    /// No credentials stored.
    Idle,
    /// Token still comfortably valid.
    Healthy,
    Refreshed,
    /// Refresh attempted and failed; the session-expired event has fired.
    RefreshFailed,
}

/// Periodically refreshes credentials that are close to expiry.
pub struct TokenMonitor;

impl TokenMonitor {
    /// Run one check against the client's store.
    pub async fn check(client: &ApiClient) -> MonitorAction {
        let status = TokenStatus::from_store(client.store());
        if !status.has_token {
            return MonitorAction::Idle;
        }
        if !status.expired && !status.near_expiry {
            return MonitorAction::Healthy;
        }
        tracing::debug!(
            expired = status.expired,
            expires_in_secs = status.expires_in_secs,
            "monitor refreshing token"
        );
        match client.refresh().await {
            Ok(_) => MonitorAction::Refreshed,
            Err(err) => {
                tracing::warn!(error = %err, "monitor refresh failed");
                MonitorAction::RefreshFailed
            }
        }
    }

    /// Spawn the monitor loop. It stops when `cancel` fires.
    ///
    /// Intervals shorter than [`MIN_CHECK_INTERVAL`] are raised to it.
    pub fn spawn(client: ApiClient, interval: Duration, cancel: CancellationToken) -> JoinHandle<()> {
        let interval = interval.max(MIN_CHECK_INTERVAL);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        tracing::debug!("token monitor stopped");
                        break;
                    }
                    _ = ticker.tick() => {
                        Self::check(&client).await;
                    }
                }
            }
        })
    }
}

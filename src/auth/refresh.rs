//! Single-flight guard for token refresh.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use futures::future::{BoxFuture, FutureExt, Shared};

use super::bundle::CredentialBundle;

/// Why a refresh did not produce a new bundle. Shared by every waiter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshFailure {
    pub reason: String,
}

impl RefreshFailure {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl std::fmt::Display for RefreshFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.reason)
    }
}

pub type RefreshOutcome = Result<CredentialBundle, RefreshFailure>;

type InFlight = Shared<BoxFuture<'static, RefreshOutcome>>;
type Slot = Arc<Mutex<Option<(u64, InFlight)>>>;

/// Coalesces concurrent refresh triggers onto one in-flight operation.
///
/// The refresh body runs on its own tokio task, so it finishes (and writes
/// or clears the store) even if every caller awaiting it is cancelled. The
/// slot is released when that task ends, whatever the outcome.
#[derive(Default)]
pub struct RefreshCoordinator {
    slot: Slot,
    next_id: AtomicU64,
}

impl RefreshCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Join the in-flight refresh, or start one with `start` if none is running.
    ///
    /// `start` is only invoked when this call becomes the leader.
    pub async fn run<F, Fut>(&self, start: F) -> RefreshOutcome
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = RefreshOutcome> + Send + 'static,
    {
        let in_flight = {
            let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
            match slot.as_ref() {
                Some((_, existing)) => {
                    tracing::debug!("joining in-flight token refresh");
                    existing.clone()
                }
                None => {
                    let id = self.next_id.fetch_add(1, Ordering::Relaxed);
                    let release = ReleaseOnDrop {
                        slot: Arc::clone(&self.slot),
                        id,
                    };
                    let work = start();
                    let task = tokio::spawn(async move {
                        let _release = release;
                        work.await
                    });
                    let shared = async move {
                        task.await.unwrap_or_else(|err| {
                            Err(RefreshFailure::new(format!("refresh task failed: {err}")))
                        })
                    }
                    .boxed()
                    .shared();
                    *slot = Some((id, shared.clone()));
                    shared
                }
            }
        };
        in_flight.await
    }

    pub fn is_in_flight(&self) -> bool {
        self.slot
            .lock()
            .map(|slot| slot.is_some())
            .unwrap_or(false)
    }
}

impl std::fmt::Debug for RefreshCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshCoordinator")
            .field("in_flight", &self.is_in_flight())
            .finish()
    }
}

struct ReleaseOnDrop {
    slot: Slot,
    id: u64,
}

impl Drop for ReleaseOnDrop {
    fn drop(&mut self) {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.as_ref().is_some_and(|(id, _)| *id == self.id) {
            *slot = None;
        }
    }
}

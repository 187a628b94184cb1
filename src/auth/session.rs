//! Session-expired notification.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};

/// Emitted once the client has given up on the current session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionExpired {
    pub reason: String,
    pub expired_at: DateTime<Utc>,
}

/// Handle returned by [`SessionEvents::register`], used to unregister.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Listener = Arc<dyn Fn(&SessionExpired) + Send + Sync>;

/// Observer registry for session expiry.
///
/// The UI layer registers a listener and redirects to its login screen when
/// it fires. Listeners run synchronously on the emitting task and should not
/// block.
///
/// # Example
/// ```
/// use jobmatch_client::auth::SessionEvents;
///
/// let events = SessionEvents::new();
/// let id = events.register(|event| eprintln!("session expired: {}", event.reason));
/// events.emit("refresh failed");
/// events.unregister(id);
/// ```
#[derive(Default)]
pub struct SessionEvents {
    listeners: RwLock<Vec<(ListenerId, Listener)>>,
    next_id: AtomicU64,
}

impl SessionEvents {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&SessionExpired) + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        if let Ok(mut guard) = self.listeners.write() {
            guard.push((id, Arc::new(listener)));
        }
        id
    }

    /// Returns whether a listener was removed.
    pub fn unregister(&self, id: ListenerId) -> bool {
        let Ok(mut guard) = self.listeners.write() else {
            return false;
        };
        let before = guard.len();
        guard.retain(|(existing, _)| *existing != id);
        guard.len() != before
    }

    pub fn emit(&self, reason: impl Into<String>) {
        let event = SessionExpired {
            reason: reason.into(),
            expired_at: Utc::now(),
        };
        tracing::info!(reason = %event.reason, "session expired");
        // Snapshot so listeners may register/unregister without deadlocking.
        let listeners: Vec<Listener> = match self.listeners.read() {
            Ok(guard) => guard.iter().map(|(_, l)| l.clone()).collect(),
            Err(_) => return,
        };
        for listener in listeners {
            listener(&event);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.read().map(|g| g.len()).unwrap_or(0)
    }
}

impl std::fmt::Debug for SessionEvents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionEvents")
            .field("listeners", &self.listener_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn emit_reaches_every_listener() {
        let events = SessionEvents::new();
        let seen = Arc::new(Mutex::new(Vec::new()));
        for tag in ["a", "b"] {
            let seen = seen.clone();
            events.register(move |event| {
                seen.lock().unwrap().push(format!("{tag}:{}", event.reason));
            });
        }
        events.emit("refresh failed");
        assert_eq!(
            *seen.lock().unwrap(),
            vec!["a:refresh failed".to_string(), "b:refresh failed".to_string()]
        );
    }

    #[test]
    fn unregistered_listener_is_not_called() {
        let events = SessionEvents::new();
        let calls = Arc::new(AtomicU64::new(0));
        let counter = calls.clone();
        let id = events.register(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        assert!(events.unregister(id));
        assert!(!events.unregister(id));
        events.emit("gone");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn listener_may_unregister_itself_while_emitting() {
        let events = Arc::new(SessionEvents::new());
        let inner = events.clone();
        let slot = Arc::new(Mutex::new(None));
        let slot_in = slot.clone();
        let id = events.register(move |_| {
            if let Some(id) = *slot_in.lock().unwrap() {
                inner.unregister(id);
            }
        });
        *slot.lock().unwrap() = Some(id);
        events.emit("once");
        assert_eq!(events.listener_count(), 0);
    }
}

//! In-memory registry of interview sessions.
//!
//! Sessions live for the lifetime of the process. Each one sits behind its own mutex so a
//! single caller owns it for a whole operation, including the LLM round trip.
//!
//! A read of a session (`GET /api/v1/interviews/:id`) waits behind an in-flight generation on
//! that session, for at most the client timeout (`LLM_TIMEOUT_SECS`). Other sessions are not
//! affected: the registry lock is only held to look up or insert a handle.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::interview::session::InterviewSession;

pub type SessionHandle = Arc<Mutex<InterviewSession>>;

#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, SessionHandle>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new `Empty` session and returns its id.
    pub async fn create(&self, turn_limit: usize) -> (Uuid, SessionHandle) {
        let session = InterviewSession::new(turn_limit);
        let id = session.id;
        let handle = Arc::new(Mutex::new(session));
        self.sessions.write().await.insert(id, handle.clone());
        (id, handle)
    }

    pub async fn get(&self, id: Uuid) -> Option<SessionHandle> {
        self.sessions.read().await.get(&id).cloned()
    }

    /// Returns `true` if a session was removed.
    pub async fn remove(&self, id: Uuid) -> bool {
        self.sessions.write().await.remove(&id).is_some()
    }

    pub async fn count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interview::session::SessionStatus;

    #[tokio::test]
    async fn test_create_get_remove() {
        let store = SessionStore::new();
        let (id, handle) = store.create(5).await;

        assert_eq!(handle.lock().await.id, id);
        assert_eq!(handle.lock().await.status(), SessionStatus::Empty);
        assert!(store.get(id).await.is_some());
        assert_eq!(store.count().await, 1);

        assert!(store.remove(id).await);
        assert!(!store.remove(id).await);
        assert!(store.get(id).await.is_none());
    }

    #[tokio::test]
    async fn test_sessions_are_independent() {
        let store = SessionStore::new();
        let (a, _) = store.create(5).await;
        let (b, _) = store.create(3).await;
        assert_ne!(a, b);
        assert_eq!(store.get(b).await.unwrap().lock().await.turn_limit(), 3);
    }

    #[tokio::test]
    async fn test_busy_session_does_not_block_others() {
        let store = SessionStore::new();
        let (a, handle_a) = store.create(5).await;
        let (b, _) = store.create(5).await;

        let _in_flight = handle_a.lock().await;

        // Lookups never wait on a session's own lock.
        let same = store.get(a).await.unwrap();
        assert!(same.try_lock().is_err());

        let other = store.get(b).await.unwrap();
        assert!(other.try_lock().is_ok());
        assert_eq!(store.count().await, 2);
    }
}

//! In-memory session store.
//!
//! Maps opaque caller-supplied session identifiers to ordered transcripts.
//! Sessions are created lazily on first use, seeded with the persona system
//! turn, and live until an explicit reset, LRU eviction, or process exit.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, MutexGuard, RwLock};
use tracing::{debug, info};

use parley_core::{ChatError, Turn};

/// One live session. The transcript sits behind its own mutex so concurrent
/// requests for the same session cannot interleave mutations; a caller holds
/// the guard for the duration of its turn.
pub struct SessionHandle {
    id: String,
    transcript: Mutex<Vec<Turn>>,
}

impl SessionHandle {
    fn new(id: String, seed: Turn) -> Self {
        Self {
            id,
            transcript: Mutex::new(vec![seed]),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Exclusive access to the transcript for the duration of one turn.
    pub async fn lock(&self) -> MutexGuard<'_, Vec<Turn>> {
        self.transcript.lock().await
    }

    /// Copy of the transcript as it stands.
    pub async fn snapshot(&self) -> Vec<Turn> {
        self.transcript.lock().await.clone()
    }
}

struct Entry {
    last_used: u64,
    handle: Arc<SessionHandle>,
}

struct Inner {
    sessions: HashMap<String, Entry>,
    clock: u64,
}

/// Process-wide session mapping with an LRU capacity bound.
pub struct SessionStore {
    seed: Turn,
    max_sessions: usize,
    inner: RwLock<Inner>,
}

impl SessionStore {
    /// `seed` is the system turn cloned into every new session.
    pub fn new(max_sessions: usize, seed: Turn) -> Self {
        Self {
            seed,
            max_sessions: max_sessions.max(1),
            inner: RwLock::new(Inner {
                sessions: HashMap::new(),
                clock: 0,
            }),
        }
    }

    /// Fetch the session, creating and seeding it if unseen. Creation beyond
    /// the capacity bound evicts the least-recently-used session first.
    pub async fn get_or_create(&self, session_id: &str) -> Arc<SessionHandle> {
        let mut inner = self.inner.write().await;
        inner.clock += 1;
        let now = inner.clock;

        if let Some(entry) = inner.sessions.get_mut(session_id) {
            entry.last_used = now;
            return entry.handle.clone();
        }

        if inner.sessions.len() >= self.max_sessions {
            if let Some(oldest) = inner
                .sessions
                .iter()
                .min_by_key(|(_, e)| e.last_used)
                .map(|(id, _)| id.clone())
            {
                inner.sessions.remove(&oldest);
                debug!(session_id = %oldest, "Evicted least-recently-used session");
            }
        }

        info!(session_id = %session_id, "Created session");
        let handle = Arc::new(SessionHandle::new(
            session_id.to_string(),
            self.seed.clone(),
        ));
        inner.sessions.insert(
            session_id.to_string(),
            Entry {
                last_used: now,
                handle: handle.clone(),
            },
        );
        handle
    }

    /// Append a turn to an existing session.
    pub async fn append(&self, session_id: &str, turn: Turn) -> Result<(), ChatError> {
        let handle = {
            let mut inner = self.inner.write().await;
            inner.clock += 1;
            let now = inner.clock;
            let entry = inner
                .sessions
                .get_mut(session_id)
                .ok_or_else(|| ChatError::NotFound(session_id.to_string()))?;
            entry.last_used = now;
            entry.handle.clone()
        };
        handle.lock().await.push(turn);
        Ok(())
    }

    /// Remove the session, reporting whether one existed.
    pub async fn reset(&self, session_id: &str) -> bool {
        let removed = self.inner.write().await.sessions.remove(session_id);
        if removed.is_some() {
            info!(session_id = %session_id, "Session reset");
        }
        removed.is_some()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.sessions.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

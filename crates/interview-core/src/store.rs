//! In-memory session store.
//!
//! Sessions are kept behind a per-session lock so mutations on one session
//! serialize while unrelated sessions proceed independently. Entries idle for
//! longer than the configured TTL are invisible to readers and removed by
//! [`SessionStore::evict_expired`].

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::Duration;

use tokio::time::Instant;

use crate::error::StoreError;
use crate::model::Session;

/// Storage for live interview sessions.
pub trait SessionStore: Send + Sync {
    /// Insert a new session. Fails if the id is already taken.
    fn create(&self, session: Session) -> Result<(), StoreError>;

    /// Snapshot of a session.
    fn get(&self, session_id: &str) -> Option<Session>;

    /// Apply `f` to a session under its lock and return the updated snapshot.
    fn mutate(
        &self,
        session_id: &str,
        f: &mut dyn FnMut(&mut Session),
    ) -> Result<Session, StoreError>;

    /// Remove sessions idle past the TTL. Returns how many were removed.
    fn evict_expired(&self) -> usize;

    /// Number of stored sessions, including expired ones not yet swept.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

struct Entry {
    session: Session,
    last_touched: Instant,
}

impl Entry {
    fn is_expired(&self, ttl: Option<Duration>, now: Instant) -> bool {
        ttl.is_some_and(|ttl| now.saturating_duration_since(self.last_touched) > ttl)
    }
}

/// Process-local [`SessionStore`] with optional idle expiry.
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<String, Arc<Mutex<Entry>>>>,
    ttl: Option<Duration>,
}

impl MemorySessionStore {
    /// A store whose sessions never expire.
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl: None,
        }
    }

    /// A store that expires sessions after `ttl` without access.
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl: Some(ttl),
        }
    }

    pub fn ttl(&self) -> Option<Duration> {
        self.ttl
    }

    fn entry(&self, session_id: &str) -> Option<Arc<Mutex<Entry>>> {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(session_id)
            .cloned()
    }

    fn remove_if_expired(&self, session_id: &str) {
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        let now = Instant::now();
        let expired = sessions
            .get(session_id)
            .is_some_and(|entry| lock(entry).is_expired(self.ttl, now));
        if expired {
            sessions.remove(session_id);
            tracing::debug!(session_id, "expired session removed on access");
        }
    }
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

fn lock(entry: &Mutex<Entry>) -> MutexGuard<'_, Entry> {
    entry.lock().unwrap_or_else(PoisonError::into_inner)
}

impl SessionStore for MemorySessionStore {
    fn create(&self, session: Session) -> Result<(), StoreError> {
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        if sessions.contains_key(&session.id) {
            return Err(StoreError::SessionExists(session.id));
        }
        let id = session.id.clone();
        sessions.insert(
            id,
            Arc::new(Mutex::new(Entry {
                session,
                last_touched: Instant::now(),
            })),
        );
        Ok(())
    }

    fn get(&self, session_id: &str) -> Option<Session> {
        let entry = self.entry(session_id)?;
        let now = Instant::now();
        {
            let mut guard = lock(&entry);
            if !guard.is_expired(self.ttl, now) {
                guard.last_touched = now;
                return Some(guard.session.clone());
            }
        }
        self.remove_if_expired(session_id);
        None
    }

    fn mutate(
        &self,
        session_id: &str,
        f: &mut dyn FnMut(&mut Session),
    ) -> Result<Session, StoreError> {
        let entry = self
            .entry(session_id)
            .ok_or_else(|| StoreError::NotFound(session_id.to_string()))?;
        let now = Instant::now();
        {
            let mut guard = lock(&entry);
            if !guard.is_expired(self.ttl, now) {
                f(&mut guard.session);
                guard.last_touched = now;
                return Ok(guard.session.clone());
            }
        }
        self.remove_if_expired(session_id);
        Err(StoreError::NotFound(session_id.to_string()))
    }

    fn evict_expired(&self) -> usize {
        if self.ttl.is_none() {
            return 0;
        }
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        let now = Instant::now();
        let before = sessions.len();
        sessions.retain(|_, entry| !lock(entry).is_expired(self.ttl, now));
        before - sessions.len()
    }

    fn len(&self) -> usize {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

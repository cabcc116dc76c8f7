use crate::error::ChatError;
use crate::models::Session;
use dashmap::{DashMap, DashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

struct StoredSession {
    session: Session,
    touched: Instant,
}

/// Server-side chat state, keyed by the per-browser key kept in the cookie.
///
/// A session runs at most one command at a time: [`SessionRegistry::checkout`]
/// hands out an exclusive [`SessionLease`] and turns a second caller away with
/// [`ChatError::Busy`] instead of queueing it. The stored value only changes
/// through [`SessionLease::commit`], so overlapping commands cannot overwrite
/// each other.
#[derive(Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<DashMap<Uuid, StoredSession>>,
    active: Arc<DashSet<Uuid>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of a session for read-only requests.
    pub fn get(&self, key: &Uuid) -> Session {
        self.sessions
            .get(key)
            .map(|stored| stored.session.clone())
            .unwrap_or_default()
    }

    /// Take exclusive use of a session until the lease is committed or dropped.
    pub fn checkout(&self, key: Uuid) -> Result<SessionLease, ChatError> {
        if !self.active.insert(key) {
            return Err(ChatError::Busy);
        }

        Ok(SessionLease {
            registry: self.clone(),
            key,
            session: self.get(&key),
        })
    }

    pub fn is_active(&self, key: &Uuid) -> bool {
        self.active.contains(key)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Forget sessions untouched for longer than `max_idle`. Returns how many went.
    pub fn purge_idle(&self, max_idle: Duration) -> usize {
        let before = self.sessions.len();
        self.sessions
            .retain(|key, stored| self.active.contains(key) || stored.touched.elapsed() <= max_idle);
        before.saturating_sub(self.sessions.len())
    }
}

/// Exclusive, owned copy of one session. Dropping it without committing
/// discards the changes and releases the session.
pub struct SessionLease {
    registry: SessionRegistry,
    key: Uuid,
    session: Session,
}

impl SessionLease {
    pub fn key(&self) -> Uuid {
        self.key
    }

    /// Hand the session to a controller; it comes back through [`commit`](Self::commit).
    pub fn take_session(&mut self) -> Session {
        std::mem::take(&mut self.session)
    }

    /// Store `session` and release the lease.
    pub fn commit(self, session: Session) {
        self.registry.sessions.insert(
            self.key,
            StoredSession {
                session,
                touched: Instant::now(),
            },
        );
    }
}

impl Drop for SessionLease {
    fn drop(&mut self) {
        self.registry.active.remove(&self.key);
    }
}

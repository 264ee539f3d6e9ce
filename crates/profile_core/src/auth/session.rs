//! In-memory session table keyed by opaque ids.
//!
//! # Invariants
//! - Session ids are random UUIDv4 strings and carry no user data.
//! - An expired session resolves to nothing even before it is pruned.
//! - A TTL too large for the clock never overflows; such sessions do not expire.
//! - Sessions do not survive a process restart.

use log::info;
use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};
use uuid::Uuid;

#[derive(Debug, Clone)]
struct SessionEntry {
    user_id: String,
    /// `None` when `now + ttl` is not representable.
    expires_at: Option<Instant>,
}

impl SessionEntry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |expires_at| now < expires_at)
    }
}

/// Maps session ids to signed-in user ids.
#[derive(Debug)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, SessionEntry>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Opens a session for `user_id` and returns its id.
    pub fn create(&self, user_id: &str) -> String {
        let id = Uuid::new_v4().to_string();
        let entry = SessionEntry {
            user_id: user_id.to_string(),
            expires_at: Instant::now().checked_add(self.ttl),
        };
        let mut sessions = self.sessions.write().unwrap_or_else(|e| e.into_inner());
        sessions.insert(id.clone(), entry);
        id
    }

    /// Returns the user bound to a live session.
    pub fn resolve(&self, session_id: &str) -> Option<String> {
        let sessions = self.sessions.read().unwrap_or_else(|e| e.into_inner());
        sessions
            .get(session_id)
            .filter(|entry| entry.is_live(Instant::now()))
            .map(|entry| entry.user_id.clone())
    }

    /// Ends a session; `false` when it did not exist.
    pub fn destroy(&self, session_id: &str) -> bool {
        let mut sessions = self.sessions.write().unwrap_or_else(|e| e.into_inner());
        sessions.remove(session_id).is_some()
    }

    /// Ends every session of `user_id`; returns how many were removed.
    pub fn destroy_for_user(&self, user_id: &str) -> usize {
        let mut sessions = self.sessions.write().unwrap_or_else(|e| e.into_inner());
        let before = sessions.len();
        sessions.retain(|_, entry| entry.user_id != user_id);
        before - sessions.len()
    }

    /// Drops expired sessions and returns how many were removed.
    pub fn prune_expired(&self) -> usize {
        let now = Instant::now();
        let removed = {
            let mut sessions = self.sessions.write().unwrap_or_else(|e| e.into_inner());
            let before = sessions.len();
            sessions.retain(|_, entry| entry.is_live(now));
            before - sessions.len()
        };
        if removed > 0 {
            info!("event=session_prune module=auth status=ok removed={removed}");
        }
        removed
    }

    pub fn len(&self) -> usize {
        let sessions = self.sessions.read().unwrap_or_else(|e| e.into_inner());
        sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

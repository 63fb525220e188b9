use std::sync::Arc;
use std::time::Duration;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use portalseal_core::handshake::HandshakeSession;
use portalseal_core::traits::clock::Clock;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum StoreError {
    #[error("handshake id already registered: {0}")]
    DuplicateId(String),
}

/// Thread-safe in-memory handshake store backed by DashMap.
///
/// Entries are written once and never updated. An entry older than the TTL
/// is indistinguishable from a missing one.
pub struct HandshakeStore {
    sessions: DashMap<String, HandshakeSession>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl HandshakeStore {
    /// Create a new empty store.
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            sessions: DashMap::new(),
            ttl,
            clock,
        }
    }

    /// Register a freshly negotiated session under its own id.
    pub fn put(&self, session: HandshakeSession) -> Result<(), StoreError> {
        match self.sessions.entry(session.handshake_id().to_string()) {
            Entry::Occupied(entry) => Err(StoreError::DuplicateId(entry.key().clone())),
            Entry::Vacant(entry) => {
                entry.insert(session);
                Ok(())
            }
        }
    }

    /// Look up a live session. Expired entries are evicted and reported as absent.
    pub fn get(&self, handshake_id: &str) -> Option<HandshakeSession> {
        let now = match self.clock.now_millis() {
            Ok(now) => now,
            Err(e) => {
                tracing::warn!(error = %e, "clock unavailable, treating handshake as expired");
                return None;
            }
        };

        let session = self.sessions.get(handshake_id).map(|entry| entry.clone())?;
        if session.is_expired(now, self.ttl) {
            self.sessions
                .remove_if(handshake_id, |_, s| s.is_expired(now, self.ttl));
            tracing::debug!(handshake_id, "evicted expired handshake");
            return None;
        }
        Some(session)
    }

    /// Drop every expired entry. Returns how many were removed.
    pub fn cleanup_expired(&self) -> usize {
        let Ok(now) = self.clock.now_millis() else {
            return 0;
        };
        let before = self.sessions.len();
        self.sessions.retain(|_, s| !s.is_expired(now, self.ttl));
        before.saturating_sub(self.sessions.len())
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }
}

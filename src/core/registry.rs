//! Connection registry: the authoritative map from connection identity to
//! session state.
//!
//! The registry is the single source of truth for room membership. Rooms are
//! not stored anywhere; a room is the set of sessions whose `room` field
//! names it, derived on every query. Each operation is atomic in isolation,
//! but multi-step flows (leave old room, join new one) are not atomic as a
//! whole and may interleave with concurrent snapshots.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;

use crate::core::connection::Deliver;

/// Live binding between a connection identity and its chosen username/room.
///
/// Owned exclusively by the registry; mutated only through registry
/// operations; destroyed on disconnect. Usernames are free-form and NOT
/// required to be unique — duplicates are permitted and never deduplicated.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub connection_id: String,
    pub username: String,
    pub room: String,
    pub connected_at: DateTime<Utc>,
}

struct Entry {
    session: Session,
    outbox: Arc<dyn Deliver>,
}

struct RegistryInner {
    entries: HashMap<String, Entry>,
    // Insertion order of connection ids, so iteration and first-match
    // lookups are deterministic.
    order: Vec<String>,
}

/// In-memory session registry, safe under arbitrary concurrent invocation.
///
/// Explicitly owned and injectable: construct one, wrap it in an `Arc`, and
/// hand it to the hub and handlers. No process-wide state.
pub struct ConnectionRegistry {
    inner: RwLock<RegistryInner>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(RegistryInner {
                entries: HashMap::new(),
                order: Vec::new(),
            }),
        }
    }

    /// Register a new session. The session is visible to room queries as
    /// soon as this returns. No uniqueness check on username.
    pub async fn register(
        &self,
        connection_id: String,
        username: String,
        room: String,
        outbox: Arc<dyn Deliver>,
    ) -> Session {
        let session = Session {
            connection_id: connection_id.clone(),
            username,
            room,
            connected_at: Utc::now(),
        };

        let mut inner = self.inner.write().await;
        let replaced = inner.entries.insert(
            connection_id.clone(),
            Entry {
                session: session.clone(),
                outbox,
            },
        );
        // A repeated register for a live connection replaces its session;
        // the id must not appear in the iteration order twice.
        if replaced.is_none() {
            inner.order.push(connection_id);
        }

        session
    }

    /// Look up a session by connection identity
    pub async fn get(&self, connection_id: &str) -> Option<Session> {
        let inner = self.inner.read().await;
        inner.entries.get(connection_id).map(|e| e.session.clone())
    }

    /// Find a session by username. When duplicates exist, returns the
    /// earliest-registered match; the choice is otherwise arbitrary and
    /// callers must not rely on any particular one.
    pub async fn find_by_username(&self, username: &str) -> Option<Session> {
        let inner = self.inner.read().await;
        inner
            .order
            .iter()
            .filter_map(|id| inner.entries.get(id))
            .find(|e| e.session.username == username)
            .map(|e| e.session.clone())
    }

    /// Atomically update a session's room. Unknown connection ids are a no-op.
    pub async fn set_room(&self, connection_id: &str, new_room: String) {
        let mut inner = self.inner.write().await;
        if let Some(entry) = inner.entries.get_mut(connection_id) {
            entry.session.room = new_room;
        }
    }

    /// Delete a session, returning its prior state so the disconnect path
    /// knows which room to notify.
    pub async fn remove(&self, connection_id: &str) -> Option<Session> {
        let mut inner = self.inner.write().await;
        let removed = inner.entries.remove(connection_id).map(|e| e.session);
        if removed.is_some() {
            inner.order.retain(|id| id != connection_id);
        }
        removed
    }

    /// Snapshot of usernames currently assigned to a room, in registry
    /// iteration order.
    pub async fn members_of(&self, room: &str) -> Vec<String> {
        let inner = self.inner.read().await;
        inner
            .order
            .iter()
            .filter_map(|id| inner.entries.get(id))
            .filter(|e| e.session.room == room)
            .map(|e| e.session.username.clone())
            .collect()
    }

    /// Delivery handle for a single connection
    pub async fn outbox(&self, connection_id: &str) -> Option<Arc<dyn Deliver>> {
        let inner = self.inner.read().await;
        inner.entries.get(connection_id).map(|e| e.outbox.clone())
    }

    /// Delivery handles for every member of a room. The snapshot reflects
    /// registry state at the moment it is computed; delivery happens outside
    /// the lock.
    pub async fn room_outboxes(&self, room: &str) -> Vec<Arc<dyn Deliver>> {
        let inner = self.inner.read().await;
        inner
            .order
            .iter()
            .filter_map(|id| inner.entries.get(id))
            .filter(|e| e.session.room == room)
            .map(|e| e.outbox.clone())
            .collect()
    }

    /// Current number of live sessions
    pub async fn connection_count(&self) -> usize {
        let inner = self.inner.read().await;
        inner.entries.len()
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// Shared reference to the registry
pub type SharedRegistry = Arc<ConnectionRegistry>;

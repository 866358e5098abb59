//! Message-routing engine: room broadcast and private delivery.
//!
//! The hub derives room membership from the registry on every fan-out rather
//! than caching a room index, so a broadcast always sees the current source
//! of truth. Delivery is fire-and-forget per recipient.

use std::sync::Arc;

use chrono::Utc;
use log::{debug, info};

use crate::core::connection::Deliver;
use crate::core::events::ServerEvent;
use crate::core::registry::SharedRegistry;

pub struct ChatHub {
    registry: SharedRegistry,
    default_room: String,
}

impl ChatHub {
    pub fn new(registry: SharedRegistry, default_room: String) -> Self {
        Self {
            registry,
            default_room,
        }
    }

    pub fn registry(&self) -> &SharedRegistry {
        &self.registry
    }

    /// Register a session and announce it to its room.
    ///
    /// Registration happens strictly before any notification. Every current
    /// member of the room (the new member included) receives `UserJoined`;
    /// the caller alone receives the member-list snapshot.
    pub async fn join(
        &self,
        connection_id: String,
        username: String,
        room: Option<String>,
        outbox: Arc<dyn Deliver>,
    ) {
        let room = room.unwrap_or_else(|| self.default_room.clone());

        let session = self
            .registry
            .register(connection_id, username.clone(), room.clone(), outbox.clone())
            .await;

        let joined = ServerEvent::UserJoined {
            username: username.clone(),
            room: room.clone(),
        };
        let recipients = self.registry.room_outboxes(&room).await;
        self.fan_out(&recipients, &joined);

        let snapshot = ServerEvent::UsersInRoom {
            usernames: self.registry.members_of(&room).await,
        };
        outbox.deliver(&snapshot);

        info!(
            "User '{}' joined room '{}' (connection {})",
            username, room, session.connection_id
        );
    }

    /// Broadcast text to every member of the sender's current room, sender
    /// included. Unknown senders are silently dropped.
    pub async fn broadcast(&self, connection_id: &str, text: String) {
        let session = match self.registry.get(connection_id).await {
            Some(session) => session,
            None => {
                debug!("Dropping message from unregistered connection {}", connection_id);
                return;
            }
        };

        let event = ServerEvent::ReceiveMessage {
            username: session.username.clone(),
            text,
            timestamp: Utc::now(),
            room: session.room.clone(),
        };

        let recipients = self.registry.room_outboxes(&session.room).await;
        let delivered = self.fan_out(&recipients, &event);
        debug!(
            "{} in {}: message delivered to {} recipients",
            session.username, session.room, delivered
        );
    }

    /// Move a registered session between rooms: leave-then-join.
    ///
    /// The old room is notified of the departure and receives a member list
    /// excluding the mover; the new room is notified of the arrival and
    /// receives a list including it. Departure is always emitted before
    /// arrival. Unknown senders are a no-op.
    pub async fn change_room(&self, connection_id: &str, new_room: String) {
        let session = match self.registry.get(connection_id).await {
            Some(session) => session,
            None => return,
        };
        let old_room = session.room.clone();

        // Single atomic field update, so the session is never observable in
        // neither room.
        self.registry
            .set_room(connection_id, new_room.clone())
            .await;

        let left = ServerEvent::UserLeft {
            username: session.username.clone(),
            room: old_room.clone(),
        };
        let old_recipients = self.registry.room_outboxes(&old_room).await;
        self.fan_out(&old_recipients, &left);

        let old_snapshot = ServerEvent::UsersInRoom {
            usernames: self.registry.members_of(&old_room).await,
        };
        self.fan_out(&old_recipients, &old_snapshot);

        let joined = ServerEvent::UserJoined {
            username: session.username.clone(),
            room: new_room.clone(),
        };
        let new_recipients = self.registry.room_outboxes(&new_room).await;
        self.fan_out(&new_recipients, &joined);

        let new_snapshot = ServerEvent::UsersInRoom {
            usernames: self.registry.members_of(&new_room).await,
        };
        self.fan_out(&new_recipients, &new_snapshot);

        info!(
            "User '{}' moved from room '{}' to room '{}'",
            session.username, old_room, new_room
        );
    }

    /// Deliver text to a single named user.
    ///
    /// Exactly one of two outcomes per call from a resolvable sender: an
    /// `Error` event back to the sender when the target username matches no
    /// live session, or one delivery to the target plus one confirmation to
    /// the sender. Unknown senders are a no-op.
    pub async fn send_private(&self, connection_id: &str, target_username: &str, text: String) {
        let sender = match self.registry.get(connection_id).await {
            Some(session) => session,
            None => return,
        };
        let sender_outbox = match self.registry.outbox(connection_id).await {
            Some(outbox) => outbox,
            None => return,
        };

        let target_outbox = match self.registry.find_by_username(target_username).await {
            Some(target) => self.registry.outbox(&target.connection_id).await,
            None => None,
        };

        match target_outbox {
            Some(target_outbox) => {
                target_outbox.deliver(&ServerEvent::ReceivePrivateMessage {
                    from: sender.username.clone(),
                    text: text.clone(),
                    timestamp: Utc::now(),
                    is_private: true,
                });
                sender_outbox.deliver(&ServerEvent::PrivateMessageSent {
                    target_username: target_username.to_string(),
                    text,
                });
                debug!(
                    "Private message from {} to {}",
                    sender.username, target_username
                );
            }
            None => {
                sender_outbox.deliver(&ServerEvent::Error {
                    message: format!("User '{}' not found", target_username),
                });
            }
        }
    }

    /// Remove a session on connection drop and notify its former room.
    ///
    /// The registry entry is cleaned up unconditionally; notification
    /// failures never leave the entry behind.
    pub async fn disconnect(&self, connection_id: &str) {
        let removed = match self.registry.remove(connection_id).await {
            Some(session) => session,
            None => return,
        };

        let left = ServerEvent::UserLeft {
            username: removed.username.clone(),
            room: removed.room.clone(),
        };
        let recipients = self.registry.room_outboxes(&removed.room).await;
        self.fan_out(&recipients, &left);

        let snapshot = ServerEvent::UsersInRoom {
            usernames: self.registry.members_of(&removed.room).await,
        };
        self.fan_out(&recipients, &snapshot);

        info!(
            "User '{}' disconnected from room '{}'",
            removed.username, removed.room
        );
    }

    // Deliver one event to each recipient independently; a failed send never
    // blocks the rest.
    fn fan_out(&self, recipients: &[Arc<dyn Deliver>], event: &ServerEvent) -> usize {
        recipients
            .iter()
            .filter(|outbox| outbox.deliver(event))
            .count()
    }
}

// Shared reference to the hub
pub type SharedHub = Arc<ChatHub>;

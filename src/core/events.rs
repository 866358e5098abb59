//! Wire-level event types for the relay protocol

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Client-to-server actions
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientEvent {
    /// Register a username and enter a room (the default room when omitted)
    #[serde(rename = "join_chat")]
    JoinChat {
        username: String,
        room: Option<String>,
    },

    /// Broadcast text to the sender's current room
    #[serde(rename = "send_message")]
    SendMessage { text: String },

    /// Move the sender to another room
    #[serde(rename = "join_room")]
    JoinRoom { room: String },

    /// Send text to a single named user
    #[serde(rename = "send_private_message")]
    SendPrivateMessage {
        target_username: String,
        text: String,
    },
}

/// Server-to-client events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerEvent {
    /// Room message fan-out
    #[serde(rename = "receive_message")]
    ReceiveMessage {
        username: String,
        text: String,
        timestamp: DateTime<Utc>,
        room: String,
    },

    /// A user entered a room
    #[serde(rename = "user_joined")]
    UserJoined { username: String, room: String },

    /// A user left a room
    #[serde(rename = "user_left")]
    UserLeft { username: String, room: String },

    /// Snapshot of usernames currently in a room
    #[serde(rename = "users_in_room")]
    UsersInRoom { usernames: Vec<String> },

    /// Point-to-point message delivery
    #[serde(rename = "receive_private_message")]
    ReceivePrivateMessage {
        from: String,
        text: String,
        timestamp: DateTime<Utc>,
        is_private: bool,
    },

    /// Confirmation to the sender of a private message
    #[serde(rename = "private_message_sent")]
    PrivateMessageSent {
        target_username: String,
        text: String,
    },

    /// Recoverable per-request error reported to the caller
    #[serde(rename = "error")]
    Error { message: String },
}

//! Server configuration module
//! Handles dynamic configuration parameters for the relay server

use crate::constants::{
    DEFAULT_HOST, DEFAULT_MAX_MESSAGE_LENGTH, DEFAULT_PORT, DEFAULT_RATE_LIMIT_PER_MINUTE,
    DEFAULT_ROOM,
};
use std::env;

/// Server configuration parameters
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Room assigned to sessions that join without naming one
    pub default_room: String,
    /// Rate limit: requests per minute per client address
    pub rate_limit_per_minute: u32,
    /// Maximum accepted message text length, in bytes
    pub max_message_length: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            default_room: DEFAULT_ROOM.to_string(),
            rate_limit_per_minute: DEFAULT_RATE_LIMIT_PER_MINUTE,
            max_message_length: DEFAULT_MAX_MESSAGE_LENGTH,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables if available
    pub fn from_env() -> Self {
        let host = env::var("CHAT_RELAY_HOST").unwrap_or(DEFAULT_HOST.to_string());
        let port = env::var("CHAT_RELAY_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        let default_room =
            env::var("CHAT_RELAY_DEFAULT_ROOM").unwrap_or(DEFAULT_ROOM.to_string());

        let rate_limit_per_minute = env::var("CHAT_RELAY_RATE_LIMIT_PER_MIN")
            .ok()
            .and_then(|r| r.parse().ok())
            .unwrap_or(DEFAULT_RATE_LIMIT_PER_MINUTE);

        let max_message_length = env::var("CHAT_RELAY_MAX_MESSAGE_LEN")
            .ok()
            .and_then(|m| m.parse().ok())
            .unwrap_or(DEFAULT_MAX_MESSAGE_LENGTH);

        Self {
            host,
            port,
            default_room,
            rate_limit_per_minute,
            max_message_length,
        }
    }
}

//! Chat Relay - a real-time group-messaging relay over WebSocket
//!
//! Clients open persistent connections, join named rooms, broadcast text to
//! room members, and send direct private messages to a named peer. State is
//! single-process and in-memory; delivery is best-effort fan-out.

pub mod config;
pub mod constants;
pub mod core;
pub mod error;
pub mod handlers;

// Re-export main components
pub use config::*;
pub use constants::*;

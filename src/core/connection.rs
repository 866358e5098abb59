//! Outbound delivery to a single client connection

use log::warn;
use tokio::sync::mpsc;
use warp::ws::Message;

use crate::core::events::ServerEvent;

/// Capability to deliver one event to one destination.
///
/// Delivery is fire-and-forget: the return value reports whether the event
/// was handed to the destination, and a failed recipient never blocks
/// delivery to others. The routers depend on this trait rather than on the
/// transport, so tests can substitute an in-memory recorder.
pub trait Deliver: Send + Sync {
    fn deliver(&self, event: &ServerEvent) -> bool;
}

/// The outbound half of a live WebSocket connection
pub struct Connection {
    pub id: String,
    sender: mpsc::UnboundedSender<Message>,
}

impl Connection {
    pub fn new(id: String, sender: mpsc::UnboundedSender<Message>) -> Self {
        Self { id, sender }
    }
}

impl Deliver for Connection {
    fn deliver(&self, event: &ServerEvent) -> bool {
        let text = match serde_json::to_string(event) {
            Ok(text) => text,
            Err(e) => {
                warn!("Failed to serialize event for client {}: {}", self.id, e);
                return false;
            }
        };

        match self.sender.send(Message::text(text)) {
            Ok(_) => true,
            Err(_) => {
                warn!("Failed to send event to client {}", self.id);
                false
            }
        }
    }
}

//! WebSocket transport handler: per-connection lifecycle and event dispatch

use std::net::IpAddr;
use std::sync::Arc;

use futures_util::sink::SinkExt;
use futures_util::stream::StreamExt;
use log::{debug, error, info, warn};
use tokio::sync::mpsc;
use uuid::Uuid;
use warp::ws::WebSocket;

use crate::core::connection::{Connection, Deliver};
use crate::core::events::{ClientEvent, ServerEvent};
use crate::core::hub::SharedHub;
use crate::core::rate_limiter::SharedRateLimiter;
use crate::error::{ChatRelayError, Result};

/// Drive one client connection: forward outbound events, dispatch inbound
/// actions to the hub, and clean up the session when the socket drops.
///
/// Inbound events for the same connection are processed sequentially; the
/// hub never has to defend against self-concurrency.
pub async fn handle_ws_client(
    ws: WebSocket,
    hub: SharedHub,
    limiter: SharedRateLimiter,
    client_ip: IpAddr,
    max_message_length: usize,
) {
    let (mut ws_tx, mut ws_rx) = ws.split();
    let (tx, mut rx) = mpsc::unbounded_channel();

    // Forward messages from the connection's channel to the socket
    tokio::task::spawn(async move {
        while let Some(message) = rx.recv().await {
            if let Err(e) = ws_tx.send(message).await {
                error!("Failed to send WebSocket message: {}", e);
                break;
            }
        }
    });

    let client_id = Uuid::new_v4().to_string();
    let outbox: Arc<dyn Deliver> = Arc::new(Connection::new(client_id.clone(), tx));

    info!("Client connected: {} ({})", client_id, client_ip);

    while let Some(result) = ws_rx.next().await {
        match result {
            Ok(msg) => {
                if msg.is_close() {
                    break;
                }
                let text = match msg.to_str() {
                    Ok(text) => text,
                    // Binary, ping and pong frames carry no client action
                    Err(_) => continue,
                };

                // Admission control runs before any routing logic; a
                // throttled event is dropped without touching state.
                if !limiter.check(client_ip).await {
                    debug!("Throttled event from {} ({})", client_id, client_ip);
                    continue;
                }

                if let Err(e) =
                    process_event(text, &client_id, &outbox, &hub, max_message_length).await
                {
                    warn!("Dropped event from {}: {}", client_id, e);
                }
            }
            Err(e) => {
                warn!("WebSocket error on connection {}: {}", client_id, e);
                break;
            }
        }
    }

    // The registry entry is removed unconditionally, whatever happened to
    // the socket or to the departure notifications.
    hub.disconnect(&client_id).await;
    info!(
        "Client disconnected: {} ({} connections remain)",
        client_id,
        hub.registry().connection_count().await
    );
}

// Parse one inbound frame and dispatch it to the hub
async fn process_event(
    text: &str,
    client_id: &str,
    outbox: &Arc<dyn Deliver>,
    hub: &SharedHub,
    max_message_length: usize,
) -> Result<()> {
    let event: ClientEvent = serde_json::from_str(text)
        .map_err(|e| ChatRelayError::MessageParseError(e.to_string()))?;

    match event {
        ClientEvent::JoinChat { username, room } => {
            hub.join(client_id.to_string(), username, room, outbox.clone())
                .await;
        }

        ClientEvent::SendMessage { text } => {
            match validate_text(&text, max_message_length) {
                Ok(()) => hub.broadcast(client_id, text).await,
                Err(e) => {
                    outbox.deliver(&ServerEvent::Error {
                        message: e.to_string(),
                    });
                }
            }
        }

        ClientEvent::JoinRoom { room } => {
            hub.change_room(client_id, room).await;
        }

        ClientEvent::SendPrivateMessage {
            target_username,
            text,
        } => match validate_text(&text, max_message_length) {
            Ok(()) => hub.send_private(client_id, &target_username, text).await,
            Err(e) => {
                outbox.deliver(&ServerEvent::Error {
                    message: e.to_string(),
                });
            }
        },
    }

    Ok(())
}

// Reject empty and oversized message text before it reaches the routers
fn validate_text(text: &str, max_length: usize) -> Result<()> {
    if text.trim().is_empty() {
        return Err(ChatRelayError::EmptyMessage);
    }
    if text.len() > max_length {
        return Err(ChatRelayError::MessageTooLarge(max_length));
    }
    Ok(())
}

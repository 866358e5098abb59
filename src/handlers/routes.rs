//! HTTP route composition: rate-limited WebSocket upgrade, status, health

use std::convert::Infallible;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

use log::debug;
use serde_json::json;
use warp::http::StatusCode;
use warp::{Filter, Rejection, Reply};

use crate::config::ServerConfig;
use crate::constants::HUB_PATH;
use crate::core::hub::SharedHub;
use crate::core::rate_limiter::SharedRateLimiter;
use crate::error::ChatRelayError;
use crate::handlers::websocket::handle_ws_client;

/// Build the full route tree for the relay server
pub fn routes(
    hub: SharedHub,
    limiter: SharedRateLimiter,
    config: ServerConfig,
) -> impl Filter<Extract = impl Reply, Error = Infallible> + Clone {
    let ws_route = warp::path(HUB_PATH)
        .and(warp::ws())
        .and(warp::addr::remote())
        .and(with_hub(hub))
        .and(with_limiter(limiter))
        .and(with_config(config.clone()))
        .and_then(upgrade_chat);

    let health_route = warp::path("health").map(|| "OK");

    let status_route = warp::path::end()
        .and(with_config(config))
        .map(|config: ServerConfig| {
            warp::reply::json(&json!({
                "status": "Chat relay is running",
                "hub": format!("/{}", HUB_PATH),
                "default_room": config.default_room,
                "rate_limit_per_minute": config.rate_limit_per_minute,
                "max_message_length": config.max_message_length,
            }))
        });

    ws_route
        .or(health_route)
        .or(status_route)
        .recover(handle_rejection)
}

// Gate the upgrade request through the limiter, then hand the socket to the
// per-connection handler.
async fn upgrade_chat(
    ws: warp::ws::Ws,
    addr: Option<SocketAddr>,
    hub: SharedHub,
    limiter: SharedRateLimiter,
    config: ServerConfig,
) -> Result<impl Reply, Rejection> {
    let client_ip = addr
        .map(|a| a.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED));

    if !limiter.check(client_ip).await {
        debug!("Rejected connection attempt from {}", client_ip);
        return Err(warp::reject::custom(ChatRelayError::RateLimited));
    }

    let max_message_length = config.max_message_length;
    Ok(ws.on_upgrade(move |socket| {
        handle_ws_client(socket, hub, limiter, client_ip, max_message_length)
    }))
}

// Map rejections to plain-text responses; rate limiting surfaces as 429
async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let (message, status) = if let Some(ChatRelayError::RateLimited) = err.find::<ChatRelayError>() {
        (
            "Rate limit exceeded. Please try again later.",
            StatusCode::TOO_MANY_REQUESTS,
        )
    } else if err.is_not_found() {
        ("Not Found", StatusCode::NOT_FOUND)
    } else {
        ("Internal Server Error", StatusCode::INTERNAL_SERVER_ERROR)
    };

    Ok(warp::reply::with_status(message, status))
}

// Helper filters to include shared state in requests
fn with_hub(hub: SharedHub) -> impl Filter<Extract = (SharedHub,), Error = Infallible> + Clone {
    warp::any().map(move || hub.clone())
}

fn with_limiter(
    limiter: SharedRateLimiter,
) -> impl Filter<Extract = (SharedRateLimiter,), Error = Infallible> + Clone {
    warp::any().map(move || limiter.clone())
}

fn with_config(
    config: ServerConfig,
) -> impl Filter<Extract = (ServerConfig,), Error = Infallible> + Clone {
    warp::any().map(move || config.clone())
}

use std::net::SocketAddr;
use std::sync::Arc;

use log::{error, info, warn};

use chat_relay::config::ServerConfig;
use chat_relay::core::hub::ChatHub;
use chat_relay::core::rate_limiter::RequestRateLimiter;
use chat_relay::core::registry::ConnectionRegistry;
use chat_relay::handlers::routes;

#[tokio::main]
async fn main() {
    // Initialize env
    match dotenvy::dotenv() {
        Ok(_) => info!("Environment variables loaded from .env file"),
        Err(e) => warn!("Failed to load .env file: {}", e),
    };

    // Initialize logging
    env_logger::init();

    // Load config from the environment
    let config = ServerConfig::from_env();

    info!(
        "Configuration: host={}, port={}, default_room={}, rate_limit={}/min",
        config.host, config.port, config.default_room, config.rate_limit_per_minute
    );

    // Build the registry, hub and limiter
    let registry = Arc::new(ConnectionRegistry::new());
    let hub = Arc::new(ChatHub::new(registry, config.default_room.clone()));
    let limiter = Arc::new(RequestRateLimiter::new(config.rate_limit_per_minute));
    limiter.clone().start_cleanup_task();

    let routes = routes(hub, limiter, config.clone());

    // Build the server address
    let addr: SocketAddr = match format!("{}:{}", config.host, config.port).parse() {
        Ok(addr) => addr,
        Err(e) => {
            error!("Failed to parse server address: {}", e);
            std::process::exit(1);
        }
    };

    // Start the server
    info!("Starting chat relay on {}", addr);

    warp::serve(routes).run(addr).await;
}

//! Request handlers for the relay's HTTP and WebSocket endpoints

pub mod routes;
pub mod websocket;

// Re-export the main entry points
pub use routes::routes;
pub use websocket::handle_ws_client;

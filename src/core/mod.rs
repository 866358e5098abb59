//! Core functionality for the relay: registry, routing, rate limiting

pub mod connection;
pub mod events;
pub mod hub;
pub mod rate_limiter;
pub mod registry;

// Re-export main components for convenience
pub use connection::{Connection, Deliver};
pub use events::{ClientEvent, ServerEvent};
pub use hub::{ChatHub, SharedHub};
pub use rate_limiter::{RequestRateLimiter, SharedRateLimiter};
pub use registry::{ConnectionRegistry, Session, SharedRegistry};

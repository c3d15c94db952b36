//! WebSocket to raw socket bridge.
//!
//! Accepts WebSocket upgrades on configured paths and relays each session's
//! payload bytes to a TCP, UDP, TLS or Unix socket backend.

// Core subsystems
pub mod bridge;
pub mod config;
pub mod error;
pub mod http;
pub mod net;
pub mod routing;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;
pub mod security;

pub use bridge::Bridge;
pub use config::schema::ProxyConfig;
pub use error::{ProxyError, StreamError};
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use net::Dialer;
pub use routing::{Endpoint, Resolver, Transport};

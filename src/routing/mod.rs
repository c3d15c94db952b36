//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request path
//!     → resolver.rs (static table lookup or dynamic decode)
//!     → Return: Endpoint { address, transport } or ProxyError
//!
//! Table construction (at startup):
//!     [[endpoints]] from config / CLI
//!     → RoutingTable (exact-path map)
//!     → Resolver, frozen and shared via Arc
//! ```
//!
//! # Design Decisions
//! - Exact path match only; no prefixes or patterns for static endpoints
//! - Dynamic endpoints are derived per request and never stored
//! - Transport set is closed (`Transport` enum)

pub mod endpoint;
pub mod resolver;

pub use endpoint::{Endpoint, Transport, UnknownTransport};
pub use resolver::{DynamicRoute, Resolver, RoutingTable};

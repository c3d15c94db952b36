//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (axum-server, middleware, route table)
//!     → handler.rs (upgrade check, resolve, dial, upgrade)
//!     → response.rs (pre-upgrade errors to status codes)
//!     → bridge (after 101 Switching Protocols)
//! ```

pub mod handler;
pub mod response;
pub mod server;

pub use handler::X_REQUEST_ID;
pub use server::{AppState, HttpServer, ServerError};

//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Resolved Endpoint
//!     → dialer.rs (timeout-bounded connect per transport)
//!     → tls.rs (system trust roots, server name; HTTPS listener certs)
//!     → stream.rs (BackendStream: one variant per transport)
//!     → Hand off to bridge, tracked by connection.rs
//! ```
//!
//! # Design Decisions
//! - Backend connections are never pooled or reused
//! - Each session is tracked so shutdown can wait for it

pub mod connection;
pub mod dialer;
pub mod stream;
pub mod tls;

pub use connection::{SessionGuard, SessionId, SessionTracker};
pub use dialer::Dialer;
pub use stream::BackendStream;

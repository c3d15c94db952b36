//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → basic_auth.rs (check Authorization against htpasswd.rs)
//!     → 401 with WWW-Authenticate, or pass to routing
//! ```
//!
//! # Design Decisions
//! - Fail closed: reject on any security check failure
//! - Credential files are parsed once at startup
//! - Authentication is a layer; the bridge routes know nothing about it

pub mod basic_auth;
pub mod htpasswd;

pub use basic_auth::{basic_auth_middleware, BasicAuth};
pub use htpasswd::{Htpasswd, HtpasswdError};

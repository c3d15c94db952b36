//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Router, dialer, bridge produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (counters, gauge, histogram)
//!
//! Consumers:
//!     → stdout (pretty, compact or JSON)
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - Every request log line carries the x-request-id
//! - Session logs carry the session id and endpoint

pub mod logging;
pub mod metrics;

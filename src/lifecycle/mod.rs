//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → shutdown future resolves
//!
//! Shutdown (shutdown.rs):
//!     Stop accepting → Drain HTTP requests → Drain bridge sessions → Exit
//! ```
//!
//! # Design Decisions
//! - Ordered shutdown: stop accept, drain, close
//! - Both drain phases share one grace period; sessions past it are dropped

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
pub use signals::shutdown_signal;

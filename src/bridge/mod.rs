//! Session relay subsystem.
//!
//! # Data Flow
//! ```text
//! Upgraded WebSocket + dialed BackendStream
//!     → relay.rs (two copy loops, first finisher tears down both)
//!     → teardown.rs (one-shot completion signal)
//!     → SessionReport (bytes per direction, how each ended)
//! ```
//!
//! # Design Decisions
//! - No framing: WebSocket payloads map to raw bytes and back
//! - No session timeout; a session lasts as long as both peers keep it open
//! - Per-session buffers, nothing shared between sessions

pub mod relay;
pub mod teardown;

pub use relay::{Bridge, DirectionEnd, DirectionOutcome, SessionReport};
pub use teardown::{Direction, Teardown};

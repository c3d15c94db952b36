//! Shutdown coordination for the bridge.

use std::net::SocketAddr;
use std::time::Duration;

use axum_server::Handle;

use crate::net::SessionTracker;

/// Coordinator for graceful shutdown.
///
/// Stops the listener through the server handle, then waits for upgraded
/// sessions, which the HTTP server no longer tracks once they leave hyper.
#[derive(Clone)]
pub struct Shutdown {
    handle: Handle,
    sessions: SessionTracker,
    grace: Duration,
}

impl Shutdown {
    pub fn new(sessions: SessionTracker, grace: Duration) -> Self {
        Self {
            handle: Handle::new(),
            sessions,
            grace,
        }
    }

    /// Server handle to pass to `axum_server`.
    pub fn handle(&self) -> Handle {
        self.handle.clone()
    }

    /// Address the server bound, once it is listening.
    pub async fn listening(&self) -> Option<SocketAddr> {
        self.handle.listening().await
    }

    /// Stop accepting and give in-flight requests the grace period.
    pub fn trigger(&self) {
        tracing::info!(
            grace_secs = self.grace.as_secs_f64(),
            active_sessions = self.sessions.active_count(),
            "Graceful shutdown started"
        );
        self.handle.graceful_shutdown(Some(self.grace));
    }

    /// Wait up to the grace period for bridge sessions to end.
    ///
    /// Returns how many were still open when the wait gave up.
    pub async fn drain(&self) -> u64 {
        let remaining = self.sessions.drain(self.grace).await;
        if remaining > 0 {
            tracing::warn!(remaining, "Abandoning sessions still open after grace period");
        } else {
            tracing::info!("All sessions closed");
        }
        remaining
    }
}

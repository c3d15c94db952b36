//! Error types for request handling and bridge sessions.
//!
//! # Responsibilities
//! - Classify every way a bridged request can fail
//! - Carry the underlying cause for logs
//!
//! # Design Decisions
//! - Resolution and dial errors are recovered at the HTTP boundary and become
//!   status codes (see `http::response`)
//! - Stream errors happen after the upgrade and are only ever logged

use std::io;

use thiserror::Error;

use crate::routing::Endpoint;

/// Errors produced while turning a request into a bridged session.
#[derive(Error, Debug)]
pub enum ProxyError {
    /// The dynamic path does not decompose into `<address>/<transport>`.
    #[error("expected path <prefix>/<address>/<transport> but got {path}: {reason}")]
    BadMapping { path: String, reason: String },

    /// No static endpoint is configured for the path.
    #[error("no endpoint mapped to {path}")]
    NotFound { path: String },

    /// The backend could not be reached.
    #[error("failed to connect to {address} ({transport}): {source}")]
    DialFailed {
        address: String,
        transport: String,
        #[source]
        source: io::Error,
    },

    /// A session stream failed after the upgrade.
    #[error(transparent)]
    Stream(#[from] StreamError),
}

impl ProxyError {
    /// Creates a bad mapping error for `path`.
    pub fn bad_mapping(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::BadMapping {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Creates a dial failure for a resolved endpoint.
    pub fn dial_failed(endpoint: &Endpoint, source: io::Error) -> Self {
        Self::DialFailed {
            address: endpoint.address.clone(),
            transport: endpoint.transport.to_string(),
            source,
        }
    }

    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::BadMapping { .. } => "bad_mapping",
            Self::NotFound { .. } => "not_found",
            Self::DialFailed { .. } => "dial_failed",
            Self::Stream(_) => "stream",
        }
    }
}

/// I/O failures on either side of a live session.
#[derive(Error, Debug)]
pub enum StreamError {
    /// The WebSocket side failed.
    #[error("client stream error: {0}")]
    Client(#[source] axum::Error),

    /// The backend socket failed.
    #[error("backend stream error: {0}")]
    Backend(#[source] io::Error),

    /// A relay task panicked or was aborted.
    #[error("relay task aborted: {0}")]
    Aborted(String),
}

/// Result type alias using ProxyError.
pub type Result<T> = std::result::Result<T, ProxyError>;

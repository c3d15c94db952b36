//! Error to HTTP response mapping.
//!
//! # Responsibilities
//! - Map resolution and dial errors to status codes before any upgrade
//! - Keep backend details out of response bodies
//!
//! # Design Decisions
//! - Malformed dynamic paths are the client's fault (400) and say why
//! - A static path without an endpoint means the router and table disagree
//!   (500)
//! - Unreachable backends are 502 with a fixed body; the cause is logged

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::error::ProxyError;

impl ProxyError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::BadMapping { .. } => StatusCode::BAD_REQUEST,
            Self::NotFound { .. } | Self::Stream(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::DialFailed { .. } => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match &self {
            Self::BadMapping { .. } => self.to_string(),
            Self::DialFailed { .. } => "failed to connect".to_string(),
            Self::NotFound { .. } | Self::Stream(_) => "internal server error".to_string(),
        };
        (status, body).into_response()
    }
}

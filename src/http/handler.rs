//! Bridge request handlers.
//!
//! # Responsibilities
//! - Reject requests that are not WebSocket upgrades
//! - Resolve the endpoint and dial it before upgrading
//! - Hand the upgraded socket and backend stream to the bridge
//!
//! # Data Flow
//! ```text
//! GET /path (Upgrade: websocket)
//!     → Resolver (static table or dynamic path)
//!     → Dialer (bounded by connect timeout)
//!         fail → 400 / 500 / 502, no upgrade
//!     → 101 Switching Protocols
//!     → Bridge::run on the upgraded connection
//! ```

use std::net::SocketAddr;

use axum::{
    extract::{
        ws::{rejection::WebSocketUpgradeRejection, WebSocket, WebSocketUpgrade},
        ConnectInfo, State,
    },
    http::{HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Response},
};
use futures_util::StreamExt;

use crate::bridge::Bridge;
use crate::error::ProxyError;
use crate::http::server::AppState;
use crate::net::{BackendStream, SessionGuard};
use crate::observability::metrics;
use crate::routing::{Endpoint, Resolver};

pub const X_REQUEST_ID: &str = "x-request-id";

/// Which resolution mode a route uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Static,
    Dynamic,
}

impl Mode {
    fn resolve(self, resolver: &Resolver, path: &str) -> Result<Endpoint, ProxyError> {
        match self {
            Self::Static => resolver.resolve_static(path),
            Self::Dynamic => resolver.resolve_dynamic(path),
        }
    }
}

/// Handler for paths in the static routing table.
pub async fn static_endpoint(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    uri: Uri,
    headers: HeaderMap,
    upgrade: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    bridge_request(state, peer, uri, headers, upgrade, Mode::Static).await
}

/// Handler for paths under the dynamic mount.
pub async fn dynamic_endpoint(
    State(state): State<AppState>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    uri: Uri,
    headers: HeaderMap,
    upgrade: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    bridge_request(state, peer, uri, headers, upgrade, Mode::Dynamic).await
}

async fn bridge_request(
    state: AppState,
    peer: SocketAddr,
    uri: Uri,
    headers: HeaderMap,
    upgrade: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
    mode: Mode,
) -> Response {
    let request_id = headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string();
    let path = uri.path();

    let upgrade = match upgrade {
        Ok(upgrade) => upgrade,
        Err(rejection) => {
            tracing::debug!(
                request_id = %request_id,
                path = %path,
                reason = %rejection.body_text(),
                "Not a WebSocket upgrade"
            );
            metrics::record_request("not_upgrade", rejection.status().as_u16());
            return rejection.into_response();
        }
    };

    let endpoint = match mode.resolve(&state.resolver, path) {
        Ok(endpoint) => endpoint,
        Err(err) => return reject(&request_id, path, err),
    };

    tracing::info!(
        request_id = %request_id,
        peer = %peer,
        path = %path,
        endpoint = %endpoint,
        "Incoming request will be mapped to endpoint"
    );

    let backend = match state.dialer.dial(&endpoint).await {
        Ok(backend) => backend,
        Err(err) => return reject(&request_id, path, err),
    };

    metrics::record_request("upgraded", StatusCode::SWITCHING_PROTOCOLS.as_u16());
    let bridge = state.bridge;
    let guard = state.sessions.track();
    let failed_id = request_id.clone();

    upgrade
        .on_failed_upgrade(move |err| {
            tracing::warn!(request_id = %failed_id, error = %err, "WebSocket upgrade failed");
        })
        .on_upgrade(move |socket| {
            run_session(socket, backend, bridge, guard, endpoint, peer, request_id)
        })
        .into_response()
}

/// Log and convert a pre-upgrade failure.
fn reject(request_id: &str, path: &str, err: ProxyError) -> Response {
    let status = err.status_code();
    match &err {
        ProxyError::DialFailed { transport, .. } => {
            tracing::warn!(request_id = %request_id, path = %path, error = %err, "Backend dial failed");
            metrics::record_dial_failure(transport);
        }
        ProxyError::BadMapping { .. } => {
            tracing::info!(request_id = %request_id, path = %path, error = %err, "Rejected mapping");
        }
        _ => {
            tracing::error!(request_id = %request_id, path = %path, error = %err, "Unroutable request");
        }
    }
    metrics::record_request(err.kind(), status.as_u16());
    err.into_response()
}

async fn run_session(
    socket: WebSocket,
    backend: BackendStream,
    bridge: Bridge,
    guard: SessionGuard,
    endpoint: Endpoint,
    peer: SocketAddr,
    request_id: String,
) {
    metrics::record_session_started(backend.transport());
    tracing::debug!(session = %guard.id(), request_id = %request_id, "Session started");

    let (client_tx, client_rx) = socket.split();
    let report = bridge.run(client_rx, client_tx, backend).await;
    metrics::record_session_report(&report);

    for err in report.errors() {
        tracing::debug!(session = %guard.id(), error = %err, "Session stream error");
    }
    tracing::info!(
        session = %guard.id(),
        request_id = %request_id,
        peer = %peer,
        endpoint = %endpoint,
        bytes_to_backend = report.client_to_backend.bytes,
        bytes_to_client = report.backend_to_client.bytes,
        first_finished = ?report.first_finished,
        duration_ms = report.duration.as_millis() as u64,
        "Connection closed"
    );
}

//! Metrics collection and exposition.
//!
//! # Metrics
//! - `bridge_requests_total` (counter): bridged requests by outcome kind and status
//! - `bridge_dial_failures_total` (counter): failed dials by transport
//! - `bridge_sessions_total` (counter): upgraded sessions by transport
//! - `bridge_bytes_total` (counter): relayed bytes by direction
//! - `bridge_active_sessions` (gauge): live sessions
//! - `bridge_session_duration_seconds` (histogram): session lifetimes
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade and is a no-op until an
//!   exporter is installed
//! - The Prometheus exporter is optional and serves its own listener

use std::net::SocketAddr;
use std::time::Duration;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::bridge::SessionReport;
use crate::routing::Transport;

/// Install the Prometheus exporter on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record the outcome of a bridged request before any upgrade.
pub fn record_request(kind: &'static str, status: u16) {
    counter!("bridge_requests_total", "kind" => kind, "status" => status.to_string()).increment(1);
}

/// Record a failed dial. Tokens that name no transport share the `unknown` label.
pub fn record_dial_failure(transport: &str) {
    counter!("bridge_dial_failures_total", "transport" => transport_label(transport)).increment(1);
}

fn transport_label(token: &str) -> &'static str {
    token.parse::<Transport>().map_or("unknown", |t| t.as_str())
}

pub fn record_session_started(transport: Transport) {
    counter!("bridge_sessions_total", "transport" => transport.as_str()).increment(1);
}

/// Record bytes moved by a finished session.
pub fn record_session_report(report: &SessionReport) {
    for outcome in [&report.client_to_backend, &report.backend_to_client] {
        counter!("bridge_bytes_total", "direction" => outcome.direction.as_str())
            .increment(outcome.bytes);
    }
}

pub fn session_opened() {
    gauge!("bridge_active_sessions").increment(1.0);
}

pub fn session_closed(lifetime: Duration) {
    gauge!("bridge_active_sessions").decrement(1.0);
    histogram!("bridge_session_duration_seconds").record(lifetime.as_secs_f64());
}

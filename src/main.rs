//! ws-bridge
//!
//! Bridges WebSocket clients to raw TCP, UDP, TLS and Unix socket backends.
//!
//! # Architecture Overview
//!
//! ```text
//!                        ┌───────────────────────────────────────────────┐
//!                        │                  WS BRIDGE                    │
//!                        │                                               │
//!   WebSocket client     │  ┌────────┐   ┌──────────┐   ┌────────────┐   │
//!   ─────────────────────┼─▶│  http  │──▶│ routing  │──▶│    net     │───┼──▶ Backend
//!                        │  │ server │   │ resolver │   │   dialer   │   │   (tcp/udp/
//!                        │  └───┬────┘   └──────────┘   └─────┬──────┘   │    tls/unix)
//!                        │      │ 101 Switching Protocols      │          │
//!                        │      ▼                              ▼          │
//!   ◀────────────────────┼── ┌──────────────────────────────────────┐     │
//!                        │   │  bridge: two relays, shared teardown │◀────┼──▶
//!                        │   └──────────────────────────────────────┘     │
//!                        │                                               │
//!                        │  config · security · observability · lifecycle │
//!                        └───────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Bridge / to 127.0.0.1:12345 over tcp
//! ws-bridge
//!
//! # Two static endpoints and a dynamic mount
//! ws-bridge -d /dyn /ssh:10.0.0.2:22 /db:10.0.0.3:5432
//!
//! # With a configuration file
//! ws-bridge -c /etc/ws-bridge.toml -vv
//! ```

use clap::Parser;

use ws_bridge::config::Cli;
use ws_bridge::lifecycle::shutdown_signal;
use ws_bridge::net::tls;
use ws_bridge::observability::{logging, metrics};
use ws_bridge::HttpServer;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = cli.load()?;

    logging::init_logging(&config.observability, cli.log_level())?;
    tls::ensure_crypto_provider();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "ws-bridge starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        tls = config.listener.tls.is_some(),
        endpoints = config.endpoints.len(),
        dynamic_path = ?config.dynamic_path,
        connect_timeout_secs = config.timeouts.connect_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let server = HttpServer::new(config)?;
    server.run(shutdown_signal()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

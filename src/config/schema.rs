//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the bridge.
//! All types derive Serde traits for deserialization from config files.

use std::net::{AddrParseError, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::bridge::relay::{DEFAULT_BUFFER_SIZE, DEFAULT_CLOSE_GRACE};
use crate::routing::{Endpoint, Transport};

/// Path served when nothing else is configured.
pub const DEFAULT_ENDPOINT_PATH: &str = "/";

/// Backend behind [`DEFAULT_ENDPOINT_PATH`].
pub const DEFAULT_ENDPOINT_ADDRESS: &str = "127.0.0.1:12345";

/// Root configuration for the bridge.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address, TLS).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Relay settings applied to every session.
    pub bridge: BridgeConfig,

    /// Mount path for dynamic `<address>/<transport>` requests.
    pub dynamic_path: Option<String>,

    /// Static path to backend mappings.
    pub endpoints: Vec<Endpoint>,

    /// Client authentication.
    pub auth: AuthConfig,

    pub cors: CorsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl ProxyConfig {
    /// Adds the default `/` → `127.0.0.1:12345` endpoint when nothing is
    /// served.
    pub fn apply_default_endpoint(&mut self) {
        if self.endpoints.is_empty() && self.dynamic_path.is_none() {
            self.endpoints.push(Endpoint::new(
                DEFAULT_ENDPOINT_PATH,
                DEFAULT_ENDPOINT_ADDRESS,
                Transport::Tcp,
            ));
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080", or ":8080" for all interfaces).
    pub bind_address: String,

    /// Optional TLS configuration.
    pub tls: Option<TlsConfig>,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            tls: None,
        }
    }
}

impl ListenerConfig {
    /// Parses the bind address; a bare `:port` binds every interface.
    pub fn socket_addr(&self) -> Result<SocketAddr, AddrParseError> {
        match self.bind_address.strip_prefix(':') {
            Some(port) => format!("0.0.0.0:{port}").parse(),
            None => self.bind_address.parse(),
        }
    }
}

/// TLS configuration for the listener.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TlsConfig {
    /// Path to certificate file (PEM).
    pub cert_path: String,

    /// Path to private key file (PEM).
    pub key_path: String,
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Backend connection establishment timeout in seconds. Covers the TLS
    /// handshake for tls endpoints.
    pub connect_secs: u64,

    /// Time allowed for in-flight requests and sessions at shutdown.
    pub graceful_shutdown_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 15,
            graceful_shutdown_secs: 15,
        }
    }
}

impl TimeoutConfig {
    pub fn connect(&self) -> Duration {
        Duration::from_secs(self.connect_secs)
    }

    pub fn graceful_shutdown(&self) -> Duration {
        Duration::from_secs(self.graceful_shutdown_secs)
    }
}

/// Session relay configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Read buffer per direction; also the largest UDP datagram forwarded.
    pub buffer_size: usize,

    /// Grace period for closing each side at teardown, in milliseconds.
    pub close_grace_ms: u64,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
            close_grace_ms: DEFAULT_CLOSE_GRACE.as_millis() as u64,
        }
    }
}

impl BridgeConfig {
    pub fn close_grace(&self) -> Duration {
        Duration::from_millis(self.close_grace_ms)
    }
}

/// Authentication scheme required from clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum AuthKind {
    #[default]
    None,
    Basic,
}

/// Client authentication configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    pub kind: AuthKind,

    /// Realm announced in `WWW-Authenticate`.
    pub realm: String,

    /// htpasswd file with bcrypt or `{SHA}` entries.
    pub htpasswd: Option<PathBuf>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            kind: AuthKind::None,
            realm: "Restricted zone".to_string(),
            htpasswd: None,
        }
    }
}

/// Cross-origin request configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Allow any origin, method and header.
    pub enabled: bool,
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Compact,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    pub log_format: LogFormat,

    /// Disable logging entirely.
    pub quiet: bool,

    /// Enable the Prometheus exporter.
    pub metrics_enabled: bool,

    /// Exporter listen address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            quiet: false,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

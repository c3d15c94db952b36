//! Command-line interface.
//!
//! Every flag can also be set through the environment. Values given here
//! override the configuration file; anything left unset keeps the file's
//! value or the schema default.

use std::path::PathBuf;

use clap::{ArgAction, Parser};
use tracing::Level;

use crate::config::loader::{read_config, ConfigError};
use crate::config::schema::{AuthKind, ProxyConfig, TlsConfig};
use crate::config::validation::validate_config;
use crate::routing::{Endpoint, Transport};

/// Bridges WebSocket connections to TCP, UDP, TLS and Unix socket backends.
#[derive(Parser, Debug)]
#[command(name = "ws-bridge")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long, env = "CONFIG_PATH")]
    pub config: Option<PathBuf>,

    /// Listen address [default: 0.0.0.0:8080]
    #[arg(short, long, env = "BINDING")]
    pub binding: Option<String>,

    /// Backend connect timeout in seconds [default: 15]
    #[arg(short, long, env = "TIMEOUT")]
    pub timeout: Option<u64>,

    /// Graceful shutdown period in seconds [default: 15]
    #[arg(long, env = "GRACEFUL_SHUTDOWN")]
    pub graceful_shutdown: Option<u64>,

    /// Serve HTTPS
    #[arg(long, env = "TLS")]
    pub tls: bool,

    /// PEM certificate used with --tls
    #[arg(long, env = "CERT_FILE", default_value = "server.crt")]
    pub cert_file: String,

    /// PEM private key used with --tls
    #[arg(long, env = "KEY_FILE", default_value = "server.key")]
    pub key_file: String,

    /// Disable logging
    #[arg(short, long, env = "QUIET")]
    pub quiet: bool,

    /// Increase verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, action = ArgAction::Count)]
    pub verbose: u8,

    /// Allow cross-origin requests from anywhere
    #[arg(long, env = "CORS")]
    pub cors: bool,

    /// Mount path for dynamic <address>/<transport> mappings
    #[arg(short, long, env = "DYNAMIC")]
    pub dynamic: Option<String>,

    /// Client authentication
    #[arg(short = 'k', long, env = "AUTH_KIND", value_enum)]
    pub auth_kind: Option<AuthKind>,

    /// Realm announced to clients [default: Restricted zone]
    #[arg(long, env = "AUTH_REALM")]
    pub auth_realm: Option<String>,

    /// htpasswd file for basic authentication
    #[arg(short = 'p', long, env = "AUTH_HTPASSWD")]
    pub auth_htpasswd: Option<PathBuf>,

    /// Serve Prometheus metrics on this address
    #[arg(long, env = "METRICS_ADDRESS")]
    pub metrics_address: Option<String>,

    /// Static tcp endpoints as /path:address [default: /:127.0.0.1:12345]
    #[arg(env = "ENDPOINT", value_delimiter = ';', value_parser = parse_endpoint_arg)]
    pub endpoints: Vec<Endpoint>,
}

impl Cli {
    /// Log level requested by `-v`, if any.
    pub fn log_level(&self) -> Option<Level> {
        match self.verbose {
            0 => None,
            1 => Some(Level::INFO),
            2 => Some(Level::DEBUG),
            _ => Some(Level::TRACE),
        }
    }

    /// Read the configuration file (if any), apply overrides and validate.
    pub fn load(&self) -> Result<ProxyConfig, ConfigError> {
        let base = match &self.config {
            Some(path) => read_config(path)?,
            None => ProxyConfig::default(),
        };
        let config = self.merge(base);
        validate_config(&config).map_err(ConfigError::Validation)?;
        Ok(config)
    }

    /// Apply command-line values over `config`.
    pub fn merge(&self, mut config: ProxyConfig) -> ProxyConfig {
        if let Some(binding) = &self.binding {
            config.listener.bind_address = binding.clone();
        }
        if self.tls {
            config.listener.tls = Some(TlsConfig {
                cert_path: self.cert_file.clone(),
                key_path: self.key_file.clone(),
            });
        }
        if let Some(timeout) = self.timeout {
            config.timeouts.connect_secs = timeout;
        }
        if let Some(grace) = self.graceful_shutdown {
            config.timeouts.graceful_shutdown_secs = grace;
        }
        if let Some(dynamic) = &self.dynamic {
            config.dynamic_path = Some(dynamic.clone());
        }
        if !self.endpoints.is_empty() {
            config.endpoints = self.endpoints.clone();
        }
        if let Some(kind) = self.auth_kind {
            config.auth.kind = kind;
        }
        if let Some(realm) = &self.auth_realm {
            config.auth.realm = realm.clone();
        }
        if let Some(htpasswd) = &self.auth_htpasswd {
            config.auth.htpasswd = Some(htpasswd.clone());
        }
        if self.cors {
            config.cors.enabled = true;
        }
        if self.quiet {
            config.observability.quiet = true;
        }
        if let Some(address) = &self.metrics_address {
            config.observability.metrics_enabled = true;
            config.observability.metrics_address = address.clone();
        }

        config.apply_default_endpoint();
        config
    }
}

/// Parse `/path:address` into a tcp endpoint.
pub fn parse_endpoint_arg(s: &str) -> Result<Endpoint, String> {
    let (path, address) = s
        .split_once(':')
        .ok_or_else(|| format!("expected /path:address, got {s:?}"))?;
    if !path.starts_with('/') {
        return Err(format!("endpoint path must start with '/', got {path:?}"));
    }
    if address.is_empty() {
        return Err(format!("endpoint {path:?} has an empty address"));
    }
    Ok(Endpoint::new(path, address, Transport::Tcp))
}

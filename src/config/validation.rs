//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - Detect conflicting or unroutable endpoint paths
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::{AuthKind, ProxyConfig};
use crate::routing::DynamicRoute;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Render errors as one comma-separated line.
pub fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Validate a configuration, collecting every error.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if let Err(e) = config.listener.socket_addr() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("{:?} is not a socket address: {e}", config.listener.bind_address),
        ));
    }
    if let Some(tls) = &config.listener.tls {
        if tls.cert_path.is_empty() {
            errors.push(ValidationError::new("listener.tls.cert_path", "must not be empty"));
        }
        if tls.key_path.is_empty() {
            errors.push(ValidationError::new("listener.tls.key_path", "must not be empty"));
        }
    }

    if config.timeouts.connect_secs == 0 {
        errors.push(ValidationError::new("timeouts.connect_secs", "must be greater than 0"));
    }
    if config.timeouts.graceful_shutdown_secs == 0 {
        errors.push(ValidationError::new(
            "timeouts.graceful_shutdown_secs",
            "must be greater than 0",
        ));
    }
    if config.bridge.buffer_size == 0 {
        errors.push(ValidationError::new("bridge.buffer_size", "must be greater than 0"));
    }

    let dynamic = config.dynamic_path.as_deref().map(|mount| {
        if let Some(problem) = path_problem(mount) {
            errors.push(ValidationError::new("dynamic_path", problem));
        }
        DynamicRoute::new(mount)
    });

    let mut seen = HashSet::new();
    for (i, endpoint) in config.endpoints.iter().enumerate() {
        let field = format!("endpoints[{i}]");
        if let Some(problem) = path_problem(&endpoint.path) {
            errors.push(ValidationError::new(format!("{field}.path"), problem));
        }
        if !seen.insert(endpoint.path.as_str()) {
            errors.push(ValidationError::new(
                format!("{field}.path"),
                format!("duplicate path {:?}", endpoint.path),
            ));
        }
        if let Some(route) = dynamic.as_ref().filter(|route| route.covers(&endpoint.path)) {
            errors.push(ValidationError::new(
                format!("{field}.path"),
                format!(
                    "{:?} is shadowed by dynamic mount {:?}",
                    endpoint.path,
                    route.route_pattern()
                ),
            ));
        }
        if endpoint.address.trim().is_empty() {
            errors.push(ValidationError::new(format!("{field}.address"), "must not be empty"));
        }
    }

    if config.endpoints.is_empty() && dynamic.is_none() {
        errors.push(ValidationError::new(
            "endpoints",
            "no endpoints or dynamic_path configured",
        ));
    }

    if config.auth.kind == AuthKind::Basic && config.auth.htpasswd.is_none() {
        errors.push(ValidationError::new(
            "auth.htpasswd",
            "required when auth.kind is basic",
        ));
    }

    let observability = &config.observability;
    if observability.metrics_enabled
        && observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("{:?} is not a socket address", observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Why `path` cannot be used as a route, if it cannot.
fn path_problem(path: &str) -> Option<String> {
    if !path.starts_with('/') {
        return Some(format!("{path:?} must start with '/'"));
    }
    if path.contains(['{', '}']) {
        return Some(format!("{path:?} must not contain '{{' or '}}'"));
    }
    if path
        .split('/')
        .any(|segment| segment.starts_with(':') || segment.starts_with('*'))
    {
        return Some(format!("{path:?} has a segment starting with ':' or '*'"));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::TlsConfig;
    use crate::routing::{Endpoint, Transport};

    fn valid() -> ProxyConfig {
        let mut config = ProxyConfig::default();
        config.apply_default_endpoint();
        config
    }

    #[test]
    fn test_default_config_is_valid() {
        assert_eq!(validate_config(&valid()), Ok(()));
    }

    #[test]
    fn test_reports_every_error() {
        let mut config = valid();
        config.listener.bind_address = "nowhere".into();
        config.timeouts.connect_secs = 0;
        config.bridge.buffer_size = 0;
        config.auth.kind = AuthKind::Basic;

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(
            fields,
            [
                "listener.bind_address",
                "timeouts.connect_secs",
                "bridge.buffer_size",
                "auth.htpasswd"
            ]
        );
    }

    #[test]
    fn test_endpoint_path_rules() {
        let mut config = ProxyConfig::default();
        config.endpoints = vec![
            Endpoint::new("ws", "127.0.0.1:1", Transport::Tcp),
            Endpoint::new("/a/{id}", "127.0.0.1:1", Transport::Tcp),
            Endpoint::new("/a/:id", "127.0.0.1:1", Transport::Tcp),
            Endpoint::new("/ok", "", Transport::Tcp),
            Endpoint::new("/ok", "127.0.0.1:1", Transport::Udp),
        ];

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(
            fields,
            [
                "endpoints[0].path",
                "endpoints[1].path",
                "endpoints[2].path",
                "endpoints[3].address",
                "endpoints[4].path"
            ]
        );
        assert!(errors[4].message.contains("duplicate"));
    }

    #[test]
    fn test_dynamic_mount_shadowing() {
        let mut config = ProxyConfig::default();
        config.dynamic_path = Some("/dyn/".into());
        config.endpoints = vec![
            Endpoint::new("/dyn/fixed", "127.0.0.1:1", Transport::Tcp),
            Endpoint::new("/dynamo", "127.0.0.1:1", Transport::Tcp),
        ];

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "endpoints[0].path");
        assert!(errors[0].message.contains("shadowed"));
    }

    #[test]
    fn test_dynamic_only_is_valid() {
        let config = ProxyConfig {
            dynamic_path: Some("/".into()),
            ..Default::default()
        };
        assert_eq!(validate_config(&config), Ok(()));
    }

    #[test]
    fn test_nothing_served() {
        let errors = validate_config(&ProxyConfig::default()).unwrap_err();
        assert_eq!(errors[0].field, "endpoints");
    }

    #[test]
    fn test_tls_and_metrics() {
        let mut config = valid();
        config.listener.tls = Some(TlsConfig {
            cert_path: String::new(),
            key_path: "k.pem".into(),
        });
        config.observability.metrics_enabled = true;
        config.observability.metrics_address = "9090".into();

        let errors = validate_config(&config).unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(
            fields,
            ["listener.tls.cert_path", "observability.metrics_address"]
        );
    }
}

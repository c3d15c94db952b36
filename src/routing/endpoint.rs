//! Endpoint and transport definitions.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Backend transport kinds a request can be bridged to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    /// Plain TCP stream.
    #[default]
    Tcp,
    /// Connected UDP socket, one datagram per message.
    Udp,
    /// Unix domain stream socket; the address is a filesystem path.
    Unix,
    /// TCP with TLS, verified against the system trust store.
    Tls,
}

impl Transport {
    /// All recognized transports.
    pub const ALL: [Transport; 4] = [Self::Tcp, Self::Udp, Self::Unix, Self::Tls];

    /// Lowercase token used in paths and configuration.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tcp => "tcp",
            Self::Udp => "udp",
            Self::Unix => "unix",
            Self::Tls => "tls",
        }
    }
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a transport token is not one of `tcp`, `udp`, `unix`, `tls`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown transport {0:?}")]
pub struct UnknownTransport(pub String);

impl FromStr for Transport {
    type Err = UnknownTransport;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| UnknownTransport(s.to_string()))
    }
}

/// A destination for bridged sessions.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Endpoint {
    /// HTTP route that triggers this mapping; empty for dynamic endpoints.
    #[serde(default)]
    pub path: String,

    /// `host:port`, or a socket path for unix endpoints.
    pub address: String,

    /// Transport used to reach `address`.
    #[serde(default)]
    pub transport: Transport,
}

impl Endpoint {
    pub fn new(path: impl Into<String>, address: impl Into<String>, transport: Transport) -> Self {
        Self {
            path: path.into(),
            address: address.into(),
            transport,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.address, self.transport)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_tokens() {
        for transport in Transport::ALL {
            assert_eq!(transport.as_str().parse::<Transport>(), Ok(transport));
        }
    }

    #[test]
    fn test_unknown_transport() {
        let err = "sctp".parse::<Transport>().unwrap_err();
        assert_eq!(err, UnknownTransport("sctp".into()));
        // Tokens are case-sensitive.
        assert!("TCP".parse::<Transport>().is_err());
    }

    #[test]
    fn test_endpoint_deserialize_defaults_to_tcp() {
        let endpoint: Endpoint = toml::from_str(r#"path = "/ws"
address = "127.0.0.1:5000""#)
        .unwrap();
        assert_eq!(endpoint.transport, Transport::Tcp);
        assert_eq!(endpoint.to_string(), "127.0.0.1:5000 (tcp)");
    }

    #[test]
    fn test_endpoint_rejects_unknown_transport() {
        let parsed: Result<Endpoint, _> = toml::from_str(
            r#"path = "/ws"
address = "127.0.0.1:5000"
transport = "sctp""#,
        );
        assert!(parsed.is_err());
    }
}

//! Request path to endpoint resolution.
//!
//! # Responsibilities
//! - Exact-match lookup of static endpoints
//! - Decode `<address>/<transport>` under the dynamic mount
//!
//! # Design Decisions
//! - Immutable after construction (shared without locks)
//! - Dynamic paths are split before percent-decoding, so `%2F` may appear
//!   inside an address (unix socket paths) without adding a segment
//! - Unknown transport tokens surface as dial failures, before any connect

use std::collections::HashMap;
use std::io;

use percent_encoding::percent_decode_str;

use crate::error::ProxyError;
use crate::routing::endpoint::{Endpoint, Transport};

/// Static path to endpoint table, built once at startup.
#[derive(Debug, Clone, Default)]
pub struct RoutingTable {
    endpoints: HashMap<String, Endpoint>,
}

impl RoutingTable {
    /// Build a table from endpoints. A later endpoint with the same path
    /// replaces an earlier one; configuration validation rejects duplicates.
    pub fn new(endpoints: impl IntoIterator<Item = Endpoint>) -> Self {
        Self {
            endpoints: endpoints
                .into_iter()
                .map(|ep| (ep.path.clone(), ep))
                .collect(),
        }
    }

    /// Exact path lookup.
    pub fn get(&self, path: &str) -> Option<&Endpoint> {
        self.endpoints.get(path)
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.endpoints.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }
}

/// A mount path whose remaining segments encode the endpoint per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DynamicRoute {
    /// Normalized prefix without trailing slash; empty when mounted at `/`.
    prefix: String,
}

impl DynamicRoute {
    pub fn new(mount: &str) -> Self {
        Self {
            prefix: normalize_mount(mount).to_string(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Router pattern capturing everything below the mount.
    pub fn route_pattern(&self) -> String {
        format!("{}/{{*rest}}", self.prefix)
    }

    /// Whether a static path would be shadowed by this mount.
    pub fn covers(&self, path: &str) -> bool {
        path == self.prefix
            || path
                .strip_prefix(self.prefix.as_str())
                .is_some_and(|rest| rest.starts_with('/'))
    }

    /// Decode a transient endpoint from a raw request path.
    pub fn resolve(&self, path: &str) -> Result<Endpoint, ProxyError> {
        let rest = path
            .strip_prefix(self.prefix.as_str())
            .and_then(|rest| rest.strip_prefix('/'))
            .ok_or_else(|| {
                ProxyError::bad_mapping(path, format!("path is not under {}/", self.prefix))
            })?;

        let segments: Vec<&str> = rest.split('/').collect();
        let (raw_address, token) = match segments.as_slice() {
            [address, transport] if !address.is_empty() && !transport.is_empty() => {
                (*address, *transport)
            }
            [_, _] => return Err(ProxyError::bad_mapping(path, "empty segment")),
            other => {
                return Err(ProxyError::bad_mapping(
                    path,
                    format!("expected 2 segments, got {}", other.len()),
                ))
            }
        };

        let address = percent_decode_str(raw_address)
            .decode_utf8()
            .map_err(|_| ProxyError::bad_mapping(path, "address is not valid UTF-8"))?
            .into_owned();

        let transport = token.parse::<Transport>().map_err(|err| ProxyError::DialFailed {
            address: address.clone(),
            transport: token.to_string(),
            source: io::Error::new(io::ErrorKind::InvalidInput, err),
        })?;

        Ok(Endpoint {
            path: String::new(),
            address,
            transport,
        })
    }
}

/// Resolves inbound request paths to endpoints.
#[derive(Debug, Clone, Default)]
pub struct Resolver {
    table: RoutingTable,
    dynamic: Option<DynamicRoute>,
}

impl Resolver {
    pub fn new(table: RoutingTable, dynamic: Option<DynamicRoute>) -> Self {
        Self { table, dynamic }
    }

    pub fn table(&self) -> &RoutingTable {
        &self.table
    }

    pub fn dynamic(&self) -> Option<&DynamicRoute> {
        self.dynamic.as_ref()
    }

    /// Static mode: exact match against the routing table.
    pub fn resolve_static(&self, path: &str) -> Result<Endpoint, ProxyError> {
        self.table
            .get(path)
            .cloned()
            .ok_or_else(|| ProxyError::NotFound {
                path: path.to_string(),
            })
    }

    /// Dynamic mode: decode the endpoint from the path.
    pub fn resolve_dynamic(&self, path: &str) -> Result<Endpoint, ProxyError> {
        match &self.dynamic {
            Some(route) => route.resolve(path),
            None => Err(ProxyError::NotFound {
                path: path.to_string(),
            }),
        }
    }
}

/// Strip trailing slashes from a mount path.
pub fn normalize_mount(mount: &str) -> &str {
    mount.trim_end_matches('/')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> RoutingTable {
        RoutingTable::new(vec![
            Endpoint::new("/ws", "127.0.0.1:9000", Transport::Tcp),
            Endpoint::new("/dns", "127.0.0.1:53", Transport::Udp),
            Endpoint::new("/sock", "/run/app.sock", Transport::Unix),
            Endpoint::new("/secure", "example.com:443", Transport::Tls),
        ])
    }

    #[test]
    fn test_static_resolves_exact_pairs() {
        let resolver = Resolver::new(table(), None);
        for path in ["/ws", "/dns", "/sock", "/secure"] {
            let endpoint = resolver.resolve_static(path).unwrap();
            assert_eq!(&endpoint, resolver.table().get(path).unwrap());
            assert_eq!(endpoint.path, path);
        }
    }

    #[test]
    fn test_static_is_exact_match() {
        let resolver = Resolver::new(table(), None);
        assert!(matches!(
            resolver.resolve_static("/ws/"),
            Err(ProxyError::NotFound { .. })
        ));
        assert!(matches!(
            resolver.resolve_static("/w"),
            Err(ProxyError::NotFound { .. })
        ));
    }

    #[test]
    fn test_dynamic_resolves_every_transport() {
        let route = DynamicRoute::new("/dyn");
        for transport in Transport::ALL {
            let path = format!("/dyn/10.0.0.1:7000/{}", transport);
            let endpoint = route.resolve(&path).unwrap();
            assert_eq!(endpoint.address, "10.0.0.1:7000");
            assert_eq!(endpoint.transport, transport);
            assert!(endpoint.path.is_empty());
        }
    }

    #[test]
    fn test_dynamic_segment_count() {
        let route = DynamicRoute::new("/dyn/");
        for path in [
            "/dyn/",
            "/dyn/127.0.0.1:80",
            "/dyn/127.0.0.1:80/tcp/extra",
            "/dyn/127.0.0.1:80/tcp/",
            "/dyn//tcp",
            "/dyn/127.0.0.1:80/",
        ] {
            assert!(
                matches!(route.resolve(path), Err(ProxyError::BadMapping { .. })),
                "{path} should be a bad mapping"
            );
        }
    }

    #[test]
    fn test_dynamic_unknown_transport_is_dial_failure() {
        let route = DynamicRoute::new("/dyn");
        match route.resolve("/dyn/127.0.0.1:80/sctp") {
            Err(ProxyError::DialFailed {
                address,
                transport,
                source,
            }) => {
                assert_eq!(address, "127.0.0.1:80");
                assert_eq!(transport, "sctp");
                assert_eq!(source.kind(), io::ErrorKind::InvalidInput);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_dynamic_decodes_escaped_slashes() {
        let route = DynamicRoute::new("/dyn");
        let endpoint = route.resolve("/dyn/%2Frun%2Fapp.sock/unix").unwrap();
        assert_eq!(endpoint.address, "/run/app.sock");
        assert_eq!(endpoint.transport, Transport::Unix);
    }

    #[test]
    fn test_dynamic_rejects_invalid_utf8() {
        let route = DynamicRoute::new("/dyn");
        assert!(matches!(
            route.resolve("/dyn/%FF%FE/tcp"),
            Err(ProxyError::BadMapping { .. })
        ));
    }

    #[test]
    fn test_dynamic_mounted_at_root() {
        let route = DynamicRoute::new("/");
        assert_eq!(route.prefix(), "");
        assert_eq!(route.route_pattern(), "/{*rest}");
        let endpoint = route.resolve("/localhost:22/tcp").unwrap();
        assert_eq!(endpoint.address, "localhost:22");
    }

    #[test]
    fn test_dynamic_prefix_must_match() {
        let route = DynamicRoute::new("/dyn");
        assert!(matches!(
            route.resolve("/dynamic/a:1/tcp"),
            Err(ProxyError::BadMapping { .. })
        ));
    }

    #[test]
    fn test_covers() {
        let route = DynamicRoute::new("/dyn");
        assert!(route.covers("/dyn"));
        assert!(route.covers("/dyn/a"));
        assert!(!route.covers("/dynamic"));
        assert!(!route.covers("/ws"));

        let root = DynamicRoute::new("/");
        assert!(root.covers("/ws"));
    }

    #[test]
    fn test_resolver_without_dynamic() {
        let resolver = Resolver::new(table(), None);
        assert!(matches!(
            resolver.resolve_dynamic("/dyn/a:1/tcp"),
            Err(ProxyError::NotFound { .. })
        ));
    }
}

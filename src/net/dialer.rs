//! Backend dialing.
//!
//! # Responsibilities
//! - Open one connection per request for the endpoint's transport
//! - Bound connection establishment by the configured timeout
//! - Verify TLS backends against the system trust store
//!
//! # Design Decisions
//! - One dial strategy per `Transport` variant, chosen by exhaustive match
//! - A single attempt; failures are reported, never retried
//! - For TLS the timeout covers connect and handshake together
//! - The trust store is loaded once; if it is unusable only TLS dials fail

use std::future::Future;
use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rustls::ClientConfig;
use tokio::net::{lookup_host, TcpStream, UdpSocket};
use tokio_rustls::TlsConnector;

use crate::error::ProxyError;
use crate::net::stream::BackendStream;
use crate::net::tls;
use crate::routing::{Endpoint, Transport};

/// Opens backend connections with a bounded connect time.
#[derive(Clone)]
pub struct Dialer {
    timeout: Duration,
    tls: Result<TlsConnector, Arc<str>>,
}

impl std::fmt::Debug for Dialer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dialer")
            .field("timeout", &self.timeout)
            .field("tls_ready", &self.tls.is_ok())
            .finish()
    }
}

impl Dialer {
    /// Dialer whose TLS connections trust the system certificate store.
    pub fn new(timeout: Duration) -> Self {
        let tls = tls::native_client_config()
            .map(TlsConnector::from)
            .map_err(|e| {
                tracing::warn!(error = %e, "TLS backends will be unreachable");
                Arc::from(e.to_string())
            });
        Self { timeout, tls }
    }

    /// Dialer with an explicit TLS client configuration.
    pub fn with_tls_config(timeout: Duration, config: Arc<ClientConfig>) -> Self {
        Self {
            timeout,
            tls: Ok(TlsConnector::from(config)),
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Connect to `endpoint`. Any failure is a `DialFailed`.
    pub async fn dial(&self, endpoint: &Endpoint) -> Result<BackendStream, ProxyError> {
        let started = Instant::now();
        let address = endpoint.address.as_str();

        let result = match endpoint.transport {
            Transport::Tcp => connect_timeout(self.timeout, dial_tcp(address))
                .await
                .map(BackendStream::Tcp),
            Transport::Udp => connect_timeout(self.timeout, dial_udp(address))
                .await
                .map(BackendStream::Udp),
            Transport::Unix => connect_timeout(self.timeout, dial_unix(address)).await,
            Transport::Tls => match &self.tls {
                Ok(connector) => connect_timeout(self.timeout, dial_tls(connector, address))
                    .await
                    .map(|s| BackendStream::Tls(Box::new(s))),
                Err(reason) => Err(io::Error::new(io::ErrorKind::Unsupported, reason.to_string())),
            },
        };

        match result {
            Ok(stream) => {
                tracing::debug!(
                    endpoint = %endpoint,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Backend connected"
                );
                Ok(stream)
            }
            Err(source) => Err(ProxyError::dial_failed(endpoint, source)),
        }
    }
}

/// Run a connect future under `timeout`, mapping expiry to `TimedOut`.
pub async fn connect_timeout<T, F>(timeout: Duration, connect: F) -> io::Result<T>
where
    F: Future<Output = io::Result<T>>,
{
    match tokio::time::timeout(timeout, connect).await {
        Ok(result) => result,
        Err(_) => Err(io::Error::new(
            io::ErrorKind::TimedOut,
            format!("connection timed out after {:?}", timeout),
        )),
    }
}

async fn dial_tcp(address: &str) -> io::Result<TcpStream> {
    let stream = TcpStream::connect(address).await?;
    stream.set_nodelay(true)?;
    Ok(stream)
}

async fn dial_udp(address: &str) -> io::Result<UdpSocket> {
    let target = lookup_host(address).await?.next().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::AddrNotAvailable,
            format!("{address} did not resolve to any address"),
        )
    })?;
    let local: SocketAddr = if target.is_ipv4() {
        (Ipv4Addr::UNSPECIFIED, 0).into()
    } else {
        (Ipv6Addr::UNSPECIFIED, 0).into()
    };

    let socket = UdpSocket::bind(local).await?;
    socket.connect(target).await?;
    Ok(socket)
}

#[cfg(unix)]
async fn dial_unix(address: &str) -> io::Result<BackendStream> {
    tokio::net::UnixStream::connect(address)
        .await
        .map(BackendStream::Unix)
}

#[cfg(not(unix))]
async fn dial_unix(_address: &str) -> io::Result<BackendStream> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "unix sockets are not supported on this platform",
    ))
}

async fn dial_tls(
    connector: &TlsConnector,
    address: &str,
) -> io::Result<tokio_rustls::client::TlsStream<TcpStream>> {
    let name = tls::server_name(address)?;
    let tcp = dial_tcp(address).await?;
    connector.connect(name, tcp).await
}

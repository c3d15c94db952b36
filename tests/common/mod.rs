//! Shared utilities for integration tests.
#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream, UdpSocket};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

use ws_bridge::config::ProxyConfig;
use ws_bridge::net::{Dialer, SessionTracker};
use ws_bridge::routing::{Endpoint, Transport};
use ws_bridge::HttpServer;

pub type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Bound on how long any single step of a test may wait.
pub const STEP: Duration = Duration::from_secs(5);

/// What a mock backend observed.
pub struct BackendEvents {
    /// Bytes received, one entry per read.
    pub received: mpsc::UnboundedReceiver<Vec<u8>>,
    /// Fires once per connection when the backend sees EOF.
    pub closed: mpsc::UnboundedReceiver<()>,
    pub accepted: Arc<AtomicUsize>,
}

impl BackendEvents {
    pub fn accepted(&self) -> usize {
        self.accepted.load(Ordering::SeqCst)
    }

    /// Collect received bytes until `len` have arrived.
    pub async fn read_exact(&mut self, len: usize) -> Vec<u8> {
        let mut data = Vec::new();
        while data.len() < len {
            let chunk = tokio::time::timeout(STEP, self.received.recv())
                .await
                .expect("backend received nothing")
                .expect("backend channel closed");
            data.extend(chunk);
        }
        data
    }

    pub async fn wait_closed(&mut self) {
        tokio::time::timeout(STEP, self.closed.recv())
            .await
            .expect("backend connection was not closed")
            .expect("backend channel closed");
    }
}

/// Drive one backend connection: record input, reply `pong` to every read.
pub async fn serve_pong<S>(
    mut socket: S,
    received: mpsc::UnboundedSender<Vec<u8>>,
    closed: mpsc::UnboundedSender<()>,
) where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut buf = [0u8; 4096];
    loop {
        match socket.read(&mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                let _ = received.send(buf[..n].to_vec());
                if socket.write_all(b"pong").await.is_err() {
                    break;
                }
            }
        }
    }
    let _ = closed.send(());
}

/// Start a TCP backend that answers every read with `pong`.
pub async fn start_pong_backend() -> (SocketAddr, BackendEvents) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (received_tx, received) = mpsc::unbounded_channel();
    let (closed_tx, closed) = mpsc::unbounded_channel();
    let accepted = Arc::new(AtomicUsize::new(0));

    tokio::spawn({
        let accepted = accepted.clone();
        async move {
            while let Ok((socket, _)) = listener.accept().await {
                accepted.fetch_add(1, Ordering::SeqCst);
                tokio::spawn(serve_pong(socket, received_tx.clone(), closed_tx.clone()));
            }
        }
    });

    (addr, BackendEvents { received, closed, accepted })
}

/// Start a TCP backend that writes `greeting` and closes immediately.
pub async fn start_greeting_backend(greeting: &'static [u8]) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let _ = socket.write_all(greeting).await;
            let _ = socket.shutdown().await;
        }
    });
    addr
}

/// Start a UDP backend that echoes each datagram.
pub async fn start_udp_echo() -> SocketAddr {
    let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let addr = socket.local_addr().unwrap();
    tokio::spawn(async move {
        let mut buf = [0u8; 65536];
        while let Ok((n, peer)) = socket.recv_from(&mut buf).await {
            let _ = socket.send_to(&buf[..n], peer).await;
        }
    });
    addr
}

/// An address nothing listens on.
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

pub fn config(endpoints: Vec<Endpoint>, dynamic_path: Option<&str>) -> ProxyConfig {
    ProxyConfig {
        endpoints,
        dynamic_path: dynamic_path.map(str::to_string),
        ..Default::default()
    }
}

pub fn tcp_endpoint(path: &str, addr: SocketAddr) -> Endpoint {
    Endpoint::new(path, addr.to_string(), Transport::Tcp)
}

/// A running bridge on an ephemeral port.
pub struct Bridge {
    pub addr: SocketAddr,
    pub sessions: SessionTracker,
}

impl Bridge {
    pub fn ws_url(&self, path: &str) -> String {
        format!("ws://{}{}", self.addr, path)
    }

    pub fn http_url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn connect(&self, path: &str) -> Client {
        let (client, response) = tokio::time::timeout(STEP, tokio_tungstenite::connect_async(self.ws_url(path)))
            .await
            .expect("handshake timed out")
            .expect("handshake failed");
        assert_eq!(response.status(), 101);
        client
    }

    /// Attempt a handshake that must fail; returns the HTTP status.
    pub async fn connect_status(&self, path: &str) -> u16 {
        match tokio_tungstenite::connect_async(self.ws_url(path)).await {
            Err(tungstenite::Error::Http(response)) => response.status().as_u16(),
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("handshake to {path} unexpectedly succeeded"),
        }
    }
}

/// Serve a bridge for `config` with the default dialer.
pub async fn start_bridge(config: ProxyConfig) -> Bridge {
    let dialer = Dialer::new(config.timeouts.connect());
    start_bridge_with(config, dialer).await
}

/// Serve a bridge for `config` using `dialer` for backends.
pub async fn start_bridge_with(config: ProxyConfig, dialer: Dialer) -> Bridge {
    let server = HttpServer::with_dialer(config, dialer).unwrap();
    let sessions = server.sessions().clone();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = server
        .router()
        .into_make_service_with_connect_info::<SocketAddr>();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    Bridge { addr, sessions }
}

/// Send `payload` as a binary message.
pub async fn send(client: &mut Client, payload: &'static [u8]) {
    client
        .send(Message::binary(payload))
        .await
        .expect("send failed");
}

/// Next binary payload, skipping control frames.
pub async fn recv_binary(client: &mut Client) -> Vec<u8> {
    loop {
        let message = tokio::time::timeout(STEP, client.next())
            .await
            .expect("no message from bridge")
            .expect("stream ended")
            .expect("websocket error");
        match message {
            Message::Binary(data) => return data.to_vec(),
            Message::Ping(_) | Message::Pong(_) => continue,
            other => panic!("unexpected message {other:?}"),
        }
    }
}

/// Wait until the bridge closes the client connection.
pub async fn expect_closed(client: &mut Client) {
    loop {
        match tokio::time::timeout(STEP, client.next())
            .await
            .expect("bridge did not close the client")
        {
            None | Some(Ok(Message::Close(_))) | Some(Err(_)) => return,
            Some(Ok(_)) => continue,
        }
    }
}

/// Wait until the bridge reports no live sessions.
pub async fn wait_idle(sessions: &SessionTracker) {
    let remaining = sessions.drain(STEP).await;
    assert_eq!(remaining, 0, "sessions still open");
}

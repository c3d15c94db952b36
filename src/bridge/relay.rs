//! Bidirectional relay between an upgraded WebSocket and a backend socket.
//!
//! # Responsibilities
//! - Copy client frames to the backend and backend bytes to the client
//! - Tear both streams down as soon as either direction ends
//! - Report bytes moved and how each direction ended
//!
//! # Data Flow
//! ```text
//!            spawned task                     request task
//! client rx ──────────────▶ backend wr   backend rd ──────────────▶ client tx
//!      │                        ▲              │                       ▲
//!      └──── Teardown::trigger ─┴── shared ────┴── Teardown::trigger ──┘
//! ```
//!
//! # Design Decisions
//! - The first direction to finish sets the `Teardown` signal; the other
//!   direction is selected against it, so a read that would never return is
//!   abandoned instead of leaked
//! - Each side is closed with a bounded grace period
//! - Payload bytes are never inspected or reframed

use std::time::{Duration, Instant};

use axum::body::Bytes;
use axum::extract::ws::Message;
use futures_util::{Sink, SinkExt, Stream, StreamExt};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, ReadHalf, WriteHalf};

use crate::bridge::teardown::{Direction, Teardown};
use crate::error::StreamError;

/// Default per-session transfer buffer; large enough for any UDP datagram.
pub const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;

/// Default time allowed for closing each side during teardown.
pub const DEFAULT_CLOSE_GRACE: Duration = Duration::from_secs(1);

/// How one relay direction stopped.
#[derive(Debug)]
pub enum DirectionEnd {
    /// Its source reached end-of-stream.
    Eof,
    /// The other direction finished first.
    Cancelled,
    /// A read or write failed.
    Failed(StreamError),
}

/// Result of one relay direction.
#[derive(Debug)]
pub struct DirectionOutcome {
    pub direction: Direction,
    pub bytes: u64,
    pub end: DirectionEnd,
}

/// Summary of a finished session.
#[derive(Debug)]
pub struct SessionReport {
    pub client_to_backend: DirectionOutcome,
    pub backend_to_client: DirectionOutcome,
    /// The direction whose completion started teardown.
    pub first_finished: Option<Direction>,
    pub duration: Duration,
}

impl SessionReport {
    /// Stream errors seen in either direction.
    pub fn errors(&self) -> impl Iterator<Item = &StreamError> {
        [&self.client_to_backend, &self.backend_to_client]
            .into_iter()
            .filter_map(|outcome| match &outcome.end {
                DirectionEnd::Failed(err) => Some(err),
                _ => None,
            })
    }
}

/// Relay settings shared by every session.
#[derive(Debug, Clone, Copy)]
pub struct Bridge {
    buffer_size: usize,
    close_grace: Duration,
}

impl Default for Bridge {
    fn default() -> Self {
        Self::new(DEFAULT_BUFFER_SIZE, DEFAULT_CLOSE_GRACE)
    }
}

impl Bridge {
    pub fn new(buffer_size: usize, close_grace: Duration) -> Self {
        Self {
            buffer_size: buffer_size.max(1),
            close_grace,
        }
    }

    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    /// Relay until either side ends, then close both and wait for the
    /// other direction to exit.
    ///
    /// The client→backend direction runs on a spawned task; backend→client
    /// runs on the caller's task.
    pub async fn run<R, W, B>(&self, client_rx: R, client_tx: W, backend: B) -> SessionReport
    where
        R: Stream<Item = Result<Message, axum::Error>> + Send + Unpin + 'static,
        W: Sink<Message, Error = axum::Error> + Send + Unpin + 'static,
        B: AsyncRead + AsyncWrite + Send + 'static,
    {
        let started = Instant::now();
        let (backend_rd, backend_wr) = tokio::io::split(backend);
        let teardown = Teardown::new();

        let upstream = tokio::spawn(client_to_backend(
            client_rx,
            backend_wr,
            teardown.clone(),
            self.close_grace,
        ));

        let backend_to_client = backend_to_client(
            backend_rd,
            client_tx,
            self.buffer_size,
            teardown.clone(),
            self.close_grace,
        )
        .await;

        let client_to_backend = match upstream.await {
            Ok(outcome) => outcome,
            Err(join_err) => DirectionOutcome {
                direction: Direction::ClientToBackend,
                bytes: 0,
                end: DirectionEnd::Failed(StreamError::Aborted(join_err.to_string())),
            },
        };

        SessionReport {
            client_to_backend,
            backend_to_client,
            first_finished: teardown.first(),
            duration: started.elapsed(),
        }
    }
}

async fn client_to_backend<R, B>(
    mut client_rx: R,
    mut backend_wr: WriteHalf<B>,
    teardown: Teardown,
    close_grace: Duration,
) -> DirectionOutcome
where
    R: Stream<Item = Result<Message, axum::Error>> + Unpin,
    B: AsyncWrite,
{
    let mut bytes = 0u64;
    let end = tokio::select! {
        res = pump_client_frames(&mut client_rx, &mut backend_wr, &mut bytes) => match res {
            Ok(()) => DirectionEnd::Eof,
            Err(e) => DirectionEnd::Failed(e),
        },
        _ = teardown.triggered() => DirectionEnd::Cancelled,
    };
    teardown.trigger(Direction::ClientToBackend);

    // Half-close the backend; the socket itself closes once both halves drop.
    let _ = tokio::time::timeout(close_grace, backend_wr.shutdown()).await;
    drop(client_rx);

    DirectionOutcome {
        direction: Direction::ClientToBackend,
        bytes,
        end,
    }
}

async fn pump_client_frames<R, B>(
    client_rx: &mut R,
    backend_wr: &mut WriteHalf<B>,
    bytes: &mut u64,
) -> Result<(), StreamError>
where
    R: Stream<Item = Result<Message, axum::Error>> + Unpin,
    B: AsyncWrite,
{
    while let Some(frame) = client_rx.next().await {
        let payload = match frame.map_err(StreamError::Client)? {
            Message::Binary(data) => data,
            Message::Text(text) => Bytes::copy_from_slice(text.as_str().as_bytes()),
            Message::Close(_) => return Ok(()),
            Message::Ping(_) | Message::Pong(_) => continue,
        };
        backend_wr
            .write_all(&payload)
            .await
            .map_err(StreamError::Backend)?;
        backend_wr.flush().await.map_err(StreamError::Backend)?;
        *bytes += payload.len() as u64;
    }
    Ok(())
}

async fn backend_to_client<B, W>(
    mut backend_rd: ReadHalf<B>,
    mut client_tx: W,
    buffer_size: usize,
    teardown: Teardown,
    close_grace: Duration,
) -> DirectionOutcome
where
    B: AsyncRead,
    W: Sink<Message, Error = axum::Error> + Unpin,
{
    let mut bytes = 0u64;
    let end = tokio::select! {
        res = pump_backend_bytes(&mut backend_rd, &mut client_tx, buffer_size, &mut bytes) => match res {
            Ok(()) => DirectionEnd::Eof,
            Err(e) => DirectionEnd::Failed(e),
        },
        _ = teardown.triggered() => DirectionEnd::Cancelled,
    };
    teardown.trigger(Direction::BackendToClient);

    // Sends a Close frame if the client has not already closed.
    let _ = tokio::time::timeout(close_grace, client_tx.close()).await;
    drop(backend_rd);

    DirectionOutcome {
        direction: Direction::BackendToClient,
        bytes,
        end,
    }
}

async fn pump_backend_bytes<B, W>(
    backend_rd: &mut ReadHalf<B>,
    client_tx: &mut W,
    buffer_size: usize,
    bytes: &mut u64,
) -> Result<(), StreamError>
where
    B: AsyncRead,
    W: Sink<Message, Error = axum::Error> + Unpin,
{
    let mut buf = vec![0u8; buffer_size];
    loop {
        let n = backend_rd.read(&mut buf).await.map_err(StreamError::Backend)?;
        if n == 0 {
            return Ok(());
        }
        client_tx
            .send(Message::Binary(Bytes::copy_from_slice(&buf[..n])))
            .await
            .map_err(StreamError::Client)?;
        *bytes += n as u64;
    }
}

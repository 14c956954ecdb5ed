//! Connection - supervises a single client connection.
//!
//! A connection owns one TCP stream split between two tokio tasks:
//!
//! ```text
//!                 outbound queue (Command)
//!   Connection ─────────────────────────────▶ Writer ──▶ socket (write half)
//!       ▲  │
//!       │  │ close signal (CancellationToken)
//!       │  └──────────────────────────────▶ Reader ◀── socket (read half)
//!       │                                     │
//!       └──── error funnel ◀──────────────────┴── (one error per worker)
//! ```
//!
//! The supervisor acts on the first error from the funnel and tears the
//! connection down in a fixed order: close the outbound queue, close the
//! transport, wait for both workers to acknowledge they stopped, then close
//! the funnel. Nothing is retried.

mod reader;
mod registration;
#[cfg(test)]
mod test_io;
mod writer;

pub use registration::{ConnectionConfig, DEFAULT_TIMEOUT, Identity};

use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{Instrument, debug, error, info, info_span, warn};

use crate::command::Command;
use crate::error::{ConnectionError, Result};
use crate::sink::LineSink;
use reader::Reader;
use writer::Writer;

/// Capacity of the outbound frame queue.
const OUTBOUND_QUEUE_SIZE: usize = 64;

/// One slot per worker: each posts at most one terminal error, so posting
/// never blocks even if the supervisor has stopped listening.
const ERROR_FUNNEL_SIZE: usize = 2;

/// A live, registered connection.
///
/// Created by [`Connection::connect`] and consumed by [`Connection::run`],
/// [`Connection::run_until`] or [`Connection::disconnect`]. A connection
/// cannot be reused once it is torn down; connect again for a fresh one.
///
/// Dropping a connection without disconnecting still closes the transport
/// and the queue, so both workers exit, but nothing waits for them.
#[must_use = "a connection that is dropped is closed without sending QUIT"]
pub struct Connection {
    identity: Identity,
    /// Never renegotiated: nick collisions are not handled.
    current_nick: String,
    timeout: Duration,
    peer: SocketAddr,
    outbound: mpsc::Sender<Command>,
    errors: mpsc::Receiver<ConnectionError>,
    transport: DropGuard,
    reader_stopped: oneshot::Receiver<()>,
    writer_stopped: oneshot::Receiver<()>,
}

impl Connection {
    /// Dial the server, start the reader and writer, and register.
    ///
    /// Inbound lines are handed to `sink` for the lifetime of the
    /// connection. Fails without touching the network if `server` or `nick`
    /// is missing.
    pub async fn connect<S: LineSink>(config: ConnectionConfig, sink: S) -> Result<Self> {
        let (identity, timeout) = config.resolve()?;

        let stream = TcpStream::connect(identity.server.as_str())
            .await
            .map_err(|source| ConnectionError::Dial {
                addr: identity.server.clone(),
                source,
            })?;
        let peer = stream.peer_addr().map_err(|source| ConnectionError::Dial {
            addr: identity.server.clone(),
            source,
        })?;
        if let Err(e) = stream.set_nodelay(true) {
            debug!(error = %e, "Failed to set TCP_NODELAY");
        }

        let (read_half, write_half) = stream.into_split();
        let connection = Self::start(identity, timeout, peer, read_half, write_half, sink);

        info!(
            server = %connection.identity.server,
            peer = %peer,
            nick = %connection.identity.nick,
            "Connected"
        );

        if let Err(e) = connection.register().await {
            return Err(connection.abort(e).await);
        }

        Ok(connection)
    }

    /// Spawn the writer and reader over the two halves of a transport.
    fn start<R, W, S>(
        identity: Identity,
        timeout: Duration,
        peer: SocketAddr,
        read_half: R,
        write_half: W,
        sink: S,
    ) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
        S: LineSink,
    {
        let (outbound_tx, outbound_rx) = mpsc::channel(OUTBOUND_QUEUE_SIZE);
        let (error_tx, error_rx) = mpsc::channel(ERROR_FUNNEL_SIZE);
        let (reader_tx, reader_rx) = oneshot::channel();
        let (writer_tx, writer_rx) = oneshot::channel();
        let closed = CancellationToken::new();

        let writer = Writer::new(write_half, outbound_rx, error_tx.clone(), closed.clone());
        tokio::spawn(
            writer
                .run(writer_tx)
                .instrument(info_span!("writer", peer = %peer)),
        );

        let reader = Reader::new(read_half, timeout, sink, error_tx, closed.clone());
        tokio::spawn(
            reader
                .run(reader_tx)
                .instrument(info_span!("reader", peer = %peer)),
        );

        Self {
            current_nick: identity.nick.clone(),
            identity,
            timeout,
            peer,
            outbound: outbound_tx,
            errors: error_rx,
            transport: closed.drop_guard(),
            reader_stopped: reader_rx,
            writer_stopped: writer_rx,
        }
    }

    /// Tear down a connection whose registration could not be queued.
    ///
    /// The queue only closes once the writer has stopped, and the writer
    /// posts its error before closing it, so the error it reported is
    /// returned in place of `queue_error` whenever there is one.
    async fn abort(mut self, queue_error: ConnectionError) -> ConnectionError {
        let cause = self.errors.try_recv().unwrap_or(queue_error);
        warn!(error = %cause, "Registration failed");
        self.disconnect(None).await;
        cause
    }

    /// Queue the registration handshake: `PASS` (if set), `NICK`, `USER`.
    async fn register(&self) -> Result<()> {
        for command in self.identity.registration() {
            self.send(command).await?;
        }
        debug!(nick = %self.identity.nick, "Registration queued");
        Ok(())
    }

    /// Queue a frame for the writer.
    ///
    /// Only usable between [`connect`](Self::connect) and the call that
    /// consumes the connection: [`run`](Self::run) and
    /// [`run_until`](Self::run_until) take ownership, so nothing can be
    /// queued while they wait.
    pub async fn send(&self, command: Command) -> Result<()> {
        self.outbound
            .send(command)
            .await
            .map_err(|_| ConnectionError::QueueClosed)
    }

    /// Block until a worker reports an error, then tear down.
    ///
    /// Only the first error is acted on; it is logged and returned after the
    /// connection has been fully disconnected.
    pub async fn run(mut self) -> Option<ConnectionError> {
        let first = self.errors.recv().await;
        self.fail(first).await
    }

    /// Like [`run`](Self::run), but also stop when `shutdown` completes.
    ///
    /// A shutdown disconnects with `reason` and returns `None`.
    pub async fn run_until<F>(mut self, shutdown: F, reason: Option<&str>) -> Option<ConnectionError>
    where
        F: Future<Output = ()>,
    {
        tokio::select! {
            first = self.errors.recv() => self.fail(first).await,
            () = shutdown => {
                info!(peer = %self.peer, "Shutdown requested");
                self.disconnect(reason).await;
                None
            }
        }
    }

    async fn fail(self, first: Option<ConnectionError>) -> Option<ConnectionError> {
        match &first {
            Some(e) => error!(
                peer = %self.peer,
                kind = e.kind(),
                error = %e,
                "Connection failed"
            ),
            None => warn!(peer = %self.peer, "Error funnel closed without an error"),
        }
        self.disconnect(None).await;
        first
    }

    /// Send a best-effort `QUIT` and tear the connection down.
    ///
    /// Returns once both workers have stopped.
    pub async fn disconnect(self, reason: Option<&str>) {
        let Self {
            identity,
            peer,
            outbound,
            mut errors,
            transport,
            reader_stopped,
            writer_stopped,
            ..
        } = self;

        // The connection is ending either way; a full or closed queue just
        // means the peer never sees the QUIT.
        if let Err(e) = outbound.try_send(Command::quit(reason)) {
            debug!(error = %e, "QUIT not queued");
        }

        // Writer sees end-of-stream once the QUIT (if queued) is written.
        drop(outbound);

        // Cancels the close signal: an in-flight read aborts.
        drop(transport);

        let (reader, writer) = tokio::join!(reader_stopped, writer_stopped);
        if reader.is_err() {
            warn!("Reader exited without acknowledging stop");
        }
        if writer.is_err() {
            warn!("Writer exited without acknowledging stop");
        }

        // Both workers are gone, so nothing can post after this.
        errors.close();
        while let Ok(e) = errors.try_recv() {
            debug!(error = %e, "Discarding error reported during teardown");
        }
        drop(errors);

        info!(server = %identity.server, peer = %peer, "Disconnected");
    }

    /// The identity registered with, defaults applied.
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// The nick in use. Always the configured nick.
    pub fn current_nick(&self) -> &str {
        &self.current_nick
    }

    /// Address of the connected server.
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    /// The liveness window after defaults.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

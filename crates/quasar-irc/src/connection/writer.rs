//! Writer worker: drains the outbound queue onto the socket.

use futures_util::SinkExt;
use tokio::io::AsyncWrite;
use tokio::sync::{mpsc, oneshot};
use tokio_util::codec::FramedWrite;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::command::Command;
use crate::error::{ConnectionError, ProtocolError};
use crate::line::LineCodec;

pub(super) struct Writer<W> {
    frames: FramedWrite<W, LineCodec>,
    queue: mpsc::Receiver<Command>,
    errors: mpsc::Sender<ConnectionError>,
    closed: CancellationToken,
}

impl<W: AsyncWrite + Unpin> Writer<W> {
    pub(super) fn new(
        half: W,
        queue: mpsc::Receiver<Command>,
        errors: mpsc::Sender<ConnectionError>,
        closed: CancellationToken,
    ) -> Self {
        Self {
            frames: FramedWrite::new(half, LineCodec::new()),
            queue,
            errors,
            closed,
        }
    }

    /// Write queued frames until the queue closes or a write fails, then
    /// acknowledge the stop.
    pub(super) async fn run(self, stopped: oneshot::Sender<()>) {
        let Self {
            mut frames,
            mut queue,
            errors,
            closed,
        } = self;

        let outcome = write_loop(&mut frames, &mut queue, &closed).await;

        // Dropping the write half sends FIN to the peer.
        drop(frames);

        match outcome {
            Ok(()) => debug!("Writer stopped: queue closed"),
            Err(e) => {
                warn!(error = %e, "Writer stopped on error");
                let _ = errors.send(ConnectionError::Write(e)).await;
            }
        }

        // Senders see the queue closed only after the error is posted.
        drop(queue);
        let _ = stopped.send(());
    }
}

async fn write_loop<W: AsyncWrite + Unpin>(
    frames: &mut FramedWrite<W, LineCodec>,
    queue: &mut mpsc::Receiver<Command>,
    closed: &CancellationToken,
) -> Result<(), ProtocolError> {
    loop {
        // `None` means every sender is gone: that, not the frame content, is
        // the shutdown signal. Queued frames win over the close signal, so
        // everything sent before the close is still delivered.
        let command = tokio::select! {
            biased;
            next = queue.recv() => match next {
                Some(command) => command,
                None => return Ok(()),
            },
            _ = closed.cancelled() => return Ok(()),
        };

        debug!(command = command.name(), "Sending frame");

        // The write is polled first so a writable socket always takes the
        // frame; the close signal only abandons a write stuck on the peer.
        tokio::select! {
            biased;
            res = frames.send(command) => res?,
            _ = closed.cancelled() => {
                debug!("Transport closed with a write in flight");
                return Ok(());
            }
        }
    }
}

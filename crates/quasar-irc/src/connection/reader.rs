//! Reader worker: deframes inbound lines and enforces the liveness window.

use std::time::Duration;

use futures_util::StreamExt;
use tokio::io::AsyncRead;
use tokio::sync::{mpsc, oneshot};
use tokio_util::codec::FramedRead;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::{ConnectionError, ReadError};
use crate::line::LineCodec;
use crate::sink::LineSink;

pub(super) struct Reader<R, S> {
    frames: FramedRead<R, LineCodec>,
    timeout: Duration,
    sink: S,
    errors: mpsc::Sender<ConnectionError>,
    closed: CancellationToken,
}

impl<R: AsyncRead + Unpin, S: LineSink> Reader<R, S> {
    pub(super) fn new(
        half: R,
        timeout: Duration,
        sink: S,
        errors: mpsc::Sender<ConnectionError>,
        closed: CancellationToken,
    ) -> Self {
        Self {
            frames: FramedRead::new(half, LineCodec::new()),
            timeout,
            sink,
            errors,
            closed,
        }
    }

    /// Read until the transport fails or is closed, then acknowledge the stop.
    pub(super) async fn run(self, stopped: oneshot::Sender<()>) {
        let Self {
            mut frames,
            timeout,
            mut sink,
            errors,
            closed,
        } = self;

        let outcome = read_loop(&mut frames, timeout, &mut sink, &closed).await;

        // Release the socket half and the sink before acknowledging.
        drop(frames);
        drop(sink);

        match outcome {
            Ok(()) => debug!("Reader stopped: transport closed"),
            Err(e) => {
                warn!(error = %e, "Reader stopped on error");
                // The funnel has a slot per worker, so this never waits.
                let _ = errors.send(ConnectionError::Read(e)).await;
            }
        }

        let _ = stopped.send(());
    }
}

async fn read_loop<R: AsyncRead + Unpin, S: LineSink>(
    frames: &mut FramedRead<R, LineCodec>,
    timeout: Duration,
    sink: &mut S,
    closed: &CancellationToken,
) -> Result<(), ReadError> {
    loop {
        // Every read gets a fresh deadline of now + timeout.
        let next = tokio::select! {
            biased;
            _ = closed.cancelled() => return Ok(()),
            next = tokio::time::timeout(timeout, frames.next()) => next,
        };

        match next {
            Ok(Some(Ok(line))) => {
                debug!(raw = %line, "Received frame");
                sink.deliver(line);
            }
            Ok(Some(Err(e))) => return Err(ReadError::Transport(e)),
            Ok(None) => return Err(ReadError::Closed),
            Err(_elapsed) => return Err(ReadError::TimedOut(timeout)),
        }
    }
}

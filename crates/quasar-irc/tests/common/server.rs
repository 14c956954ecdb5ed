//! Fake IRC server.
//!
//! Listens on an ephemeral local port and exposes each accepted socket as a
//! [`TestPeer`] that reads and writes raw lines.

use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpListener;
use tokio::time::timeout;

/// How long a test waits for anything before giving up.
pub const WAIT: Duration = Duration::from_secs(5);

/// A listening fake server.
pub struct TestServer {
    listener: TcpListener,
}

impl TestServer {
    /// Bind to a random local port.
    pub async fn bind() -> anyhow::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        Ok(Self { listener })
    }

    /// Address to hand to the client as `host:port`.
    pub fn address(&self) -> String {
        self.listener
            .local_addr()
            .map(|addr| addr.to_string())
            .unwrap_or_default()
    }

    /// Accept the next client connection.
    pub async fn accept(&self) -> anyhow::Result<TestPeer> {
        let (stream, _) = timeout(WAIT, self.listener.accept()).await??;
        let (read_half, write_half) = stream.into_split();
        Ok(TestPeer {
            reader: BufReader::new(read_half),
            writer: write_half,
        })
    }

    /// Returns true if no client connects within `dur`.
    #[allow(dead_code)]
    pub async fn stays_idle(&self, dur: Duration) -> bool {
        timeout(dur, self.listener.accept()).await.is_err()
    }
}

/// The server's side of one accepted connection.
pub struct TestPeer {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl TestPeer {
    /// Read one raw line, terminator included.
    pub async fn recv_line(&mut self) -> anyhow::Result<String> {
        let mut line = String::new();
        let n = timeout(WAIT, self.reader.read_line(&mut line)).await??;
        if n == 0 {
            anyhow::bail!("client closed the connection");
        }
        Ok(line)
    }

    /// Read `count` raw lines.
    #[allow(dead_code)]
    pub async fn recv_lines(&mut self, count: usize) -> anyhow::Result<Vec<String>> {
        let mut lines = Vec::with_capacity(count);
        for _ in 0..count {
            lines.push(self.recv_line().await?);
        }
        Ok(lines)
    }

    /// Send raw bytes exactly as given.
    #[allow(dead_code)]
    pub async fn send_raw(&mut self, data: &str) -> anyhow::Result<()> {
        self.writer.write_all(data.as_bytes()).await?;
        self.writer.flush().await?;
        Ok(())
    }

    /// Wait for the client to close its side, returning any lines that
    /// arrived first.
    #[allow(dead_code)]
    pub async fn recv_until_eof(&mut self) -> anyhow::Result<Vec<String>> {
        let mut lines = Vec::new();
        loop {
            let mut line = String::new();
            let n = timeout(WAIT, self.reader.read_line(&mut line)).await??;
            if n == 0 {
                return Ok(lines);
            }
            lines.push(line);
        }
    }
}

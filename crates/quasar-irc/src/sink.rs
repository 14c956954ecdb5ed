//! Consumption boundary for inbound lines.
//!
//! The reader hands every decoded line to a [`LineSink`] supplied when the
//! connection is created. Interpreting the lines is the sink's business.

use tokio::sync::mpsc;
use tracing::info;

/// Receives decoded inbound lines, terminator already stripped.
///
/// Called from the reader task, so implementations must not block.
pub trait LineSink: Send + 'static {
    /// Take one inbound line.
    fn deliver(&mut self, line: String);
}

/// Logs every inbound line at `info` level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl LineSink for TracingSink {
    fn deliver(&mut self, line: String) {
        info!(target: "quasar_irc::inbound", "{}", line);
    }
}

/// Forwards lines to a channel. Lines are dropped once the receiver is gone.
impl LineSink for mpsc::UnboundedSender<String> {
    fn deliver(&mut self, line: String) {
        let _ = self.send(line);
    }
}

impl LineSink for Box<dyn LineSink> {
    fn deliver(&mut self, line: String) {
        (**self).deliver(line)
    }
}

//! Error types for the connection core.
//!
//! [`ProtocolError`] covers framing failures raised by the line codec.
//! [`ConnectionError`] is what the supervisor and its workers report; every
//! failure of a live connection reaches the owner as one of its variants.

use std::io;
use std::time::Duration;

use thiserror::Error;

/// Convenience type alias for Results using [`ConnectionError`].
pub type Result<T, E = ConnectionError> = std::result::Result<T, E>;

/// Framing errors raised by [`LineCodec`](crate::line::LineCodec).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProtocolError {
    /// I/O error during reading or writing.
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// A line exceeded the maximum allowed length.
    #[error("line too long: {actual} bytes (limit: {limit})")]
    LineTooLong {
        /// Bytes buffered when the limit was hit.
        actual: usize,
        /// Maximum allowed length.
        limit: usize,
    },
}

/// A required identity field was missing or malformed.
///
/// Raised by [`Connection::connect`](crate::Connection::connect) before any
/// network I/O is attempted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// No server address was given.
    #[error("server address is empty")]
    EmptyServer,

    /// No nick was given.
    #[error("nick is empty")]
    EmptyNick,

    /// The character would split or corrupt a registration frame.
    #[error("{field} contains illegal character {ch:?}")]
    IllegalCharacter {
        /// Name of the offending field.
        field: &'static str,
        /// The first illegal character found.
        ch: char,
    },
}

/// Failures of the reader worker.
#[derive(Debug, Error)]
pub enum ReadError {
    /// No frame arrived within the liveness window.
    #[error("no data received for {0:?}")]
    TimedOut(Duration),

    /// The peer closed its side of the stream.
    #[error("connection closed by peer")]
    Closed,

    /// Framing or socket failure while reading.
    #[error(transparent)]
    Transport(#[from] ProtocolError),
}

/// Errors surfaced by a [`Connection`](crate::Connection).
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// The configuration was rejected before dialing.
    #[error("invalid configuration: {0}")]
    Validation(#[from] ValidationError),

    /// The TCP connection could not be established.
    #[error("failed to connect to {addr}: {source}")]
    Dial {
        /// Address as configured.
        addr: String,
        /// Underlying socket error.
        #[source]
        source: io::Error,
    },

    /// The reader worker stopped.
    #[error("read failed: {0}")]
    Read(#[from] ReadError),

    /// The writer worker could not put a frame on the wire.
    #[error("write failed: {0}")]
    Write(#[source] ProtocolError),

    /// The writer has stopped and no longer accepts frames.
    #[error("outbound queue closed")]
    QueueClosed,
}

impl ConnectionError {
    /// Static label for log fields.
    #[inline]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Dial { .. } => "dial",
            Self::Read(ReadError::TimedOut(_)) => "read_timeout",
            Self::Read(_) => "read",
            Self::Write(_) => "write",
            Self::QueueClosed => "queue_closed",
        }
    }

    /// Whether the error came from the read or write worker of a live
    /// connection, as opposed to connection setup.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Read(_) | Self::Write(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_error_conversion() {
        let err: ConnectionError = ReadError::TimedOut(Duration::from_secs(300)).into();
        assert_eq!(err.kind(), "read_timeout");
        assert!(err.is_transport());
        assert_eq!(err.to_string(), "read failed: no data received for 300s");
    }

    #[test]
    fn test_validation_display() {
        let err: ConnectionError = ValidationError::EmptyNick.into();
        assert_eq!(err.kind(), "validation");
        assert!(!err.is_transport());
        assert_eq!(err.to_string(), "invalid configuration: nick is empty");

        let err = ValidationError::IllegalCharacter {
            field: "nick",
            ch: ' ',
        };
        assert_eq!(err.to_string(), "nick contains illegal character ' '");
    }

    #[test]
    fn test_error_source_chaining() {
        let io_err = io::Error::new(io::ErrorKind::ConnectionRefused, "connection refused");
        let err = ConnectionError::Dial {
            addr: "127.0.0.1:1".to_string(),
            source: io_err,
        };

        let source = std::error::Error::source(&err);
        assert!(source.is_some());
        assert_eq!(source.unwrap().to_string(), "connection refused");
        assert_eq!(
            err.to_string(),
            "failed to connect to 127.0.0.1:1: connection refused"
        );
    }

    #[test]
    fn test_protocol_error_through_read() {
        let err: ReadError = ProtocolError::LineTooLong {
            actual: 9000,
            limit: 8703,
        }
        .into();
        assert_eq!(err.to_string(), "line too long: 9000 bytes (limit: 8703)");
    }
}

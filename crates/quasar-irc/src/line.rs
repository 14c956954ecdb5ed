//! Line-based codec for tokio.
//!
//! Inbound, the codec splits the byte stream on LF and yields each line with
//! its CRLF terminator removed. Outbound, it renders a [`Command`] and
//! terminates it with CRLF.

use bytes::{BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::command::Command;
use crate::error::ProtocolError;

/// Maximum inbound line length: the IRCv3 tag allowance (8191 bytes) plus
/// the classic 512-byte message body.
pub const MAX_LINE_LEN: usize = 8191 + 512;

/// Codec for CRLF-terminated lines.
pub struct LineCodec {
    /// Index of next byte to check for newline
    next_index: usize,
    /// Maximum line length
    max_len: usize,
}

impl LineCodec {
    /// Create a codec with the default [`MAX_LINE_LEN`] limit.
    pub fn new() -> Self {
        Self::with_max_len(MAX_LINE_LEN)
    }

    /// Create a codec with a custom max line length.
    pub fn with_max_len(max_len: usize) -> Self {
        Self {
            next_index: 0,
            max_len,
        }
    }

    /// Cut a rendered frame at its first line break so that caller-supplied
    /// text can never smuggle a second frame onto the wire.
    pub fn sanitize(mut data: String) -> String {
        if let Some(pos) = data.find(['\r', '\n']) {
            data.truncate(pos);
        }
        data
    }
}

impl Default for LineCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for LineCodec {
    type Item = String;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<String>, ProtocolError> {
        // Look for newline starting from where we left off
        if let Some(offset) = src[self.next_index..].iter().position(|b| *b == b'\n') {
            let line = src.split_to(self.next_index + offset + 1);
            self.next_index = 0;

            if line.len() > self.max_len {
                return Err(ProtocolError::LineTooLong {
                    actual: line.len(),
                    limit: self.max_len,
                });
            }

            let mut body = &line[..line.len() - 1];
            if let Some(stripped) = body.strip_suffix(b"\r") {
                body = stripped;
            }

            Ok(Some(String::from_utf8_lossy(body).into_owned()))
        } else {
            // No complete line yet - remember where we stopped
            self.next_index = src.len();

            if src.len() > self.max_len {
                return Err(ProtocolError::LineTooLong {
                    actual: src.len(),
                    limit: self.max_len,
                });
            }

            Ok(None)
        }
    }
}

impl Encoder<Command> for LineCodec {
    type Error = ProtocolError;

    fn encode(&mut self, command: Command, dst: &mut BytesMut) -> Result<(), ProtocolError> {
        let frame = Self::sanitize(command.to_string());
        dst.reserve(frame.len() + 2);
        dst.put_slice(frame.as_bytes());
        dst.put_slice(b"\r\n");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_complete_line() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::from("PING :server\r\n");

        let result = codec.decode(&mut buf).unwrap();
        assert_eq!(result, Some("PING :server".to_string()));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_decode_partial_line() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::from("PING :");

        assert_eq!(codec.decode(&mut buf).unwrap(), None);

        buf.extend_from_slice(b"server\r\nNOTICE");
        assert_eq!(
            codec.decode(&mut buf).unwrap(),
            Some("PING :server".to_string())
        );
        assert_eq!(codec.decode(&mut buf).unwrap(), None);
        assert_eq!(&buf[..], b"NOTICE");
    }

    #[test]
    fn test_decode_bare_lf() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::from(":irc.example.net 001 quasar :Welcome\n");

        assert_eq!(
            codec.decode(&mut buf).unwrap(),
            Some(":irc.example.net 001 quasar :Welcome".to_string())
        );
    }

    #[test]
    fn test_decode_invalid_utf8_is_lossy() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::from(&b"PRIVMSG #c :caf\xe9\r\n"[..]);

        let line = codec.decode(&mut buf).unwrap().unwrap();
        assert_eq!(line, "PRIVMSG #c :caf\u{fffd}");
    }

    #[test]
    fn test_decode_too_long() {
        let mut codec = LineCodec::with_max_len(10);
        let mut buf = BytesMut::from("this is way too long\n");

        let result = codec.decode(&mut buf);
        assert!(matches!(result, Err(ProtocolError::LineTooLong { .. })));
    }

    #[test]
    fn test_decode_partial_too_long() {
        let mut codec = LineCodec::with_max_len(10);
        let mut buf = BytesMut::from("no newline in sight");

        let result = codec.decode(&mut buf);
        assert!(matches!(
            result,
            Err(ProtocolError::LineTooLong {
                actual: 19,
                limit: 10
            })
        ));
    }

    #[test]
    fn test_encode() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::new();

        codec
            .encode(Command::Nick("quasar".to_string()), &mut buf)
            .unwrap();
        codec.encode(Command::Quit(None), &mut buf).unwrap();
        assert_eq!(&buf[..], b"NICK quasar\r\nQUIT\r\n");
    }

    #[test]
    fn test_encode_truncates_injected_frame() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::new();

        codec
            .encode(
                Command::Quit(Some("bye\r\nPRIVMSG #x :oops".to_string())),
                &mut buf,
            )
            .unwrap();
        assert_eq!(&buf[..], b"QUIT :bye\r\n");
    }
}

//! # quasar-irc
//!
//! Client-side connection core for IRC: dials a server, registers an
//! identity, runs a reader and a writer task over the socket, detects loss
//! of liveness and tears everything down in order on the first failure.
//!
//! Protocol semantics beyond registration are left to the embedder: inbound
//! lines are handed, terminator stripped, to a [`LineSink`].
//!
//! ```rust,no_run
//! use quasar_irc::{Connection, ConnectionConfig, TracingSink};
//!
//! # async fn example() -> Result<(), quasar_irc::ConnectionError> {
//! let config = ConnectionConfig::new("irc.libera.chat:6667", "quasar");
//! let connection = Connection::connect(config, TracingSink).await?;
//!
//! // Blocks until the server goes quiet or the socket fails.
//! if let Some(e) = connection.run().await {
//!     eprintln!("connection ended: {e}");
//! }
//! # Ok(())
//! # }
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod command;
pub mod connection;
pub mod error;
pub mod line;
pub mod sink;

pub use self::command::{Command, MODE_INVISIBLE, MODE_VISIBLE};
pub use self::connection::{Connection, ConnectionConfig, DEFAULT_TIMEOUT, Identity};
pub use self::error::{ConnectionError, ProtocolError, ReadError, ValidationError};
pub use self::line::{LineCodec, MAX_LINE_LEN};
pub use self::sink::{LineSink, TracingSink};

//! Outbound frames.
//!
//! The core only ever originates registration and quit frames; anything else
//! an embedding application wants on the wire goes out as [`Command::Raw`].

use std::fmt;

/// User mode flag for a visible client (RFC 2812 section 3.1.3).
pub const MODE_VISIBLE: u8 = 0;
/// User mode flag requesting `+i`.
pub const MODE_INVISIBLE: u8 = 8;

/// A single outbound frame, rendered without its CRLF terminator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `PASS <password>`
    Pass(String),
    /// `NICK <nick>`
    Nick(String),
    /// `USER <user> <mode> * :<realname>`
    User {
        /// Username (ident).
        user: String,
        /// Mode bitmask, [`MODE_VISIBLE`] or [`MODE_INVISIBLE`].
        mode: u8,
        /// Free-form real name, sent as the trailing parameter.
        realname: String,
    },
    /// `QUIT` or `QUIT :<reason>`
    Quit(Option<String>),
    /// A pre-formatted frame, written verbatim.
    Raw(String),
}

impl Command {
    /// Build a quit frame, treating an empty reason as none.
    pub fn quit(reason: Option<&str>) -> Self {
        Self::Quit(reason.filter(|r| !r.is_empty()).map(str::to_owned))
    }

    /// The frame's command word, for logging.
    pub fn name(&self) -> &str {
        match self {
            Self::Pass(_) => "PASS",
            Self::Nick(_) => "NICK",
            Self::User { .. } => "USER",
            Self::Quit(_) => "QUIT",
            Self::Raw(line) => line.split(' ').next().unwrap_or(""),
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pass(password) => write!(f, "PASS {}", password),
            Self::Nick(nick) => write!(f, "NICK {}", nick),
            Self::User {
                user,
                mode,
                realname,
            } => write!(f, "USER {} {} * :{}", user, mode, realname),
            Self::Quit(Some(reason)) => write!(f, "QUIT :{}", reason),
            Self::Quit(None) => f.write_str("QUIT"),
            Self::Raw(line) => f.write_str(line),
        }
    }
}

//! Identity resolution and the registration handshake.

use std::time::Duration;

use crate::command::{Command, MODE_VISIBLE};
use crate::error::ValidationError;

/// Liveness window applied when the configuration leaves it at zero.
/// Most servers send a PING every three to four minutes.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5 * 60);

/// Connection settings supplied by the embedding application.
///
/// Only `server` and `nick` are required. Empty strings and a zero timeout
/// mean "use the default" and are resolved by
/// [`Connection::connect`](super::Connection::connect).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// Server address as `host:port`.
    pub server: String,
    /// Sent as `PASS` when non-empty. Must not contain spaces.
    pub password: String,
    /// Nickname to register. Required.
    pub nick: String,
    /// Defaults to the nick.
    pub user: String,
    /// [`MODE_VISIBLE`] or [`MODE_INVISIBLE`](crate::MODE_INVISIBLE).
    pub mode: u8,
    /// Defaults to the nick.
    pub realname: String,
    /// Maximum silence from the server before the connection is declared
    /// dead. Defaults to [`DEFAULT_TIMEOUT`].
    pub timeout: Duration,
}

impl ConnectionConfig {
    /// Settings with only the required fields filled in.
    pub fn new(server: impl Into<String>, nick: impl Into<String>) -> Self {
        Self {
            server: server.into(),
            nick: nick.into(),
            mode: MODE_VISIBLE,
            ..Default::default()
        }
    }

    /// Validate required fields and apply defaults.
    pub(crate) fn resolve(self) -> Result<(Identity, Duration), ValidationError> {
        if self.server.is_empty() {
            return Err(ValidationError::EmptyServer);
        }
        if self.nick.is_empty() {
            return Err(ValidationError::EmptyNick);
        }

        check_field("server", &self.server, false)?;
        check_field("nick", &self.nick, false)?;
        check_field("user", &self.user, false)?;
        check_field("password", &self.password, false)?;
        check_field("realname", &self.realname, true)?;

        let user = if self.user.is_empty() {
            self.nick.clone()
        } else {
            self.user
        };
        let realname = if self.realname.is_empty() {
            self.nick.clone()
        } else {
            self.realname
        };
        let timeout = if self.timeout.is_zero() {
            DEFAULT_TIMEOUT
        } else {
            self.timeout
        };
        let password = Some(self.password).filter(|p| !p.is_empty());

        Ok((
            Identity {
                server: self.server,
                password,
                nick: self.nick,
                user,
                mode: self.mode,
                realname,
            },
            timeout,
        ))
    }
}

/// Reject characters that would break a frame apart.
fn check_field(field: &'static str, value: &str, allow_space: bool) -> Result<(), ValidationError> {
    match value
        .chars()
        .find(|&ch| matches!(ch, '\r' | '\n' | '\0') || (ch == ' ' && !allow_space))
    {
        Some(ch) => Err(ValidationError::IllegalCharacter { field, ch }),
        None => Ok(()),
    }
}

/// The identity a connection registers with, defaults applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    /// Server address as `host:port`.
    pub server: String,
    /// `PASS` argument, if one is sent.
    pub password: Option<String>,
    /// Registered nickname.
    pub nick: String,
    /// Username sent in `USER`.
    pub user: String,
    /// Mode bitmask sent in `USER`.
    pub mode: u8,
    /// Real name sent in `USER`.
    pub realname: String,
}

impl Identity {
    /// Registration frames in the order the server expects them:
    /// `PASS` (if any), `NICK`, `USER`.
    pub fn registration(&self) -> Vec<Command> {
        let mut frames = Vec::with_capacity(3);
        if let Some(password) = &self.password {
            frames.push(Command::Pass(password.clone()));
        }
        frames.push(Command::Nick(self.nick.clone()));
        frames.push(Command::User {
            user: self.user.clone(),
            mode: self.mode,
            realname: self.realname.clone(),
        });
        frames
    }
}

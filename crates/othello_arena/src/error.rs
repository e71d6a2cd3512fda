//! Error types for the match server, the wire codec and configuration.

use derive_more::{Display, Error};
use tracing::instrument;

/// A request that violates the current state of a connection or session.
///
/// Every variant is reported to the requesting peer as an `ERROR` line and is
/// never fatal for the connection.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
pub enum MatchError {
    /// The connection has not claimed a name yet.
    #[display("You must log in first")]
    NotLoggedIn,

    /// Another connection already holds the requested name.
    #[display("Name {} is already taken", _0)]
    NameTaken(#[error(not(source))] String),

    /// The requested name is empty or contains framing characters.
    #[display("Invalid name: {}", _0)]
    IllegalName(#[error(not(source))] String),

    /// This connection already holds a name.
    #[display("Already logged in as {}", _0)]
    AlreadyLoggedIn(#[error(not(source))] String),

    /// The connection is already playing.
    #[display("Already in a game")]
    AlreadyInSession,

    /// The connection is not playing.
    #[display("No active game")]
    NoActiveSession,

    /// The other participant is to move.
    #[display("Not your turn")]
    WrongTurn,

    /// Neither a legal placement nor a legitimate pass.
    #[display("Illegal move: {}", _0)]
    IllegalMove(#[error(not(source))] String),

    /// The connection is not registered with the server.
    #[display("Unknown connection")]
    UnknownConnection,
}

/// How the connection should react to a protocol violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum ProtocolErrorKind {
    /// Report the problem and keep reading.
    Malformed,
    /// Report the problem and close the connection.
    UnknownCommand,
}

/// A line that could not be decoded, with location tracking.
#[derive(Debug, Clone, PartialEq, Eq, Display, Error)]
#[display("Protocol error ({}): {} at {}:{}", kind, message, file, line)]
pub struct ProtocolError {
    /// Whether the connection survives this error.
    pub kind: ProtocolErrorKind,
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ProtocolError {
    /// A well-known command with bad arguments, or one sent in the wrong direction.
    #[track_caller]
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::with_kind(ProtocolErrorKind::Malformed, message)
    }

    /// A keyword this protocol does not know.
    #[track_caller]
    pub fn unknown_command(message: impl Into<String>) -> Self {
        Self::with_kind(ProtocolErrorKind::UnknownCommand, message)
    }

    #[track_caller]
    fn with_kind(kind: ProtocolErrorKind, message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            kind,
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }

    /// True when the connection must be closed after reporting.
    pub fn is_fatal(&self) -> bool {
        self.kind == ProtocolErrorKind::UnknownCommand
    }
}

/// Configuration error with location tracking.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new config error with caller location tracking.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }
}

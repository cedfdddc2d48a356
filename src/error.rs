//! Error taxonomy and server diagnostics (spec §4.10, §7).

use std::fmt;
use std::io;

/// A specialized `Result` for this crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Diagnostics accompanying an operation. A successful call leaves this empty.
///
/// The server-origin message is preserved verbatim and never interpreted, per spec §7.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Diagnostics {
    /// `true` if `message` originated from the server (an Err packet), as opposed to
    /// being synthesized locally by this crate.
    pub server_origin: bool,
    pub message: String,
}

impl Diagnostics {
    pub fn empty() -> Self {
        Self::default()
    }

    pub(crate) fn local(message: impl Into<String>) -> Self {
        Diagnostics {
            server_origin: false,
            message: message.into(),
        }
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// An error returned by the MySQL/MariaDB server itself (an Err packet), carrying the
/// numeric error code and the 5-character SQLSTATE (spec §6 Err packet, §7 `server-error`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MySqlDatabaseError {
    pub code: u16,
    pub sql_state: Box<str>,
    pub message: Box<str>,
}

impl fmt::Display for MySqlDatabaseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.code, self.sql_state, self.message)
    }
}

impl std::error::Error for MySqlDatabaseError {}

impl MySqlDatabaseError {
    pub fn diagnostics(&self) -> Diagnostics {
        Diagnostics {
            server_origin: true,
            message: self.message.to_string(),
        }
    }
}

/// Every way an operation in this crate can fail (spec §7).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The server returned an Err packet.
    #[error("server error: {0}")]
    Server(#[from] MySqlDatabaseError),

    /// Transport I/O failure. Poisons the connection.
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    /// A decoder ran off the end of a packet. Poisons the connection.
    #[error("incomplete message: {0}")]
    IncompleteMessage(String),

    /// A decoder left trailing bytes after consuming a well-formed value. Poisons the
    /// connection.
    #[error("extra bytes after decoding {what}: {remaining} byte(s) left over")]
    ExtraBytes { what: &'static str, remaining: usize },

    /// A frame or field was well-formed but held an invalid value. Poisons the connection.
    #[error("protocol value error: {0}")]
    ProtocolValueError(String),

    /// A frame's sequence number did not continue the prior one. Poisons the connection.
    #[error("sequence number mismatch: expected {expected}, got {actual}")]
    SequenceMismatch { expected: u8, actual: u8 },

    /// The server lacks a mandatory capability (spec §3 Capability set). Surfaced at connect.
    #[error("server is missing a mandatory capability: {0}")]
    ServerUnsupported(&'static str),

    /// TLS was required (`SslMode::Require`) but the server does not advertise SSL.
    #[error("TLS was required but the server does not support it")]
    ServerDoesntSupportSsl,

    /// A cleartext auth-plugin challenge arrived without TLS active.
    #[error("auth plugin requires an active TLS session")]
    AuthPluginRequiresSsl,

    /// The server named an authentication plugin this crate does not implement.
    #[error("unknown authentication plugin: {0}")]
    UnknownAuthPlugin(String),

    /// A frame or the aggregate message exceeded the configured maximum buffer size.
    #[error("message of {size} bytes exceeds the maximum buffer size of {max} bytes")]
    MaxBufferSizeExceeded { size: usize, max: usize },

    /// A statically-typed row target didn't match the resultset's metadata (spec §4.6).
    #[error("metadata check failed: {0}")]
    MetadataCheckFailed(String),

    /// A static multi-resultset interface got a different number of resultsets than declared.
    #[error("expected {expected} resultset(s), server produced {actual}")]
    NumResultsetsMismatch { expected: usize, actual: usize },

    /// A typed row accessor found `NULL` in a non-`Option` target field.
    #[error("column {0} is NULL")]
    IsNull(usize),

    /// A field's bytes could not be converted to the requested Rust type.
    #[error("failed to parse column {index} ({mysql_type}) as the requested type: {cause}")]
    StaticRowParsingError {
        index: usize,
        mysql_type: String,
        cause: String,
    },

    /// A second operation was issued on a connection before the first completed.
    #[error("a previous operation is still in progress on this connection")]
    OperationInProgress,

    /// A cancellation was delivered while an operation was in flight. Poisons the connection.
    #[error("operation was cancelled")]
    OperationCancelled,

    /// The connection's current character set could not be resolved from the collation table.
    #[error("current character set is unknown")]
    UnknownCharacterSet,

    /// Pool acquisition timed out waiting for a slot.
    #[error("no connection became available before the timeout elapsed")]
    NoConnectionAvailable,

    /// The pool has been cancelled/shut down.
    #[error("the connection pool has been shut down")]
    PoolCancelled,

    /// A connect-string or option value could not be parsed.
    #[error("invalid connection options: {0}")]
    Options(String),

    /// Error raised by the pluggable TLS engine during handshake or shutdown.
    #[error("TLS error: {0}")]
    Tls(#[source] Box<dyn std::error::Error + Send + Sync + 'static>),
}

impl Error {
    /// Whether this error, per spec §7's recovery policy, poisons the owning connection.
    pub fn poisons_connection(&self) -> bool {
        !matches!(
            self,
            Error::Server(_)
                | Error::MetadataCheckFailed(_)
                | Error::NumResultsetsMismatch { .. }
                | Error::IsNull(_)
                | Error::StaticRowParsingError { .. }
                | Error::OperationInProgress
                | Error::UnknownCharacterSet
                | Error::NoConnectionAvailable
                | Error::PoolCancelled
                | Error::Options(_)
        )
    }

    /// The diagnostics paired with this error, per spec §4.10 `(error, diagnostics)`.
    pub fn diagnostics(&self) -> Diagnostics {
        match self {
            Error::Server(db) => db.diagnostics(),
            other => Diagnostics::local(other.to_string()),
        }
    }

    pub(crate) fn url(err: url::ParseError) -> Self {
        Error::Options(err.to_string())
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::url(err)
    }
}

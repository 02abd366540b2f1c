//! Error types for the IRC client engine.
//!
//! Two severities are modelled separately:
//!
//! - [`ProtocolError`] covers failures that abort an operation (no reachable
//!   address, a socket error, a send that never completed).
//! - [`Anomaly`] covers malformed-but-tolerable input. Anomalies never abort
//!   decoding or encoding; they travel alongside the best-effort result so the
//!   caller decides how loudly to complain.

use thiserror::Error;

/// Convenience type alias for Results using [`ProtocolError`].
pub type Result<T, E = ProtocolError> = std::result::Result<T, E>;

/// Fatal or I/O level errors.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProtocolError {
    /// I/O error during reading or writing.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The server address could not be resolved.
    #[error("unable to resolve {host}:{port}")]
    Resolve {
        /// Host that failed to resolve.
        host: String,
        /// Port that was requested.
        port: u16,
        /// The resolver error.
        #[source]
        source: std::io::Error,
    },

    /// None of the resolved addresses accepted a connection.
    #[error("unable to connect to {host}:{port}")]
    ConnectionFailed {
        /// Host that was dialled.
        host: String,
        /// Port that was dialled.
        port: u16,
        /// The error from the last candidate address tried.
        #[source]
        source: std::io::Error,
    },

    /// An operation needed an open connection but there was none.
    #[error("not connected")]
    NotConnected,

    /// A write kept timing out until the retry policy gave up.
    #[error("send timed out after {attempts} attempts")]
    SendTimedOut {
        /// Number of write attempts made.
        attempts: u32,
    },

    /// A `host[:port]` string could not be understood.
    #[error("invalid server address: {0}")]
    InvalidAddress(String),

    /// The configured wire encoding label is unknown.
    #[error("unknown encoding: {0}")]
    UnknownEncoding(String),
}

/// Malformed-but-tolerable conditions found while decoding or encoding.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum Anomaly {
    /// The line was empty; no message was produced.
    #[error("empty message")]
    EmptyMessage,

    /// The line had no command token.
    #[error("no command")]
    MissingCommand,

    /// The line had no `:`-marked trailing parameter.
    #[error("no trailing parameter")]
    MissingTrailing,

    /// The encoded line was longer than the wire limit and was truncated.
    #[error("message length is {length}, truncating to {limit}")]
    MessageTooLong {
        /// Length in bytes before truncation.
        length: usize,
        /// The limit it was truncated to.
        limit: usize,
    },

    /// The peer closed the stream in the middle of a line.
    #[error("no line terminator in buffer")]
    MissingLineTerminator,
}

//! Error types for the XBee driver.
//!
//! All fallible operations across the workspace return [`Result<T>`], which
//! uses [`Error`] as the error type. Transport-layer, protocol-layer, and
//! caller errors are all captured here.
//!
//! Note that an AT command the radio rejects is *not* an [`Error`]: the
//! rejection is a normal reply and is reported through the reply type of
//! the request operation.

/// The error type for all XBee driver operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A transport-level error (serial port open failure, device vanished).
    #[error("transport error: {0}")]
    Transport(String),

    /// A protocol-level error (short payload, undecodable field).
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Timed out waiting for data.
    ///
    /// Transports return this from `receive()` when no bytes arrive before
    /// the deadline. Request operations only return it when a request
    /// timeout has been configured explicitly.
    #[error("timeout waiting for response")]
    Timeout,

    /// An invalid parameter was passed by the caller.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// The IO task is not running, so the request could not be issued.
    #[error("not connected")]
    NotConnected,

    /// The connection to the radio was lost while the request was pending.
    #[error("connection lost")]
    ConnectionLost,

    /// An underlying I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A convenience `Result` alias using [`Error`] as the error type.
pub type Result<T> = std::result::Result<T, Error>;

//! Asynchronous radio event types.
//!
//! Everything the IO task sees that is not the answer to a pending request
//! is published through a [`tokio::sync::broadcast`] channel: unsolicited
//! packets (modem status, received data, node identification) and
//! decode-time anomalies that are absorbed rather than returned to a caller.

use crate::packet::Packet;

/// An event emitted by the IO task.
///
/// Subscribe via [`XBeeRadio::subscribe()`](crate::radio::XBeeRadio::subscribe).
/// Delivery is best-effort: slow consumers of the bounded broadcast channel
/// may miss events.
#[derive(Debug, Clone, PartialEq)]
pub enum XBeeEvent {
    /// A decoded packet that did not answer a pending request.
    Packet(Packet),

    /// A complete frame failed its checksum and was dropped.
    ChecksumMismatch {
        expected: u8,
        actual: u8,
        /// Envelope length that was discarded.
        length: usize,
    },

    /// An AT response named a frame ID with no outstanding request.
    UnexpectedResponse {
        frame_id: u8,
    },

    /// Bytes before a start delimiter were skipped to resynchronise.
    Discarded {
        bytes: usize,
    },

    /// A checksum-valid payload the packet decoder rejected.
    DecodeFailed {
        frame_type: Option<u8>,
        reason: String,
    },

    /// The transport failed. The IO task has stopped and all pending
    /// requests were resolved with a connection-lost error.
    Disconnected,
}

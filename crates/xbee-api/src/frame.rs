//! API frame encoder/decoder.
//!
//! In API mode the XBee wraps every message in a length-prefixed,
//! checksum-guarded envelope. This module handles the pure byte-level
//! encoding and decoding of that envelope.
//!
//! # Frame format
//!
//! ```text
//! 0x7E <len_hi> <len_lo> <payload...> <checksum>
//! ```
//!
//! - Start delimiter: `0x7E`
//! - Length: 16-bit big-endian count of payload bytes
//! - Payload: frame type byte followed by type-specific data
//! - Checksum: `0xFF - (sum of payload bytes mod 256)`

use bytes::{BufMut, BytesMut};
use xbee_core::{Error, Result};

/// Start delimiter byte opening every API frame.
pub const START_DELIMITER: u8 = 0x7E;

/// Bytes of envelope around the payload: delimiter, two length bytes, checksum.
pub const ENVELOPE_OVERHEAD: usize = 4;

/// Compute the API frame checksum of a payload.
///
/// Total over any input, including the empty payload (which yields `0xFF`).
///
/// # Example
///
/// ```
/// use xbee_api::frame::checksum;
///
/// assert_eq!(checksum(&[0x08, 0x01, b'N', b'I']), 0x5F);
/// assert_eq!(checksum(&[]), 0xFF);
/// ```
pub fn checksum(payload: &[u8]) -> u8 {
    let sum = payload.iter().fold(0u8, |acc, &b| acc.wrapping_add(b));
    0xFF - sum
}

/// Wrap a payload into a complete API frame ready for transmission.
///
/// # Errors
///
/// Returns [`Error::InvalidParameter`] if the payload does not fit the
/// 16-bit length field.
///
/// # Example
///
/// ```
/// use xbee_api::frame::encode_frame;
///
/// let bytes = encode_frame(&[0x08, 0x01, b'N', b'I']).unwrap();
/// assert_eq!(bytes, vec![0x7E, 0x00, 0x04, 0x08, 0x01, b'N', b'I', 0x5F]);
/// ```
pub fn encode_frame(payload: &[u8]) -> Result<Vec<u8>> {
    let len = u16::try_from(payload.len()).map_err(|_| {
        Error::InvalidParameter(format!(
            "payload of {} bytes exceeds the 16-bit frame length",
            payload.len()
        ))
    })?;
    let mut buf = BytesMut::with_capacity(payload.len() + ENVELOPE_OVERHEAD);
    buf.put_u8(START_DELIMITER);
    buf.put_u16(len);
    buf.put_slice(payload);
    buf.put_u8(checksum(payload));
    Ok(buf.to_vec())
}

/// Result of attempting to decode one frame from the front of a buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeResult {
    /// A complete, checksum-valid frame. The `usize` is the number of bytes
    /// consumed from the input buffer.
    Frame(Vec<u8>, usize),

    /// The buffer does not yet hold a complete frame. Nothing is consumed.
    Incomplete,

    /// The buffer does not start with the start delimiter. Nothing is
    /// consumed; the caller decides whether to wait or resynchronise.
    Unrecognized,

    /// A complete frame whose trailing checksum did not match its payload.
    /// The frame is still consumed.
    ChecksumMismatch {
        expected: u8,
        actual: u8,
        consumed: usize,
    },
}

/// Attempt to decode exactly one API frame from the front of `buf`.
///
/// Unlike a scanning decoder this never skips bytes on its own: the first
/// byte must be the start delimiter, otherwise [`DecodeResult::Unrecognized`]
/// is returned with nothing consumed.
///
/// # Example
///
/// ```
/// use xbee_api::frame::{decode_frame, DecodeResult};
///
/// let buf = [0x7E, 0x00, 0x02, 0x8A, 0x00, 0x75, 0x7E];
/// match decode_frame(&buf) {
///     DecodeResult::Frame(payload, consumed) => {
///         assert_eq!(payload, vec![0x8A, 0x00]);
///         assert_eq!(consumed, 6);
///     }
///     other => panic!("expected a frame, got {other:?}"),
/// }
/// ```
pub fn decode_frame(buf: &[u8]) -> DecodeResult {
    let Some(&first) = buf.first() else {
        return DecodeResult::Incomplete;
    };
    if first != START_DELIMITER {
        return DecodeResult::Unrecognized;
    }
    if buf.len() < 3 {
        return DecodeResult::Incomplete;
    }

    let len = u16::from_be_bytes([buf[1], buf[2]]) as usize;
    let total = len + ENVELOPE_OVERHEAD;
    if buf.len() < total {
        return DecodeResult::Incomplete;
    }

    let payload = &buf[3..3 + len];
    let expected = checksum(payload);
    let actual = buf[3 + len];
    if expected != actual {
        return DecodeResult::ChecksumMismatch {
            expected,
            actual,
            consumed: total,
        };
    }

    DecodeResult::Frame(payload.to_vec(), total)
}

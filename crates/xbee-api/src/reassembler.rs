//! Stream-to-frame reassembly.
//!
//! Serial reads deliver bytes with arbitrary chunk boundaries: a frame may
//! be split across several reads and one read may carry several frames.
//! [`FrameReassembler`] keeps the residue between reads and drains every
//! complete frame from it after each delivery.

use bytes::{Buf, BytesMut};
use tracing::{debug, warn};

use crate::frame::{self, DecodeResult, START_DELIMITER};

/// Something the reassembler found while draining its residue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamItem {
    /// A checksum-valid frame payload, in arrival order.
    Frame(Vec<u8>),
    /// A complete frame that failed its checksum and was dropped.
    ChecksumMismatch {
        expected: u8,
        actual: u8,
        /// Total envelope length that was discarded.
        length: usize,
    },
    /// Bytes skipped because they did not begin with a start delimiter.
    Discarded(usize),
}

/// Buffers partial input and yields complete API frames.
#[derive(Debug, Default)]
pub struct FrameReassembler {
    residue: BytesMut,
}

impl FrameReassembler {
    pub fn new() -> Self {
        FrameReassembler {
            residue: BytesMut::with_capacity(256),
        }
    }

    /// Append a chunk and drain every complete frame now available.
    ///
    /// Items are returned in stream order. Whatever cannot form a complete
    /// frame yet stays in the residue for the next call.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<StreamItem> {
        self.residue.extend_from_slice(chunk);

        let mut items = Vec::new();
        loop {
            match frame::decode_frame(&self.residue) {
                DecodeResult::Frame(payload, consumed) => {
                    self.residue.advance(consumed);
                    debug!(len = payload.len(), "reassembled API frame");
                    items.push(StreamItem::Frame(payload));
                }
                DecodeResult::ChecksumMismatch {
                    expected,
                    actual,
                    consumed,
                } => {
                    self.residue.advance(consumed);
                    warn!(
                        expected,
                        actual,
                        "API frame checksum mismatch, dropping frame"
                    );
                    items.push(StreamItem::ChecksumMismatch {
                        expected,
                        actual,
                        length: consumed,
                    });
                }
                DecodeResult::Unrecognized => {
                    // Resync on the next start delimiter.
                    let skip = self.residue[1..]
                        .iter()
                        .position(|&b| b == START_DELIMITER)
                        .map_or(self.residue.len(), |pos| pos + 1);
                    self.residue.advance(skip);
                    warn!(bytes = skip, "discarding bytes before start delimiter");
                    items.push(StreamItem::Discarded(skip));
                }
                DecodeResult::Incomplete => break,
            }
        }
        items
    }

    /// Bytes currently held waiting for the rest of a frame.
    pub fn residue(&self) -> &[u8] {
        &self.residue
    }
}

//! Transport trait for radio communication.
//!
//! The [`Transport`] trait abstracts over the physical link to an XBee
//! module. The serial implementation lives in `xbee-transport`; a scripted
//! mock lives in `xbee-test-harness`.
//!
//! A transport carries raw bytes only. No framing is assumed at this layer:
//! bytes may arrive in arbitrary chunks, and it is the API frame
//! reassembler's job to stitch them back into frames.

use async_trait::async_trait;
use std::time::Duration;

use crate::error::Result;

/// Asynchronous byte-level transport to a radio module.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send raw bytes to the radio.
    ///
    /// Implementations should return once all bytes have been handed to the
    /// underlying device.
    async fn send(&mut self, data: &[u8]) -> Result<()>;

    /// Receive bytes from the radio into the provided buffer.
    ///
    /// Returns the number of bytes read. Waits up to `timeout` for data;
    /// returns [`Error::Timeout`](crate::error::Error::Timeout) if nothing
    /// arrived. Any other error means the link is gone.
    async fn receive(&mut self, buf: &mut [u8], timeout: Duration) -> Result<usize>;

    /// Close the transport connection.
    async fn close(&mut self) -> Result<()>;

    /// Check whether the transport is currently connected.
    fn is_connected(&self) -> bool;
}

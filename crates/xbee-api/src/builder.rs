//! XBeeBuilder -- fluent builder for constructing [`XBeeRadio`] instances.
//!
//! Separates configuration from construction so that callers can set the
//! serial port, baud rate and timing before the transport is opened and
//! the IO task is started.
//!
//! # Example
//!
//! ```no_run
//! use xbee_api::builder::XBeeBuilder;
//! use std::time::Duration;
//!
//! # async fn example() -> xbee_core::Result<()> {
//! let radio = XBeeBuilder::new()
//!     .serial_port("/dev/ttyUSB0")
//!     .baud_rate(115_200)
//!     .request_timeout(Some(Duration::from_secs(2)))
//!     .build()
//!     .await?;
//! let reply = radio.at_command("NI", &[]).await?;
//! # Ok(())
//! # }
//! ```

use std::time::Duration;

use tokio::sync::broadcast;
use xbee_core::error::{Error, Result};
use xbee_core::transport::Transport;

use crate::io::{self, IoConfig};
use crate::radio::XBeeRadio;

/// Fluent builder for [`XBeeRadio`].
#[derive(Debug, Clone)]
pub struct XBeeBuilder {
    serial_port: Option<String>,
    baud_rate: u32,
    request_timeout: Option<Duration>,
    read_timeout: Duration,
    event_capacity: usize,
}

impl XBeeBuilder {
    pub fn new() -> Self {
        XBeeBuilder {
            serial_port: None,
            baud_rate: 9600,
            request_timeout: None,
            read_timeout: Duration::from_millis(100),
            event_capacity: 64,
        }
    }

    /// Set the serial port path (e.g. `/dev/ttyUSB0` or `COM3`).
    pub fn serial_port(mut self, port: &str) -> Self {
        self.serial_port = Some(port.to_string());
        self
    }

    /// Set the baud rate (default: 9600, the module's factory setting).
    pub fn baud_rate(mut self, baud: u32) -> Self {
        self.baud_rate = baud;
        self
    }

    /// Give up on a request after this long (default: `None`, wait forever).
    ///
    /// A request that times out leaves its frame ID registered; a late
    /// response for it is then dropped silently.
    pub fn request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// How long each transport read waits for bytes (default: 100ms).
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Capacity of the event broadcast channel (default: 64).
    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }

    /// Build an [`XBeeRadio`] with a caller-provided transport.
    ///
    /// This is the entry point for tests (pass a `MockTransport` from
    /// `xbee-test-harness`) and for callers that manage the link
    /// themselves.
    pub async fn build_with_transport(self, transport: Box<dyn Transport>) -> Result<XBeeRadio> {
        if self.event_capacity == 0 {
            return Err(Error::InvalidParameter(
                "event_capacity must be at least 1".into(),
            ));
        }
        if self.read_timeout.is_zero() {
            return Err(Error::InvalidParameter(
                "read_timeout must be non-zero".into(),
            ));
        }

        let (event_tx, _) = broadcast::channel(self.event_capacity);
        let config = IoConfig {
            read_timeout: self.read_timeout,
        };
        let io = io::spawn_io_task(transport, config, event_tx.clone());
        Ok(XBeeRadio::new(io, event_tx, self.request_timeout))
    }

    /// Build an [`XBeeRadio`] over a serial port.
    ///
    /// Requires that [`serial_port()`](Self::serial_port) has been called.
    pub async fn build(self) -> Result<XBeeRadio> {
        let port = self
            .serial_port
            .as_deref()
            .ok_or_else(|| Error::InvalidParameter("serial_port is required for build()".into()))?;

        let transport = xbee_transport::SerialTransport::open(port, self.baud_rate).await?;
        self.build_with_transport(Box::new(transport)).await
    }
}

impl Default for XBeeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xbee_test_harness::MockTransport;

    #[tokio::test]
    async fn builder_defaults() {
        let builder = XBeeBuilder::new();
        assert_eq!(builder.baud_rate, 9600);
        assert_eq!(builder.request_timeout, None);
        assert_eq!(builder.read_timeout, Duration::from_millis(100));
        assert_eq!(builder.event_capacity, 64);

        let radio = builder
            .build_with_transport(Box::new(MockTransport::new()))
            .await
            .unwrap();
        radio.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn builder_serial_port_required_for_build() {
        let result = XBeeBuilder::new().build().await;
        assert!(matches!(result, Err(Error::InvalidParameter(_))));
    }

    #[tokio::test]
    async fn builder_rejects_zero_event_capacity() {
        let result = XBeeBuilder::new()
            .event_capacity(0)
            .build_with_transport(Box::new(MockTransport::new()))
            .await;
        assert!(matches!(result, Err(Error::InvalidParameter(_))));
    }

    #[tokio::test]
    async fn builder_fluent_chain() {
        let radio = XBeeBuilder::new()
            .serial_port("/dev/ttyUSB0")
            .baud_rate(115_200)
            .request_timeout(Some(Duration::from_millis(500)))
            .read_timeout(Duration::from_millis(20))
            .event_capacity(8)
            .build_with_transport(Box::new(MockTransport::new()))
            .await
            .unwrap();

        let _events = radio.subscribe();
        radio.shutdown().await.unwrap();
    }
}

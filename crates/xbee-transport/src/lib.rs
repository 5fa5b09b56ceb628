//! Transport implementations for the XBee driver.
//!
//! This crate provides [`SerialTransport`], the concrete implementation of
//! the [`Transport`](xbee_core::Transport) trait for an XBee module attached
//! through a USB adapter or a UART.
//!
//! # Example
//!
//! ```no_run
//! use xbee_transport::SerialTransport;
//! use xbee_core::transport::Transport;
//! use std::time::Duration;
//!
//! # async fn example() -> xbee_core::Result<()> {
//! let mut transport = SerialTransport::open("/dev/ttyUSB0", 9600).await?;
//!
//! // Local ATNI request, frame ID 1
//! transport.send(&[0x7E, 0x00, 0x04, 0x08, 0x01, 0x4E, 0x49, 0x5F]).await?;
//!
//! let mut buf = [0u8; 256];
//! let n = transport.receive(&mut buf, Duration::from_secs(1)).await?;
//! # Ok(())
//! # }
//! ```

pub mod serial;

pub use serial::{DataBits, FlowControl, Parity, SerialConfig, SerialTransport, StopBits};

//! xbee-test-harness: Test utilities and a scripted mock transport for the
//! XBee driver.
//!
//! This crate provides [`MockTransport`] for deterministic unit testing of
//! the API-mode protocol engine without a radio attached.

pub mod mock_serial;

pub use mock_serial::MockTransport;

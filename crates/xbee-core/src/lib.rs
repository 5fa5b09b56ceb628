//! xbee-core: Core traits, types, and error definitions for the XBee driver.
//!
//! This crate defines the pieces shared by every other crate in the
//! workspace: the error taxonomy, the byte-level [`Transport`] abstraction,
//! and the small closed enumerations that appear on the wire (AT command
//! names, status codes, device types).
//!
//! # Key types
//!
//! - [`Transport`] -- byte-level communication channel to the radio
//! - [`AtCommand`] -- a validated two-character AT command name
//! - [`Error`] / [`Result`] -- error handling

pub mod error;
pub mod transport;
pub mod types;

pub use error::{Error, Result};
pub use transport::Transport;
pub use types::*;

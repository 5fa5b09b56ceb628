//! Core types used throughout the XBee driver.
//!
//! These are the closed enumerations that appear inside API frames, plus
//! the validated [`AtCommand`] name used by the request operations. Every
//! status table maps codes it does not know to an `Unknown(code)` variant
//! so that decoding never invents a meaning for a byte.

use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// A two-character AT command name such as `NI`, `ND` or `%V`.
///
/// The radio only understands two-byte command names, so the length is
/// checked once at construction and encoders can rely on it afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AtCommand([u8; 2]);

impl AtCommand {
    /// Node identifier string.
    pub const NI: AtCommand = AtCommand(*b"NI");
    /// Node discover.
    pub const ND: AtCommand = AtCommand(*b"ND");
    /// Supply voltage.
    pub const SUPPLY_VOLTAGE: AtCommand = AtCommand(*b"%V");
    /// Firmware version.
    pub const VR: AtCommand = AtCommand(*b"VR");
    /// Hardware version.
    pub const HV: AtCommand = AtCommand(*b"HV");

    /// Create a command name from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] unless `bytes` is exactly two
    /// bytes long.
    pub fn new(bytes: &[u8]) -> Result<Self, Error> {
        let name: [u8; 2] = bytes.try_into().map_err(|_| {
            Error::InvalidParameter(format!(
                "AT command must be exactly 2 bytes, got {}",
                bytes.len()
            ))
        })?;
        Ok(AtCommand(name))
    }

    /// Create a command name from a fixed two-byte array.
    pub const fn from_bytes(name: [u8; 2]) -> Self {
        AtCommand(name)
    }

    /// The two raw command bytes as sent on the wire.
    pub fn as_bytes(&self) -> &[u8; 2] {
        &self.0
    }
}

impl FromStr for AtCommand {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AtCommand::new(s.as_bytes())
    }
}

impl fmt::Display for AtCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.0[0] as char, self.0[1] as char)
    }
}

/// Status byte of a local or remote AT command response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AtStatus {
    Ok,
    Error,
    InvalidCommand,
    InvalidParameter,
    /// A status code outside the documented table.
    Unknown(u8),
}

impl From<u8> for AtStatus {
    fn from(code: u8) -> Self {
        match code {
            0 => AtStatus::Ok,
            1 => AtStatus::Error,
            2 => AtStatus::InvalidCommand,
            3 => AtStatus::InvalidParameter,
            other => AtStatus::Unknown(other),
        }
    }
}

impl fmt::Display for AtStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AtStatus::Ok => write!(f, "ok"),
            AtStatus::Error => write!(f, "error"),
            AtStatus::InvalidCommand => write!(f, "invalid command"),
            AtStatus::InvalidParameter => write!(f, "invalid parameter"),
            AtStatus::Unknown(code) => write!(f, "unknown status 0x{code:02X}"),
        }
    }
}

/// Modem status reported by frame type `0x8A`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModemStatus {
    HardwareReset,
    WatchdogReset,
    Associated,
    Disassociated,
    SyncLost,
    CoordinatorRealignment,
    CoordinatorStarted,
    Unknown(u8),
}

impl From<u8> for ModemStatus {
    fn from(code: u8) -> Self {
        match code {
            0 => ModemStatus::HardwareReset,
            1 => ModemStatus::WatchdogReset,
            2 => ModemStatus::Associated,
            3 => ModemStatus::Disassociated,
            4 => ModemStatus::SyncLost,
            5 => ModemStatus::CoordinatorRealignment,
            6 => ModemStatus::CoordinatorStarted,
            other => ModemStatus::Unknown(other),
        }
    }
}

/// ZigBee device role of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceType {
    Coordinator,
    Router,
    EndDevice,
    /// Any value outside 0..=2; the radio never documents one.
    Unknown(u8),
}

impl From<u8> for DeviceType {
    fn from(code: u8) -> Self {
        match code {
            0 => DeviceType::Coordinator,
            1 => DeviceType::Router,
            2 => DeviceType::EndDevice,
            other => DeviceType::Unknown(other),
        }
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceType::Coordinator => write!(f, "coordinator"),
            DeviceType::Router => write!(f, "router"),
            DeviceType::EndDevice => write!(f, "end device"),
            DeviceType::Unknown(code) => write!(f, "unknown device type {code}"),
        }
    }
}

/// What caused a node identification broadcast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceEvent {
    Button,
    Join,
    PowerCycle,
    Unknown(u8),
}

impl From<u8> for SourceEvent {
    fn from(code: u8) -> Self {
        match code {
            1 => SourceEvent::Button,
            2 => SourceEvent::Join,
            3 => SourceEvent::PowerCycle,
            other => SourceEvent::Unknown(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn at_command_from_str() {
        let cmd: AtCommand = "NI".parse().unwrap();
        assert_eq!(cmd, AtCommand::NI);
        assert_eq!(cmd.as_bytes(), b"NI");
        assert_eq!(cmd.to_string(), "NI");
    }

    #[test]
    fn at_command_rejects_wrong_length() {
        assert!(matches!(
            AtCommand::new(b"N"),
            Err(Error::InvalidParameter(_))
        ));
        assert!(matches!(
            "NIX".parse::<AtCommand>(),
            Err(Error::InvalidParameter(_))
        ));
        assert!(AtCommand::new(b"").is_err());
    }

    #[test]
    fn at_status_table() {
        assert_eq!(AtStatus::from(0), AtStatus::Ok);
        assert_eq!(AtStatus::from(1), AtStatus::Error);
        assert_eq!(AtStatus::from(2), AtStatus::InvalidCommand);
        assert_eq!(AtStatus::from(3), AtStatus::InvalidParameter);
        assert_eq!(AtStatus::from(4), AtStatus::Unknown(4));
        assert_eq!(AtStatus::from(0xFF), AtStatus::Unknown(0xFF));
    }

    #[test]
    fn modem_status_table() {
        assert_eq!(ModemStatus::from(0), ModemStatus::HardwareReset);
        assert_eq!(ModemStatus::from(1), ModemStatus::WatchdogReset);
        assert_eq!(ModemStatus::from(2), ModemStatus::Associated);
        assert_eq!(ModemStatus::from(3), ModemStatus::Disassociated);
        assert_eq!(ModemStatus::from(4), ModemStatus::SyncLost);
        assert_eq!(ModemStatus::from(5), ModemStatus::CoordinatorRealignment);
        assert_eq!(ModemStatus::from(6), ModemStatus::CoordinatorStarted);
        assert_eq!(ModemStatus::from(0x11), ModemStatus::Unknown(0x11));
    }

    #[test]
    fn source_event_table() {
        assert_eq!(SourceEvent::from(1), SourceEvent::Button);
        assert_eq!(SourceEvent::from(2), SourceEvent::Join);
        assert_eq!(SourceEvent::from(3), SourceEvent::PowerCycle);
        assert_eq!(SourceEvent::from(0), SourceEvent::Unknown(0));
    }

    #[test]
    fn device_type_table() {
        assert_eq!(DeviceType::from(0), DeviceType::Coordinator);
        assert_eq!(DeviceType::from(1), DeviceType::Router);
        assert_eq!(DeviceType::from(2), DeviceType::EndDevice);
        assert_eq!(DeviceType::from(9), DeviceType::Unknown(9));
        assert_eq!(DeviceType::Router.to_string(), "router");
    }
}

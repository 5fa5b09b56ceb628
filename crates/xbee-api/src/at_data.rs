//! Command-specific interpretation of AT response data.
//!
//! Most AT responses carry opaque parameter bytes, but a few commands have
//! a well-known layout. [`decode_at_data`] is keyed on the command name and
//! falls back to [`AtData::Raw`] for everything it does not know.

use bytes::Buf;
use xbee_core::{AtCommand, DeviceType, Error, Result};

/// Bytes that follow a node identifier string: the zero terminator, parent
/// network address (2), device type (1), status or source event (1),
/// profile ID (2) and manufacturer ID (2).
pub(crate) const NODE_ID_TRAILER_LEN: usize = 9;

/// Decoded AT response data.
#[derive(Debug, Clone, PartialEq)]
pub enum AtData {
    /// Uninterpreted parameter bytes (possibly empty).
    Raw(Vec<u8>),
    /// One node record from an `ND` (node discover) response.
    NodeDiscovery(NodeInfo),
    /// Supply voltage from `%V`, in volts.
    Voltage(f64),
    /// Firmware (`VR`) or hardware (`HV`) version.
    ///
    /// `digit` is the leading hexadecimal digit of the version word, which
    /// is all the radio's historical host software kept. `raw` is the full
    /// 16-bit value; use [`AtData::full_hex`] for the complete rendering.
    Version { digit: String, raw: u16 },
}

impl AtData {
    /// Full upper-case hexadecimal rendering of a `VR`/`HV` version word.
    ///
    /// Returns `None` for any other kind of data.
    pub fn full_hex(&self) -> Option<String> {
        match self {
            AtData::Version { raw, .. } => Some(format!("{raw:X}")),
            _ => None,
        }
    }

    /// The raw bytes, if this data was left uninterpreted.
    pub fn as_raw(&self) -> Option<&[u8]> {
        match self {
            AtData::Raw(bytes) => Some(bytes),
            _ => None,
        }
    }
}

/// A node reported by node discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeInfo {
    pub network_address: u16,
    pub serial_number: u64,
    pub node_identifier: String,
    pub parent_network_address: u16,
    pub device_type: DeviceType,
    pub status: u8,
    pub profile_id: u16,
    pub manufacturer_id: u16,
}

/// Interpret the data of an AT command response according to its command.
///
/// Empty data is always returned as `Raw(vec![])`: responses carrying an
/// error status have no parameter bytes.
///
/// # Errors
///
/// Returns [`Error::Protocol`] if the data of a command with a known layout
/// has the wrong length.
pub fn decode_at_data(command: AtCommand, data: &[u8]) -> Result<AtData> {
    if data.is_empty() {
        return Ok(AtData::Raw(Vec::new()));
    }
    match command.as_bytes() {
        b"ND" => parse_node_discovery(data).map(AtData::NodeDiscovery),
        b"%V" => {
            let value = parse_u16(command, data)?;
            Ok(AtData::Voltage(f64::from(value) / 1024.0))
        }
        b"VR" | b"HV" => {
            let raw = parse_u16(command, data)?;
            // Only the first hex digit survives, matching long-standing
            // host behaviour; `raw` keeps the whole word.
            let digit = format!("{raw:X}").chars().take(1).collect();
            Ok(AtData::Version { digit, raw })
        }
        _ => Ok(AtData::Raw(data.to_vec())),
    }
}

fn parse_u16(command: AtCommand, data: &[u8]) -> Result<u16> {
    let bytes: [u8; 2] = data.try_into().map_err(|_| {
        Error::Protocol(format!(
            "expected 2 bytes for {command} response, got {}",
            data.len()
        ))
    })?;
    Ok(u16::from_be_bytes(bytes))
}

/// Parse an `ND` response record.
///
/// Layout: network address (2), serial number (8), node identifier, then
/// the fixed node-identifier trailer.
fn parse_node_discovery(data: &[u8]) -> Result<NodeInfo> {
    const FIXED: usize = 2 + 8 + NODE_ID_TRAILER_LEN;
    if data.len() < FIXED {
        return Err(Error::Protocol(format!(
            "expected at least {FIXED} bytes for ND response, got {}",
            data.len()
        )));
    }

    let mut buf = data;
    let network_address = buf.get_u16();
    let serial_number = buf.get_u64();
    let (node_identifier, mut trailer) = split_node_identifier(buf);

    Ok(NodeInfo {
        network_address,
        serial_number,
        node_identifier,
        parent_network_address: trailer.get_u16(),
        device_type: DeviceType::from(trailer.get_u8()),
        status: trailer.get_u8(),
        profile_id: trailer.get_u16(),
        manufacturer_id: trailer.get_u16(),
    })
}

/// Split a zero-terminated node identifier from the fixed trailer after it.
///
/// The identifier length is the remaining length minus the trailer, so the
/// caller must have checked that at least [`NODE_ID_TRAILER_LEN`] bytes
/// remain. The returned slice starts after the terminator and is exactly
/// eight bytes long.
pub(crate) fn split_node_identifier(rest: &[u8]) -> (String, &[u8]) {
    let ni_len = rest.len() - NODE_ID_TRAILER_LEN;
    let node_identifier = String::from_utf8_lossy(&rest[..ni_len]).into_owned();
    (node_identifier, &rest[ni_len + 1..])
}

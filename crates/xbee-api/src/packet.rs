//! API frame payload decoder.
//!
//! A checksum-valid payload starts with a frame type byte that selects the
//! layout of the rest. [`decode_packet`] maps a payload to one [`Packet`]
//! variant with typed fields. Every layout is length-checked before any
//! field is read, so a short payload is a [`Error::Protocol`] rather than a
//! panic.
//!
//! Explicit RX frames (`0x91`) for the data cluster and the node
//! identification cluster are re-expressed as the simpler frame they carry
//! by synthesising that frame's payload and decoding it again.

use bytes::{Buf, BufMut, BytesMut};
use tracing::warn;
use xbee_core::{AtCommand, AtStatus, DeviceType, Error, ModemStatus, Result, SourceEvent};

use crate::at_data::{self, AtData, NODE_ID_TRAILER_LEN};

// ---------------------------------------------------------------
// Frame type constants
// ---------------------------------------------------------------

/// Local AT command request (host to radio).
pub const LOCAL_AT_COMMAND: u8 = 0x08;
/// Remote AT command request (host to radio).
pub const REMOTE_AT_COMMAND: u8 = 0x17;
pub const AT_COMMAND_RESPONSE: u8 = 0x88;
pub const MODEM_STATUS: u8 = 0x8A;
pub const TRANSMIT_STATUS: u8 = 0x8B;
pub const RX_PACKET: u8 = 0x90;
pub const EXPLICIT_RX: u8 = 0x91;
pub const IO_SAMPLE_RX: u8 = 0x92;
pub const NODE_IDENTIFICATION: u8 = 0x95;
pub const REMOTE_AT_COMMAND_RESPONSE: u8 = 0x97;

/// Explicit RX cluster carrying plain serial data.
pub const CLUSTER_SERIAL_DATA: u16 = 0x0011;
/// Explicit RX cluster carrying a node identification message.
pub const CLUSTER_NODE_IDENTIFICATION: u16 = 0x0095;

// ---------------------------------------------------------------
// Packet types
// ---------------------------------------------------------------

/// A decoded API frame payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Packet {
    ModemStatus(ModemStatus),
    AtCommandResponse(AtCommandResponse),
    RemoteAtCommandResponse(RemoteAtCommandResponse),
    TransmitStatus(TransmitStatus),
    RxPacket(RxPacket),
    IoSample(IoSample),
    NodeIdentification(NodeIdentification),
    ExplicitRx(ExplicitRx),
    /// A frame type this decoder does not interpret, kept verbatim.
    Unknown { frame_type: u8, data: Vec<u8> },
}

/// Response to a local AT command (`0x88`).
#[derive(Debug, Clone, PartialEq)]
pub struct AtCommandResponse {
    pub frame_id: u8,
    pub command: AtCommand,
    pub status: AtStatus,
    pub data: AtData,
}

/// Response to a remote AT command (`0x97`).
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteAtCommandResponse {
    pub frame_id: u8,
    pub address: u64,
    pub network_address: u16,
    pub command: AtCommand,
    pub status: AtStatus,
    pub data: AtData,
}

/// Transmit status (`0x8B`). Status bytes are kept as received.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransmitStatus {
    pub frame_id: u8,
    pub network_address: u16,
    pub retry_count: u8,
    pub delivery_status: u8,
    pub discovery_status: u8,
}

/// Received serial data (`0x90`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RxPacket {
    pub address: u64,
    pub network_address: u16,
    pub options: u8,
    pub data: Vec<u8>,
}

/// I/O data sample (`0x92`). The sample block is not interpreted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IoSample {
    pub address: u64,
    pub network_address: u16,
    pub options: u8,
    pub samples: Vec<u8>,
}

/// Node identification indicator (`0x95`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeIdentification {
    pub sender_address: u64,
    pub sender_network_address: u16,
    pub options: u8,
    pub source_network_address: u16,
    pub source_address: u64,
    pub node_identifier: String,
    pub parent_network_address: u16,
    pub device_type: DeviceType,
    pub source_event: SourceEvent,
    pub profile_id: u16,
    pub manufacturer_id: u16,
}

/// Explicit RX indicator (`0x91`) for clusters without a simpler form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExplicitRx {
    pub address: u64,
    pub network_address: u16,
    pub source_endpoint: u8,
    pub destination_endpoint: u8,
    pub cluster_id: u16,
    pub profile_id: u16,
    pub options: u8,
    pub data: Vec<u8>,
}

impl Packet {
    /// The frame type byte this packet was decoded from.
    ///
    /// Explicit RX frames that were re-expressed report the type of the
    /// simpler frame.
    pub fn frame_type(&self) -> u8 {
        match self {
            Packet::ModemStatus(_) => MODEM_STATUS,
            Packet::AtCommandResponse(_) => AT_COMMAND_RESPONSE,
            Packet::RemoteAtCommandResponse(_) => REMOTE_AT_COMMAND_RESPONSE,
            Packet::TransmitStatus(_) => TRANSMIT_STATUS,
            Packet::RxPacket(_) => RX_PACKET,
            Packet::IoSample(_) => IO_SAMPLE_RX,
            Packet::NodeIdentification(_) => NODE_IDENTIFICATION,
            Packet::ExplicitRx(_) => EXPLICIT_RX,
            Packet::Unknown { frame_type, .. } => *frame_type,
        }
    }
}

// ---------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------

/// Decode a checksum-valid API frame payload.
///
/// # Errors
///
/// Returns [`Error::Protocol`] if the payload is empty or shorter than the
/// fixed part of its frame type. AT response data that does not fit the
/// command's known layout is kept as [`AtData::Raw`] instead.
///
/// # Example
///
/// ```
/// use xbee_api::packet::{decode_packet, Packet};
/// use xbee_core::ModemStatus;
///
/// let packet = decode_packet(&[0x8A, 0x02]).unwrap();
/// assert_eq!(packet, Packet::ModemStatus(ModemStatus::Associated));
/// ```
pub fn decode_packet(payload: &[u8]) -> Result<Packet> {
    let Some((&frame_type, body)) = payload.split_first() else {
        return Err(Error::Protocol("empty API frame payload".into()));
    };

    match frame_type {
        MODEM_STATUS => {
            require(frame_type, body, 1)?;
            Ok(Packet::ModemStatus(ModemStatus::from(body[0])))
        }
        AT_COMMAND_RESPONSE => decode_at_response(body),
        REMOTE_AT_COMMAND_RESPONSE => decode_remote_at_response(body),
        TRANSMIT_STATUS => {
            require(frame_type, body, 6)?;
            let mut buf = body;
            Ok(Packet::TransmitStatus(TransmitStatus {
                frame_id: buf.get_u8(),
                network_address: buf.get_u16(),
                retry_count: buf.get_u8(),
                delivery_status: buf.get_u8(),
                discovery_status: buf.get_u8(),
            }))
        }
        RX_PACKET => {
            require(frame_type, body, 11)?;
            let mut buf = body;
            Ok(Packet::RxPacket(RxPacket {
                address: buf.get_u64(),
                network_address: buf.get_u16(),
                options: buf.get_u8(),
                data: buf.to_vec(),
            }))
        }
        IO_SAMPLE_RX => {
            require(frame_type, body, 11)?;
            let mut buf = body;
            Ok(Packet::IoSample(IoSample {
                address: buf.get_u64(),
                network_address: buf.get_u16(),
                options: buf.get_u8(),
                samples: buf.to_vec(),
            }))
        }
        NODE_IDENTIFICATION => decode_node_identification(body),
        EXPLICIT_RX => decode_explicit_rx(body),
        other => Ok(Packet::Unknown {
            frame_type: other,
            data: body.to_vec(),
        }),
    }
}

fn require(frame_type: u8, body: &[u8], min: usize) -> Result<()> {
    if body.len() < min {
        return Err(Error::Protocol(format!(
            "frame type 0x{frame_type:02X} needs at least {min} bytes after the type, got {}",
            body.len()
        )));
    }
    Ok(())
}

fn get_command(buf: &mut &[u8]) -> AtCommand {
    AtCommand::from_bytes([buf.get_u8(), buf.get_u8()])
}

/// Interpret response data, keeping the raw bytes when the command's known
/// layout does not fit. The frame ID is already read, so the response must
/// still reach its caller.
fn response_data(command: AtCommand, data: &[u8]) -> AtData {
    match at_data::decode_at_data(command, data) {
        Ok(decoded) => decoded,
        Err(e) => {
            warn!(%command, error = %e, "keeping AT response data uninterpreted");
            AtData::Raw(data.to_vec())
        }
    }
}

fn decode_at_response(body: &[u8]) -> Result<Packet> {
    require(AT_COMMAND_RESPONSE, body, 4)?;
    let mut buf = body;
    let frame_id = buf.get_u8();
    let command = get_command(&mut buf);
    let status = AtStatus::from(buf.get_u8());
    let data = response_data(command, buf);
    Ok(Packet::AtCommandResponse(AtCommandResponse {
        frame_id,
        command,
        status,
        data,
    }))
}

fn decode_remote_at_response(body: &[u8]) -> Result<Packet> {
    require(REMOTE_AT_COMMAND_RESPONSE, body, 14)?;
    let mut buf = body;
    let frame_id = buf.get_u8();
    let address = buf.get_u64();
    let network_address = buf.get_u16();
    let command = get_command(&mut buf);
    let status = AtStatus::from(buf.get_u8());
    let data = response_data(command, buf);
    Ok(Packet::RemoteAtCommandResponse(RemoteAtCommandResponse {
        frame_id,
        address,
        network_address,
        command,
        status,
        data,
    }))
}

/// Layout: sender address (8), sender network address (2), options (1),
/// source network address (2), source address (8), reserved (1), node
/// identifier, then the fixed node-identifier trailer.
fn decode_node_identification(body: &[u8]) -> Result<Packet> {
    require(NODE_IDENTIFICATION, body, 22 + NODE_ID_TRAILER_LEN)?;
    let mut buf = body;
    let sender_address = buf.get_u64();
    let sender_network_address = buf.get_u16();
    let options = buf.get_u8();
    let source_network_address = buf.get_u16();
    let source_address = buf.get_u64();
    let _reserved = buf.get_u8();
    let (node_identifier, mut trailer) = at_data::split_node_identifier(buf);

    Ok(Packet::NodeIdentification(NodeIdentification {
        sender_address,
        sender_network_address,
        options,
        source_network_address,
        source_address,
        node_identifier,
        parent_network_address: trailer.get_u16(),
        device_type: DeviceType::from(trailer.get_u8()),
        source_event: SourceEvent::from(trailer.get_u8()),
        profile_id: trailer.get_u16(),
        manufacturer_id: trailer.get_u16(),
    }))
}

fn decode_explicit_rx(body: &[u8]) -> Result<Packet> {
    require(EXPLICIT_RX, body, 17)?;
    let mut buf = body;
    let address = buf.get_u64();
    let network_address = buf.get_u16();
    let source_endpoint = buf.get_u8();
    let destination_endpoint = buf.get_u8();
    let cluster_id = buf.get_u16();
    let profile_id = buf.get_u16();
    let options = buf.get_u8();
    let data = buf;

    let simpler = match cluster_id {
        CLUSTER_SERIAL_DATA => Some(RX_PACKET),
        CLUSTER_NODE_IDENTIFICATION => Some(NODE_IDENTIFICATION),
        _ => None,
    };
    if let Some(frame_type) = simpler {
        let mut synthetic = BytesMut::with_capacity(12 + data.len());
        synthetic.put_u8(frame_type);
        synthetic.put_u64(address);
        synthetic.put_u16(network_address);
        synthetic.put_u8(options);
        synthetic.put_slice(data);
        return decode_packet(&synthetic);
    }

    Ok(Packet::ExplicitRx(ExplicitRx {
        address,
        network_address,
        source_endpoint,
        destination_endpoint,
        cluster_id,
        profile_id,
        options,
        data: data.to_vec(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADDR64: u64 = 0x0013_A200_40A1_B2C3;

    fn explicit_header(cluster: u16) -> Vec<u8> {
        let mut p = vec![EXPLICIT_RX];
        p.extend_from_slice(&ADDR64.to_be_bytes());
        p.extend_from_slice(&[0x7D, 0x84]); // network address
        p.extend_from_slice(&[0xE8, 0xE8]); // endpoints
        p.extend_from_slice(&cluster.to_be_bytes());
        p.extend_from_slice(&[0xC1, 0x05]); // profile
        p.push(0x01); // options
        p
    }

    /// Node identification body after sender address, network and options.
    fn node_id_tail(ni: &[u8]) -> Vec<u8> {
        let mut p = vec![0x12, 0x34]; // source network address
        p.extend_from_slice(&0x0013_A200_4000_0001u64.to_be_bytes());
        p.push(0x00); // reserved
        p.extend_from_slice(ni);
        p.push(0x00);
        p.extend_from_slice(&[0xFF, 0xFE]); // parent
        p.push(0x02); // end device
        p.push(0x01); // button
        p.extend_from_slice(&[0xC1, 0x05, 0x10, 0x1E]);
        p
    }

    // ---------------------------------------------------------------
    // Simple frame types
    // ---------------------------------------------------------------

    #[test]
    fn modem_status() {
        assert_eq!(
            decode_packet(&[0x8A, 0x06]).unwrap(),
            Packet::ModemStatus(ModemStatus::CoordinatorStarted)
        );
        assert_eq!(
            decode_packet(&[0x8A, 0x80]).unwrap(),
            Packet::ModemStatus(ModemStatus::Unknown(0x80))
        );
    }

    #[test]
    fn at_command_response_node_identifier() {
        let payload = [0x88, 0x01, b'N', b'I', 0x00, b'n', b'o', b'd', b'e', b'1'];
        match decode_packet(&payload).unwrap() {
            Packet::AtCommandResponse(resp) => {
                assert_eq!(resp.frame_id, 1);
                assert_eq!(resp.command, AtCommand::NI);
                assert_eq!(resp.status, AtStatus::Ok);
                assert_eq!(resp.data, AtData::Raw(b"node1".to_vec()));
            }
            other => panic!("expected AtCommandResponse, got {other:?}"),
        }
    }

    #[test]
    fn at_command_response_error_statuses() {
        for (code, status) in [
            (1, AtStatus::Error),
            (2, AtStatus::InvalidCommand),
            (3, AtStatus::InvalidParameter),
            (7, AtStatus::Unknown(7)),
        ] {
            match decode_packet(&[0x88, 0x05, b'Z', b'Z', code]).unwrap() {
                Packet::AtCommandResponse(resp) => {
                    assert_eq!(resp.status, status);
                    assert_eq!(resp.data, AtData::Raw(vec![]));
                }
                other => panic!("expected AtCommandResponse, got {other:?}"),
            }
        }
    }

    #[test]
    fn at_command_response_voltage() {
        match decode_packet(&[0x88, 0x09, b'%', b'V', 0x00, 0x04, 0x00]).unwrap() {
            Packet::AtCommandResponse(resp) => assert_eq!(resp.data, AtData::Voltage(1.0)),
            other => panic!("expected AtCommandResponse, got {other:?}"),
        }
    }

    #[test]
    fn malformed_known_layout_falls_back_to_raw() {
        match decode_packet(&[0x88, 0x01, b'%', b'V', 0x00, 0x0C, 0x00, 0x01]).unwrap() {
            Packet::AtCommandResponse(resp) => {
                assert_eq!(resp.frame_id, 1);
                assert_eq!(resp.status, AtStatus::Ok);
                assert_eq!(resp.data, AtData::Raw(vec![0x0C, 0x00, 0x01]));
            }
            other => panic!("expected AtCommandResponse, got {other:?}"),
        }

        let mut payload = vec![0x97, 0x02];
        payload.extend_from_slice(&ADDR64.to_be_bytes());
        payload.extend_from_slice(&[0x7D, 0x84, b'N', b'D', 0x00, 0x12, 0x34]);
        match decode_packet(&payload).unwrap() {
            Packet::RemoteAtCommandResponse(resp) => {
                assert_eq!(resp.data, AtData::Raw(vec![0x12, 0x34]));
            }
            other => panic!("expected RemoteAtCommandResponse, got {other:?}"),
        }
    }

    #[test]
    fn remote_at_command_response() {
        let mut payload = vec![0x97, 0x03];
        payload.extend_from_slice(&ADDR64.to_be_bytes());
        payload.extend_from_slice(&[0x7D, 0x84, b'D', b'1', 0x00, 0x04]);
        match decode_packet(&payload).unwrap() {
            Packet::RemoteAtCommandResponse(resp) => {
                assert_eq!(resp.frame_id, 3);
                assert_eq!(resp.address, ADDR64);
                assert_eq!(resp.network_address, 0x7D84);
                assert_eq!(resp.command.to_string(), "D1");
                assert_eq!(resp.status, AtStatus::Ok);
                assert_eq!(resp.data, AtData::Raw(vec![0x04]));
            }
            other => panic!("expected RemoteAtCommandResponse, got {other:?}"),
        }
    }

    #[test]
    fn transmit_status() {
        let payload = [0x8B, 0x47, 0xFF, 0xFE, 0x00, 0x00, 0x02];
        assert_eq!(
            decode_packet(&payload).unwrap(),
            Packet::TransmitStatus(TransmitStatus {
                frame_id: 0x47,
                network_address: 0xFFFE,
                retry_count: 0,
                delivery_status: 0,
                discovery_status: 2,
            })
        );
    }

    #[test]
    fn rx_packet() {
        let mut payload = vec![0x90];
        payload.extend_from_slice(&ADDR64.to_be_bytes());
        payload.extend_from_slice(&[0x7D, 0x84, 0x01]);
        payload.extend_from_slice(b"hello");
        assert_eq!(
            decode_packet(&payload).unwrap(),
            Packet::RxPacket(RxPacket {
                address: ADDR64,
                network_address: 0x7D84,
                options: 0x01,
                data: b"hello".to_vec(),
            })
        );
    }

    #[test]
    fn io_sample_is_not_interpreted() {
        let mut payload = vec![0x92];
        payload.extend_from_slice(&ADDR64.to_be_bytes());
        payload.extend_from_slice(&[0x7D, 0x84, 0x01, 0x01, 0x00, 0x1C, 0x02, 0x00, 0x14]);
        match decode_packet(&payload).unwrap() {
            Packet::IoSample(sample) => {
                assert_eq!(sample.address, ADDR64);
                assert_eq!(sample.samples, vec![0x01, 0x00, 0x1C, 0x02, 0x00, 0x14]);
            }
            other => panic!("expected IoSample, got {other:?}"),
        }
    }

    #[test]
    fn node_identification() {
        let mut payload = vec![0x95];
        payload.extend_from_slice(&ADDR64.to_be_bytes());
        payload.extend_from_slice(&[0x7D, 0x84, 0x02]);
        payload.extend_from_slice(&node_id_tail(b"KITCHEN"));

        match decode_packet(&payload).unwrap() {
            Packet::NodeIdentification(node) => {
                assert_eq!(node.sender_address, ADDR64);
                assert_eq!(node.sender_network_address, 0x7D84);
                assert_eq!(node.options, 0x02);
                assert_eq!(node.source_network_address, 0x1234);
                assert_eq!(node.source_address, 0x0013_A200_4000_0001);
                assert_eq!(node.node_identifier, "KITCHEN");
                assert_eq!(node.parent_network_address, 0xFFFE);
                assert_eq!(node.device_type, DeviceType::EndDevice);
                assert_eq!(node.source_event, SourceEvent::Button);
                assert_eq!(node.profile_id, 0xC105);
                assert_eq!(node.manufacturer_id, 0x101E);
            }
            other => panic!("expected NodeIdentification, got {other:?}"),
        }
    }

    #[test]
    fn unknown_frame_type_passes_through() {
        assert_eq!(
            decode_packet(&[0xA1, 0x01, 0x02]).unwrap(),
            Packet::Unknown {
                frame_type: 0xA1,
                data: vec![0x01, 0x02],
            }
        );
    }

    // ---------------------------------------------------------------
    // Explicit RX
    // ---------------------------------------------------------------

    #[test]
    fn explicit_rx_general_cluster() {
        let mut payload = explicit_header(0x0006);
        payload.extend_from_slice(&[0x01, 0x02]);
        assert_eq!(
            decode_packet(&payload).unwrap(),
            Packet::ExplicitRx(ExplicitRx {
                address: ADDR64,
                network_address: 0x7D84,
                source_endpoint: 0xE8,
                destination_endpoint: 0xE8,
                cluster_id: 0x0006,
                profile_id: 0xC105,
                options: 0x01,
                data: vec![0x01, 0x02],
            })
        );
    }

    #[test]
    fn explicit_rx_serial_cluster_matches_rx_packet() {
        let mut explicit = explicit_header(CLUSTER_SERIAL_DATA);
        explicit.extend_from_slice(b"ping");

        let mut plain = vec![0x90];
        plain.extend_from_slice(&ADDR64.to_be_bytes());
        plain.extend_from_slice(&[0x7D, 0x84, 0x01]);
        plain.extend_from_slice(b"ping");

        let decoded = decode_packet(&explicit).unwrap();
        assert_eq!(decoded, decode_packet(&plain).unwrap());
        assert_eq!(decoded.frame_type(), RX_PACKET);
    }

    #[test]
    fn explicit_rx_node_identification_cluster() {
        let mut explicit = explicit_header(CLUSTER_NODE_IDENTIFICATION);
        explicit.extend_from_slice(&node_id_tail(b"GARAGE"));

        let mut plain = vec![0x95];
        plain.extend_from_slice(&ADDR64.to_be_bytes());
        plain.extend_from_slice(&[0x7D, 0x84, 0x01]);
        plain.extend_from_slice(&node_id_tail(b"GARAGE"));

        let decoded = decode_packet(&explicit).unwrap();
        assert_eq!(decoded, decode_packet(&plain).unwrap());
        match decoded {
            Packet::NodeIdentification(node) => assert_eq!(node.node_identifier, "GARAGE"),
            other => panic!("expected NodeIdentification, got {other:?}"),
        }
    }

    // ---------------------------------------------------------------
    // Short buffers
    // ---------------------------------------------------------------

    #[test]
    fn empty_payload_rejected() {
        assert!(matches!(decode_packet(&[]), Err(Error::Protocol(_))));
    }

    #[test]
    fn short_payloads_rejected() {
        let short: [&[u8]; 8] = [
            &[0x8A],
            &[0x88, 0x01, b'N'],
            &[0x97, 0x01, 0x00],
            &[0x8B, 0x01, 0x00, 0x00],
            &[0x90, 0x00, 0x00],
            &[0x92, 0x00],
            &[0x95, 0x00, 0x01],
            &[0x91, 0x00, 0x00, 0x00],
        ];
        for payload in short {
            assert!(
                matches!(decode_packet(payload), Err(Error::Protocol(_))),
                "payload {payload:02X?} should be rejected"
            );
        }
    }

    #[test]
    fn explicit_node_identification_with_short_inner_data_rejected() {
        let mut explicit = explicit_header(CLUSTER_NODE_IDENTIFICATION);
        explicit.extend_from_slice(&[0x12, 0x34]);
        assert!(matches!(decode_packet(&explicit), Err(Error::Protocol(_))));
    }
}

//! Outbound AT command payload builders.
//!
//! These functions are pure: they build the API frame *payload* for a
//! request without performing any I/O and without allocating frame IDs.
//! Wrap the result with [`encode_frame`](crate::frame::encode_frame) before
//! handing it to a transport.

use bytes::{BufMut, BytesMut};
use xbee_core::AtCommand;

use crate::packet::{LOCAL_AT_COMMAND, REMOTE_AT_COMMAND};

/// 64-bit destination used for every remote AT command; the target is
/// selected by its 16-bit network address instead.
pub const BROADCAST_ADDRESS: u64 = 0xFFFF_FFFF_FFFF_FFFF;

/// Remote command option bit asking the target to apply changes at once.
pub const APPLY_CHANGES: u8 = 0x02;

/// Build a local AT command payload.
///
/// # Example
///
/// ```
/// use xbee_api::commands::build_local_at;
/// use xbee_core::AtCommand;
///
/// let payload = build_local_at(1, AtCommand::NI, &[]);
/// assert_eq!(payload, vec![0x08, 0x01, b'N', b'I']);
/// ```
pub fn build_local_at(frame_id: u8, command: AtCommand, data: &[u8]) -> Vec<u8> {
    let mut buf = BytesMut::with_capacity(4 + data.len());
    buf.put_u8(LOCAL_AT_COMMAND);
    buf.put_u8(frame_id);
    buf.put_slice(command.as_bytes());
    buf.put_slice(data);
    buf.to_vec()
}

/// Build a remote AT command payload addressed by network address.
pub fn build_remote_at(
    frame_id: u8,
    network_address: u16,
    command: AtCommand,
    data: &[u8],
) -> Vec<u8> {
    let mut buf = BytesMut::with_capacity(15 + data.len());
    buf.put_u8(REMOTE_AT_COMMAND);
    buf.put_u8(frame_id);
    buf.put_u64(BROADCAST_ADDRESS);
    buf.put_u16(network_address);
    buf.put_u8(APPLY_CHANGES);
    buf.put_slice(command.as_bytes());
    buf.put_slice(data);
    buf.to_vec()
}

//! XBee/ZigBee API-mode protocol engine.
//!
//! This crate implements the host side of the XBee API frame protocol. It
//! provides:
//!
//! - **Frame codec** ([`frame`]) -- checksum, envelope encoding and
//!   single-frame decoding.
//! - **Reassembler** ([`reassembler`]) -- turns an arbitrarily chunked byte
//!   stream into complete frames, resynchronising on the start delimiter.
//! - **Packet decoder** ([`packet`]) -- typed views of inbound frames, with
//!   AT response data interpreted by [`at_data`].
//! - **Command builders** ([`commands`]) -- local and remote AT request
//!   payloads.
//! - **XBeeRadio** ([`radio`]) -- the request handle: frame ID allocation and
//!   response correlation run in a background IO task that owns the
//!   [`Transport`](xbee_core::Transport).
//! - **XBeeBuilder** ([`builder`]) -- fluent builder for `XBeeRadio`.
//!
//! # Example
//!
//! ```
//! use xbee_api::frame::{decode_frame, encode_frame, DecodeResult};
//! use xbee_api::packet::{decode_packet, Packet};
//! use xbee_api::at_data::AtData;
//!
//! let bytes = encode_frame(&[0x88, 0x01, b'N', b'I', 0x00, b'n', b'o', b'd', b'e', b'1']).unwrap();
//! if let DecodeResult::Frame(payload, _) = decode_frame(&bytes) {
//!     match decode_packet(&payload).unwrap() {
//!         Packet::AtCommandResponse(resp) => {
//!             assert_eq!(resp.data, AtData::Raw(b"node1".to_vec()));
//!         }
//!         other => panic!("unexpected {other:?}"),
//!     }
//! }
//! ```

pub mod at_data;
pub mod builder;
pub mod commands;
pub(crate) mod correlate;
pub mod events;
pub mod frame;
pub(crate) mod io;
pub mod packet;
pub mod radio;
pub mod reassembler;

pub use at_data::{AtData, NodeInfo};
pub use builder::XBeeBuilder;
pub use correlate::AtReply;
pub use events::XBeeEvent;
pub use packet::Packet;
pub use radio::XBeeRadio;

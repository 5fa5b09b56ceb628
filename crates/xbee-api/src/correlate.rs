//! Frame ID allocation and request/response correlation.
//!
//! [`Correlator`] owns the frame ID counter and the table of requests that
//! are waiting for a response. It is plain state with no I/O or locking:
//! the IO task is its only owner, which serialises allocation, registration
//! and response dispatch.

use std::collections::HashMap;
use std::fmt;

use tokio::sync::oneshot;
use tracing::{debug, warn};
use xbee_core::{AtStatus, Error, Result};

use crate::at_data::AtData;
use crate::packet::Packet;

/// The outcome of an AT command, as reported by the radio.
#[derive(Debug, Clone, PartialEq)]
pub enum AtReply {
    /// The command succeeded; carries the decoded response data.
    Ok(AtData),
    /// The radio rejected the command with a documented error status.
    Error(AtStatus),
    /// The radio answered with a status code outside the documented table.
    Unknown { status: u8, data: AtData },
}

impl AtReply {
    fn from_response(status: AtStatus, data: AtData) -> Self {
        match status {
            AtStatus::Ok => AtReply::Ok(data),
            AtStatus::Unknown(code) => AtReply::Unknown { status: code, data },
            error => AtReply::Error(error),
        }
    }

    /// Returns `true` for [`AtReply::Ok`].
    pub fn is_ok(&self) -> bool {
        matches!(self, AtReply::Ok(_))
    }
}

impl fmt::Display for AtReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AtReply::Ok(data) => write!(f, "ok {data:?}"),
            AtReply::Error(status) => write!(f, "error: {status}"),
            AtReply::Unknown { status, data } => {
                write!(f, "unknown status 0x{status:02X} {data:?}")
            }
        }
    }
}

/// The sending half handed to the IO task for one pending request.
pub(crate) type Waiter = oneshot::Sender<Result<AtReply>>;

/// What [`Correlator::dispatch`] did with a packet.
#[derive(Debug)]
pub(crate) enum Dispatch {
    /// The packet answered a pending request, which has been resolved.
    Resolved { frame_id: u8 },
    /// The packet was a response but nothing was waiting for its frame ID.
    Unexpected { frame_id: u8 },
    /// The packet is not a response; hand it to observers.
    Unsolicited(Packet),
}

/// Frame ID counter plus the table of in-flight requests.
#[derive(Debug, Default)]
pub(crate) struct Correlator {
    last_frame_id: u8,
    pending: HashMap<u8, Waiter>,
}

impl Correlator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the counter and return the next frame ID.
    ///
    /// Runs 1, 2, ..., 255 and then wraps to 1; 0 is never produced. IDs
    /// that are still pending are not skipped.
    pub fn allocate_frame_id(&mut self) -> u8 {
        self.last_frame_id = match self.last_frame_id {
            u8::MAX => 1,
            id => id + 1,
        };
        self.last_frame_id
    }

    /// Record a waiter for `frame_id`.
    ///
    /// Must happen before the request frame is written to the transport. A
    /// waiter already registered under the same ID is replaced and resolved
    /// with [`Error::Protocol`].
    pub fn register(&mut self, frame_id: u8, waiter: Waiter) {
        if let Some(replaced) = self.pending.insert(frame_id, waiter) {
            warn!(frame_id, "frame ID reused while a request was still pending");
            let _ = replaced.send(Err(Error::Protocol(format!(
                "frame ID {frame_id} reused by a newer request"
            ))));
        }
    }

    /// Remove a waiter without resolving it.
    pub fn take(&mut self, frame_id: u8) -> Option<Waiter> {
        self.pending.remove(&frame_id)
    }

    /// Number of requests still waiting for a response.
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Route a decoded packet: resolve its waiter if it is an AT response,
    /// otherwise give it back as unsolicited.
    pub fn dispatch(&mut self, packet: Packet) -> Dispatch {
        let (frame_id, status, data) = match packet {
            Packet::AtCommandResponse(resp) => (resp.frame_id, resp.status, resp.data),
            Packet::RemoteAtCommandResponse(resp) => (resp.frame_id, resp.status, resp.data),
            other => return Dispatch::Unsolicited(other),
        };

        let Some(waiter) = self.pending.remove(&frame_id) else {
            return Dispatch::Unexpected { frame_id };
        };
        if waiter
            .send(Ok(AtReply::from_response(status, data)))
            .is_err()
        {
            debug!(frame_id, "caller stopped waiting before the response arrived");
        }
        Dispatch::Resolved { frame_id }
    }

    /// Resolve every pending request with an error built by `error`.
    pub fn fail_all(&mut self, error: impl Fn() -> Error) {
        for (frame_id, waiter) in self.pending.drain() {
            debug!(frame_id, "failing pending request");
            let _ = waiter.send(Err(error()));
        }
    }
}

//! XBeeRadio -- the public handle for issuing AT commands.

use std::time::Duration;

use tokio::sync::broadcast;
use xbee_core::error::{Error, Result};
use xbee_core::transport::Transport;
use xbee_core::AtCommand;

use crate::correlate::AtReply;
use crate::events::XBeeEvent;
use crate::io::RadioIo;

/// Fixed bytes ahead of the parameter data in a local AT command payload.
const LOCAL_HEADER_LEN: usize = 4;
/// Fixed bytes ahead of the parameter data in a remote AT command payload.
const REMOTE_HEADER_LEN: usize = 15;

/// A connected XBee module in API mode.
///
/// Constructed via [`XBeeBuilder`](crate::builder::XBeeBuilder). All
/// traffic goes through the [`Transport`] provided at build time, which is
/// owned by a background IO task. The handle is cheap to share by
/// reference: concurrent `at_command` calls are correlated by frame ID.
pub struct XBeeRadio {
    io: Option<RadioIo>,
    event_tx: broadcast::Sender<XBeeEvent>,
    request_timeout: Option<Duration>,
}

impl Drop for XBeeRadio {
    fn drop(&mut self) {
        if let Some(io) = &self.io {
            io.cancel.cancel();
            // The task may be parked in a transport read that ignores the
            // token.
            io.task.abort();
        }
    }
}

impl XBeeRadio {
    pub(crate) fn new(
        io: RadioIo,
        event_tx: broadcast::Sender<XBeeEvent>,
        request_timeout: Option<Duration>,
    ) -> Self {
        XBeeRadio {
            io: Some(io),
            event_tx,
            request_timeout,
        }
    }

    /// Send an AT command to the local module and wait for its reply.
    ///
    /// `command` must be exactly two bytes long (`"NI"`, `"%V"`). `data` is
    /// the optional parameter; pass an empty slice to query.
    ///
    /// A rejection by the radio is an `Ok(AtReply::Error(..))`, not an
    /// `Err`. Unless a request timeout was configured on the builder, this
    /// waits for as long as the radio takes to answer.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidParameter`] if `command` is not two bytes or `data`
    ///   does not fit in one frame. Nothing is sent in that case.
    /// - [`Error::ConnectionLost`] if the transport failed while waiting.
    /// - [`Error::NotConnected`] if the IO task is no longer running.
    /// - [`Error::Timeout`] only when a request timeout is configured.
    pub async fn at_command(&self, command: &str, data: &[u8]) -> Result<AtReply> {
        let command = validate(command, data, LOCAL_HEADER_LEN)?;
        self.io()?
            .at_command(None, command, data.to_vec(), self.request_timeout)
            .await
    }

    /// Send an AT command to the remote node at `network_address`.
    ///
    /// The request is addressed by 16-bit network address with the 64-bit
    /// destination set to broadcast, and asks the node to apply changes
    /// immediately. Errors are as for [`at_command`](Self::at_command).
    pub async fn remote_at_command(
        &self,
        network_address: u16,
        command: &str,
        data: &[u8],
    ) -> Result<AtReply> {
        let command = validate(command, data, REMOTE_HEADER_LEN)?;
        self.io()?
            .at_command(
                Some(network_address),
                command,
                data.to_vec(),
                self.request_timeout,
            )
            .await
    }

    /// Subscribe to unsolicited packets and decode-time anomalies.
    pub fn subscribe(&self) -> broadcast::Receiver<XBeeEvent> {
        self.event_tx.subscribe()
    }

    /// Stop the IO task and hand back the transport.
    ///
    /// Requests still waiting for a response are resolved with
    /// [`Error::NotConnected`].
    pub async fn shutdown(mut self) -> Result<Box<dyn Transport>> {
        let io = self.io.take().ok_or(Error::NotConnected)?;
        io.shutdown().await
    }

    fn io(&self) -> Result<&RadioIo> {
        self.io.as_ref().ok_or(Error::NotConnected)
    }
}

fn validate(command: &str, data: &[u8], header_len: usize) -> Result<AtCommand> {
    let command = AtCommand::new(command.as_bytes())?;
    if header_len + data.len() > usize::from(u16::MAX) {
        return Err(Error::InvalidParameter(format!(
            "{} bytes of {command} parameter data do not fit in one frame",
            data.len()
        )));
    }
    Ok(command)
}

//! IO task types and implementation.
//!
//! This module defines the request protocol between [`XBeeRadio`] methods
//! and the single IO task that owns the transport, plus the IO task loop
//! itself.
//!
//! The IO task is the one place where frame IDs are allocated, waiters are
//! registered and responses are dispatched, so those steps never interleave
//! with each other. It handles: request encoding and transmission, stream
//! reassembly, packet decoding, response correlation, event publication,
//! and transport failure.
//!
//! [`XBeeRadio`]: crate::radio::XBeeRadio

use std::time::Duration;

use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use xbee_core::error::{Error, Result};
use xbee_core::transport::Transport;
use xbee_core::AtCommand;

use crate::commands;
use crate::correlate::{AtReply, Correlator, Dispatch};
use crate::events::XBeeEvent;
use crate::frame;
use crate::packet;
use crate::reassembler::{FrameReassembler, StreamItem};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Configuration for the IO task.
#[derive(Debug, Clone)]
pub(crate) struct IoConfig {
    /// How long a single transport read waits before the loop checks for
    /// requests and cancellation again.
    pub read_timeout: Duration,
}

/// A request sent from radio methods to the IO task.
pub(crate) enum Request {
    /// A local (`target: None`) or remote AT command.
    AtCommand {
        target: Option<u16>,
        command: AtCommand,
        data: Vec<u8>,
        reply: oneshot::Sender<Result<AtReply>>,
    },
    /// Graceful shutdown; returns the transport.
    Shutdown {
        reply: oneshot::Sender<Box<dyn Transport>>,
    },
}

/// Handle to the IO task. Stored inside `XBeeRadio`.
pub(crate) struct RadioIo {
    pub cmd_tx: mpsc::Sender<Request>,
    pub cancel: CancellationToken,
    pub task: JoinHandle<()>,
}

impl RadioIo {
    /// Queue an AT command and wait for the radio's reply.
    ///
    /// With `timeout: None` this waits until the response arrives or the IO
    /// task fails; there is no deadline.
    pub async fn at_command(
        &self,
        target: Option<u16>,
        command: AtCommand,
        data: Vec<u8>,
        timeout: Option<Duration>,
    ) -> Result<AtReply> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.cmd_tx
            .send(Request::AtCommand {
                target,
                command,
                data,
                reply: reply_tx,
            })
            .await
            .map_err(|_| Error::NotConnected)?;

        match timeout {
            None => reply_rx.await.map_err(|_| Error::NotConnected)?,
            Some(limit) => match tokio::time::timeout(limit, reply_rx).await {
                Ok(Ok(result)) => result,
                Ok(Err(_)) => Err(Error::NotConnected),
                Err(_) => Err(Error::Timeout),
            },
        }
    }

    /// Shut down the IO task and recover the transport.
    pub async fn shutdown(self) -> Result<Box<dyn Transport>> {
        let (reply_tx, reply_rx) = oneshot::channel();
        let _ = self
            .cmd_tx
            .send(Request::Shutdown { reply: reply_tx })
            .await;
        let transport = reply_rx.await.map_err(|_| Error::NotConnected)?;
        let _ = self.task.await;
        Ok(transport)
    }
}

// ---------------------------------------------------------------------------
// Spawn
// ---------------------------------------------------------------------------

/// Spawn the IO task. Returns the handle for sending requests.
pub(crate) fn spawn_io_task(
    transport: Box<dyn Transport>,
    config: IoConfig,
    event_tx: broadcast::Sender<XBeeEvent>,
) -> RadioIo {
    let (cmd_tx, cmd_rx) = mpsc::channel::<Request>(32);
    let cancel = CancellationToken::new();
    let cancel_clone = cancel.clone();

    let task = tokio::spawn(io_loop(transport, config, event_tx, cmd_rx, cancel_clone));

    RadioIo {
        cmd_tx,
        cancel,
        task,
    }
}

// ---------------------------------------------------------------------------
// IO Loop
// ---------------------------------------------------------------------------

/// Result of one pass of the read branch.
enum ReadOutcome {
    Bytes(Vec<u8>),
    Idle,
    Failed(Error),
}

/// The main IO loop. Runs as a spawned Tokio task.
///
/// Uses `tokio::select! { biased; }` to prioritize:
/// 1. Cancellation
/// 2. Request dispatch
/// 3. Reading inbound bytes
async fn io_loop(
    mut transport: Box<dyn Transport>,
    config: IoConfig,
    event_tx: broadcast::Sender<XBeeEvent>,
    mut cmd_rx: mpsc::Receiver<Request>,
    cancel: CancellationToken,
) {
    let mut reassembler = FrameReassembler::new();
    let mut correlator = Correlator::new();

    loop {
        tokio::select! {
            biased;

            _ = cancel.cancelled() => {
                debug!("IO task cancelled");
                correlator.fail_all(|| Error::NotConnected);
                break;
            }

            req = cmd_rx.recv() => {
                match req {
                    Some(Request::AtCommand { target, command, data, reply }) => {
                        let sent = send_at_command(
                            &mut *transport,
                            &mut correlator,
                            target,
                            command,
                            &data,
                            reply,
                        ).await;
                        if let Err(e) = sent {
                            warn!(error = %e, "transport failed while sending, stopping IO task");
                            fail_link(&mut correlator, &event_tx);
                            break;
                        }
                    }
                    Some(Request::Shutdown { reply }) => {
                        debug!("IO task shutdown requested");
                        correlator.fail_all(|| Error::NotConnected);
                        let _ = reply.send(transport);
                        return;
                    }
                    None => {
                        debug!("all request senders dropped, exiting IO task");
                        break;
                    }
                }
            }

            outcome = read_chunk(&mut *transport, config.read_timeout) => {
                match outcome {
                    ReadOutcome::Bytes(chunk) => {
                        process_chunk(&chunk, &mut reassembler, &mut correlator, &event_tx);
                    }
                    ReadOutcome::Idle => {}
                    ReadOutcome::Failed(e) => {
                        warn!(error = %e, "transport failed, stopping IO task");
                        fail_link(&mut correlator, &event_tx);
                        break;
                    }
                }
            }
        }
    }
}

/// Read whatever the transport has within `timeout`.
async fn read_chunk(transport: &mut dyn Transport, timeout: Duration) -> ReadOutcome {
    let mut buf = [0u8; 256];
    match transport.receive(&mut buf, timeout).await {
        Ok(n) if n > 0 => ReadOutcome::Bytes(buf[..n].to_vec()),
        Ok(_) => ReadOutcome::Idle,
        Err(Error::Timeout) => {
            // Yield briefly so the loop can check for requests or
            // cancellation even if the transport returns instantly.
            tokio::time::sleep(Duration::from_millis(10)).await;
            ReadOutcome::Idle
        }
        Err(e) => ReadOutcome::Failed(e),
    }
}

/// Resolve all waiters with a connection-lost error and announce it.
fn fail_link(correlator: &mut Correlator, event_tx: &broadcast::Sender<XBeeEvent>) {
    correlator.fail_all(|| Error::ConnectionLost);
    let _ = event_tx.send(XBeeEvent::Disconnected);
}

/// Whether a send error means the link itself is gone.
fn is_link_failure(e: &Error) -> bool {
    matches!(
        e,
        Error::ConnectionLost | Error::NotConnected | Error::Transport(_) | Error::Io(_)
    )
}

// ---------------------------------------------------------------------------
// Request handling
// ---------------------------------------------------------------------------

/// Allocate a frame ID, register the waiter, and write the request frame.
///
/// The waiter is registered before the frame reaches the transport, so a
/// response can never arrive ahead of its registration. Errors that only
/// concern this request are delivered to its caller; the returned error is
/// reserved for link failures.
async fn send_at_command(
    transport: &mut dyn Transport,
    correlator: &mut Correlator,
    target: Option<u16>,
    command: AtCommand,
    data: &[u8],
    reply: oneshot::Sender<Result<AtReply>>,
) -> Result<()> {
    let frame_id = correlator.allocate_frame_id();
    let payload = match target {
        None => commands::build_local_at(frame_id, command, data),
        Some(network_address) => {
            commands::build_remote_at(frame_id, network_address, command, data)
        }
    };
    let bytes = match frame::encode_frame(&payload) {
        Ok(bytes) => bytes,
        Err(e) => {
            let _ = reply.send(Err(e));
            return Ok(());
        }
    };

    correlator.register(frame_id, reply);
    debug!(
        frame_id,
        %command,
        ?target,
        pending = correlator.pending_count(),
        "sending AT command"
    );

    match transport.send(&bytes).await {
        Ok(()) => Ok(()),
        Err(e) if is_link_failure(&e) => Err(e),
        Err(e) => {
            if let Some(waiter) = correlator.take(frame_id) {
                let _ = waiter.send(Err(e));
            }
            Ok(())
        }
    }
}

// ---------------------------------------------------------------------------
// Inbound processing
// ---------------------------------------------------------------------------

/// Feed a received chunk through reassembly, decoding and dispatch.
fn process_chunk(
    chunk: &[u8],
    reassembler: &mut FrameReassembler,
    correlator: &mut Correlator,
    event_tx: &broadcast::Sender<XBeeEvent>,
) {
    for item in reassembler.feed(chunk) {
        let event = match item {
            StreamItem::Frame(payload) => match packet::decode_packet(&payload) {
                Ok(packet) => match correlator.dispatch(packet) {
                    Dispatch::Resolved { frame_id } => {
                        debug!(frame_id, "resolved pending AT command");
                        continue;
                    }
                    Dispatch::Unexpected { frame_id } => {
                        warn!(frame_id, "AT response with no pending request, dropping");
                        XBeeEvent::UnexpectedResponse { frame_id }
                    }
                    Dispatch::Unsolicited(packet) => {
                        debug!(frame_type = packet.frame_type(), ?packet, "received packet");
                        XBeeEvent::Packet(packet)
                    }
                },
                Err(e) => {
                    warn!(error = %e, "failed to decode API frame payload");
                    XBeeEvent::DecodeFailed {
                        frame_type: payload.first().copied(),
                        reason: e.to_string(),
                    }
                }
            },
            StreamItem::ChecksumMismatch {
                expected,
                actual,
                length,
            } => XBeeEvent::ChecksumMismatch {
                expected,
                actual,
                length,
            },
            StreamItem::Discarded(bytes) => XBeeEvent::Discarded { bytes },
        };
        // No subscribers is fine; the event has already been logged.
        let _ = event_tx.send(event);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! Mock transport for deterministic testing of the protocol engine.
//!
//! [`MockTransport`] implements the [`Transport`] trait with pre-loaded
//! request/response pairs plus an inbound queue for unsolicited traffic.
//! This lets you test API frame encoding, response correlation, and stream
//! reassembly without real hardware.
//!
//! # Example
//!
//! ```
//! use xbee_test_harness::MockTransport;
//!
//! let mut mock = MockTransport::new();
//! // When the driver sends `ATNI` with frame ID 1, answer "node1".
//! mock.expect(
//!     &[0x7E, 0x00, 0x04, 0x08, 0x01, 0x4E, 0x49, 0x5F],
//!     &[0x7E, 0x00, 0x0A, 0x88, 0x01, 0x4E, 0x49, 0x00, 0x6E, 0x6F, 0x64, 0x65, 0x31, 0x08],
//! );
//! // Deliver the reply three bytes per read.
//! mock.set_chunk_size(3);
//! ```

use async_trait::async_trait;
use std::collections::VecDeque;
use std::time::Duration;

use xbee_core::error::{Error, Result};
use xbee_core::transport::Transport;

/// A pre-loaded request/response pair for the mock transport.
#[derive(Debug, Clone)]
struct Expectation {
    /// The exact bytes we expect to be sent.
    request: Vec<u8>,
    /// The bytes queued for reading once the matching request is sent.
    response: Vec<u8>,
}

/// A mock [`Transport`] for testing the driver without hardware.
///
/// Expectations are consumed in order. When `send()` is called, the sent
/// data is recorded and matched against the next expectation; the
/// corresponding response is appended to the inbound queue. `receive()`
/// drains the inbound queue, at most [`set_chunk_size`] bytes per call.
///
/// If no expectation matches or the queue is exhausted, `send()` returns a
/// protocol error.
///
/// [`set_chunk_size`]: MockTransport::set_chunk_size
#[derive(Debug)]
pub struct MockTransport {
    /// Ordered queue of expected request/response pairs.
    expectations: VecDeque<Expectation>,
    /// Bytes waiting to be returned by `receive()`.
    inbound: VecDeque<u8>,
    /// Upper bound on bytes returned by one `receive()` call.
    chunk_size: Option<usize>,
    /// Report a lost link once there is nothing left to do.
    disconnect_when_idle: bool,
    /// Whether the transport is "connected".
    connected: bool,
    /// Log of all bytes sent through this transport.
    sent_log: Vec<Vec<u8>>,
}

impl MockTransport {
    /// Create a new mock transport in the connected state.
    pub fn new() -> Self {
        MockTransport {
            expectations: VecDeque::new(),
            inbound: VecDeque::new(),
            chunk_size: None,
            disconnect_when_idle: false,
            connected: true,
            sent_log: Vec::new(),
        }
    }

    /// Add an expected request/response pair.
    ///
    /// When `send()` is called with data matching `request`, the bytes of
    /// `response` become readable. An empty response models a radio that
    /// never answers.
    pub fn expect(&mut self, request: &[u8], response: &[u8]) {
        self.expectations.push_back(Expectation {
            request: request.to_vec(),
            response: response.to_vec(),
        });
    }

    /// Queue bytes that arrive without being asked for, such as a modem
    /// status frame or a packet from another node.
    pub fn push_inbound(&mut self, data: &[u8]) {
        self.inbound.extend(data);
    }

    /// Limit every `receive()` to at most `size` bytes, to exercise
    /// reassembly of frames split across reads.
    pub fn set_chunk_size(&mut self, size: usize) {
        self.chunk_size = Some(size.max(1));
    }

    /// Make `receive()` fail with [`Error::ConnectionLost`] once every
    /// expectation has been consumed and the inbound queue is empty.
    pub fn disconnect_when_idle(&mut self) {
        self.disconnect_when_idle = true;
    }

    /// Return a reference to all data that has been sent through this transport.
    ///
    /// Each element is the byte slice from one `send()` call.
    pub fn sent_data(&self) -> &[Vec<u8>] {
        &self.sent_log
    }

    /// Return the number of expectations that have not yet been consumed.
    pub fn remaining_expectations(&self) -> usize {
        self.expectations.len()
    }

    /// Set the connected state of the mock transport.
    ///
    /// When set to `false`, subsequent `send()` and `receive()` calls will
    /// return [`Error::NotConnected`].
    pub fn set_connected(&mut self, connected: bool) {
        self.connected = connected;
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&mut self, data: &[u8]) -> Result<()> {
        if !self.connected {
            return Err(Error::NotConnected);
        }

        self.sent_log.push(data.to_vec());

        let Some(expectation) = self.expectations.pop_front() else {
            return Err(Error::Protocol(
                "no more expectations in mock transport".into(),
            ));
        };
        if data != expectation.request.as_slice() {
            return Err(Error::Protocol(format!(
                "unexpected send data: expected {:02X?}, got {:02X?}",
                expectation.request, data
            )));
        }
        self.inbound.extend(expectation.response);
        Ok(())
    }

    async fn receive(&mut self, buf: &mut [u8], _timeout: Duration) -> Result<usize> {
        if !self.connected {
            return Err(Error::NotConnected);
        }

        if self.inbound.is_empty() {
            if self.disconnect_when_idle && self.expectations.is_empty() {
                self.connected = false;
                return Err(Error::ConnectionLost);
            }
            return Err(Error::Timeout);
        }

        let limit = self.chunk_size.unwrap_or(buf.len()).min(buf.len());
        let n = limit.min(self.inbound.len());
        for (slot, byte) in buf.iter_mut().zip(self.inbound.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }

    async fn close(&mut self) -> Result<()> {
        self.connected = false;
        self.inbound.clear();
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xbee_core::transport::Transport;

    const NI_REQUEST: &[u8] = &[0x7E, 0x00, 0x04, 0x08, 0x01, 0x4E, 0x49, 0x5F];

    #[tokio::test]
    async fn mock_transport_basic_send_receive() {
        let mut mock = MockTransport::new();
        let response = &[0x7E, 0x00, 0x05, 0x88, 0x01, 0x4E, 0x49, 0x00, 0xDF];

        mock.expect(NI_REQUEST, response);
        mock.send(NI_REQUEST).await.unwrap();

        let mut buf = [0u8; 64];
        let n = mock
            .receive(&mut buf, Duration::from_millis(100))
            .await
            .unwrap();

        assert_eq!(n, response.len());
        assert_eq!(&buf[..n], response);
    }

    #[tokio::test]
    async fn mock_transport_tracks_sent_data() {
        let mut mock = MockTransport::new();
        let req1 = &[0x01, 0x02];
        let req2 = &[0x03, 0x04];

        mock.expect(req1, &[0xFF]);
        mock.expect(req2, &[0xFE]);

        mock.send(req1).await.unwrap();
        mock.send(req2).await.unwrap();

        assert_eq!(mock.sent_data().len(), 2);
        assert_eq!(mock.sent_data()[0], req1);
        assert_eq!(mock.sent_data()[1], req2);
    }

    #[tokio::test]
    async fn mock_transport_wrong_data_errors() {
        let mut mock = MockTransport::new();
        mock.expect(&[0x01], &[0xFF]);

        let result = mock.send(&[0x99]).await;
        assert!(matches!(result.unwrap_err(), Error::Protocol(_)));
    }

    #[tokio::test]
    async fn mock_transport_no_expectations_errors() {
        let mut mock = MockTransport::new();

        let result = mock.send(&[0x01]).await;
        assert!(matches!(result.unwrap_err(), Error::Protocol(_)));
    }

    #[tokio::test]
    async fn mock_transport_receive_without_send_times_out() {
        let mut mock = MockTransport::new();
        let mut buf = [0u8; 64];

        let result = mock.receive(&mut buf, Duration::from_millis(10)).await;
        assert!(matches!(result.unwrap_err(), Error::Timeout));
    }

    #[tokio::test]
    async fn mock_transport_disconnect() {
        let mut mock = MockTransport::new();
        assert!(mock.is_connected());

        mock.close().await.unwrap();
        assert!(!mock.is_connected());

        let result = mock.send(&[0x01]).await;
        assert!(matches!(result.unwrap_err(), Error::NotConnected));
    }

    #[tokio::test]
    async fn mock_transport_set_connected() {
        let mut mock = MockTransport::new();
        mock.set_connected(false);
        assert!(!mock.is_connected());

        let mut buf = [0u8; 8];
        let result = mock.receive(&mut buf, Duration::from_millis(10)).await;
        assert!(matches!(result.unwrap_err(), Error::NotConnected));
    }

    #[tokio::test]
    async fn mock_transport_remaining_expectations() {
        let mut mock = MockTransport::new();
        mock.expect(&[0x01], &[0xFF]);
        mock.expect(&[0x02], &[0xFE]);
        assert_eq!(mock.remaining_expectations(), 2);

        mock.send(&[0x01]).await.unwrap();
        assert_eq!(mock.remaining_expectations(), 1);

        mock.send(&[0x02]).await.unwrap();
        assert_eq!(mock.remaining_expectations(), 0);
    }

    #[tokio::test]
    async fn mock_transport_chunked_receive() {
        let mut mock = MockTransport::new();
        mock.expect(&[0x01], &[0xAA, 0xBB, 0xCC, 0xDD, 0xEE]);
        mock.set_chunk_size(2);

        mock.send(&[0x01]).await.unwrap();

        let mut buf = [0u8; 64];
        let mut reads = Vec::new();
        while let Ok(n) = mock.receive(&mut buf, Duration::from_millis(10)).await {
            reads.push(buf[..n].to_vec());
        }
        assert_eq!(
            reads,
            vec![vec![0xAA, 0xBB], vec![0xCC, 0xDD], vec![0xEE]]
        );
    }

    #[tokio::test]
    async fn mock_transport_push_inbound_without_request() {
        let mut mock = MockTransport::new();
        mock.push_inbound(&[0x7E, 0x00, 0x02, 0x8A, 0x02, 0x73]);

        let mut buf = [0u8; 64];
        let n = mock
            .receive(&mut buf, Duration::from_millis(10))
            .await
            .unwrap();
        assert_eq!(&buf[..n], &[0x7E, 0x00, 0x02, 0x8A, 0x02, 0x73]);
        assert!(mock.sent_data().is_empty());
    }

    #[tokio::test]
    async fn mock_transport_disconnects_once_idle() {
        let mut mock = MockTransport::new();
        mock.expect(&[0x01], &[0xFF]);
        mock.disconnect_when_idle();

        // An expectation is still outstanding, so this is just a timeout.
        let mut buf = [0u8; 8];
        let result = mock.receive(&mut buf, Duration::from_millis(10)).await;
        assert!(matches!(result.unwrap_err(), Error::Timeout));

        mock.send(&[0x01]).await.unwrap();
        assert_eq!(
            mock.receive(&mut buf, Duration::from_millis(10))
                .await
                .unwrap(),
            1
        );

        let result = mock.receive(&mut buf, Duration::from_millis(10)).await;
        assert!(matches!(result.unwrap_err(), Error::ConnectionLost));
        assert!(!mock.is_connected());
    }
}

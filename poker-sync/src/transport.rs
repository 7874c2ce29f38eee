//! The transport capability the reconciler is built on.
//!
//! A transport does two things: accept outbound [`Request`]s without
//! blocking, and deliver [`TransportEvent`]s on a channel handed to the
//! reconciler. [`WsTransport`](crate::ws::WsTransport) talks to a real
//! server; [`MemoryTransport`] records requests for tests and demos.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use poker_core::{Ack, Request, RequestKind, ServerEvent};
use thiserror::Error;

use crate::protocol::ProtocolError;

/// Something that happened on the transport.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    /// Server broadcast or synthesized connection diagnostic.
    Server(ServerEvent),
    /// Reply to an acknowledged request. Logged only.
    Ack { kind: RequestKind, ack: Ack },
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Transport not connected")]
    NotConnected,
    #[error("Outgoing channel full")]
    Backpressure,
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

/// Outbound half of a connection to the session server.
///
/// `send` must not block; delivery is best effort.
pub trait Transport: Send + 'static {
    fn send(&mut self, request: Request) -> Result<(), TransportError>;
}

/// In-memory transport that records every request.
///
/// Clones share the same log, so a test can keep one clone while the
/// reconciler owns another.
#[derive(Debug, Clone)]
pub struct MemoryTransport {
    sent: Arc<Mutex<Vec<Request>>>,
    connected: Arc<AtomicBool>,
}

impl Default for MemoryTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryTransport {
    /// Create a connected transport with an empty log.
    pub fn new() -> Self {
        Self {
            sent: Arc::new(Mutex::new(Vec::new())),
            connected: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Requests sent so far.
    pub fn sent(&self) -> Vec<Request> {
        self.sent.lock().map(|log| log.clone()).unwrap_or_default()
    }

    /// Drain the log.
    pub fn take_sent(&self) -> Vec<Request> {
        self.sent
            .lock()
            .map(|mut log| std::mem::take(&mut *log))
            .unwrap_or_default()
    }

    /// Simulate losing or regaining the connection.
    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }
}

impl Transport for MemoryTransport {
    fn send(&mut self, request: Request) -> Result<(), TransportError> {
        if !self.connected.load(Ordering::SeqCst) {
            return Err(TransportError::NotConnected);
        }
        self.sent
            .lock()
            .map_err(|_| TransportError::NotConnected)?
            .push(request);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_transport_records() {
        let observer = MemoryTransport::new();
        let mut transport = observer.clone();

        transport
            .send(Request::RevealVotes { room: "R1".into() })
            .unwrap();
        assert_eq!(observer.sent(), vec![Request::RevealVotes { room: "R1".into() }]);
    }

    #[test]
    fn test_memory_transport_disconnected() {
        let mut transport = MemoryTransport::new();
        transport.set_connected(false);

        let err = transport.send(Request::ResetVotes { room: "R1".into() });
        assert!(matches!(err, Err(TransportError::NotConnected)));
        assert!(transport.sent().is_empty());
    }

    #[test]
    fn test_take_sent_drains() {
        let mut transport = MemoryTransport::new();
        transport.send(Request::ResetVotes { room: "R1".into() }).unwrap();
        assert_eq!(transport.take_sent().len(), 1);
        assert!(transport.sent().is_empty());
    }
}

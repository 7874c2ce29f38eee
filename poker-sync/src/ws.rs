//! WebSocket transport to the session server.
//!
//! Provides:
//! - Connection setup with a handshake timeout
//! - A writer task fed by a bounded channel, so `send` never blocks
//! - A reader task decoding frames into [`TransportEvent`]s
//! - Acknowledgment matching by frame id
//!
//! There is no reconnection: a dropped connection surfaces as a
//! `connection-error` diagnostic and the embedding application decides what
//! to do next.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use log::{debug, info, warn};
use poker_core::{Request, RequestKind, ServerEvent};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_tungstenite::tungstenite::Message;

use crate::config::ClientConfig;
use crate::protocol::{Frame, Inbound, ProtocolError};
use crate::reconciler::{Reconciler, ReconcilerHandle};
use crate::transport::{Transport, TransportError, TransportEvent};

/// Client connection state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

#[derive(Debug, Clone, Copy)]
struct PendingAck {
    kind: RequestKind,
    sent_at: Instant,
}

/// Acknowledgments awaiting a reply, keyed by frame id.
#[derive(Debug, Default)]
struct AckTable {
    next_id: u64,
    pending: HashMap<u64, PendingAck>,
}

impl AckTable {
    fn register(&mut self, kind: RequestKind) -> u64 {
        self.next_id += 1;
        self.pending.insert(
            self.next_id,
            PendingAck {
                kind,
                sent_at: Instant::now(),
            },
        );
        self.next_id
    }

    fn resolve(&mut self, id: u64) -> Option<RequestKind> {
        self.pending.remove(&id).map(|p| p.kind)
    }

    /// Forget acknowledgments older than `timeout`, returning their kinds.
    fn expire(&mut self, timeout: Duration) -> Vec<RequestKind> {
        let now = Instant::now();
        let mut expired = Vec::new();
        self.pending.retain(|_, p| {
            let keep = now.duration_since(p.sent_at) < timeout;
            if !keep {
                expired.push(p.kind);
            }
            keep
        });
        expired
    }
}

/// Outbound half of a WebSocket connection.
pub struct WsTransport {
    outgoing_tx: mpsc::Sender<String>,
    acks: Arc<Mutex<AckTable>>,
    ack_timeout: Duration,
    state: watch::Receiver<ConnectionState>,
}

impl WsTransport {
    /// Connect to `config.server_url`.
    ///
    /// Spawns reader and writer tasks and returns the transport together
    /// with the receiver of its events. The first event is always
    /// `connected`.
    pub async fn connect(
        config: &ClientConfig,
    ) -> Result<(Self, mpsc::Receiver<TransportEvent>), ProtocolError> {
        let (state_tx, state_rx) = watch::channel(ConnectionState::Connecting);

        let ws_stream = match tokio::time::timeout(
            config.connect_timeout,
            tokio_tungstenite::connect_async(config.server_url.as_str()),
        )
        .await
        {
            Ok(Ok((stream, _))) => stream,
            Ok(Err(e)) => {
                state_tx.send_replace(ConnectionState::Disconnected);
                return Err(ProtocolError::ConnectionFailed(e.to_string()));
            }
            Err(_) => {
                state_tx.send_replace(ConnectionState::Disconnected);
                return Err(ProtocolError::Timeout);
            }
        };
        let (mut ws_writer, mut ws_reader) = ws_stream.split();

        let capacity = config.channel_capacity.max(1);
        let (out_tx, mut out_rx) = mpsc::channel::<String>(capacity);
        let (event_tx, event_rx) = mpsc::channel::<TransportEvent>(capacity);
        let acks = Arc::new(Mutex::new(AckTable::default()));

        // Writer task: forward outgoing channel to WebSocket
        tokio::spawn(async move {
            while let Some(text) = out_rx.recv().await {
                if ws_writer.send(Message::Text(text.into())).await.is_err() {
                    break;
                }
            }
            let _ = ws_writer.close().await;
        });

        state_tx.send_replace(ConnectionState::Connected);
        info!("connected to {}", config.server_url);
        let _ = event_tx.send(TransportEvent::Server(ServerEvent::Connected)).await;

        // Reader task: decode incoming frames
        let reader_acks = acks.clone();
        tokio::spawn(async move {
            let mut close_reason = ProtocolError::ConnectionClosed.to_string();
            while let Some(msg) = ws_reader.next().await {
                let text = match msg {
                    Ok(Message::Text(text)) => text,
                    Ok(Message::Close(_)) => break,
                    Ok(_) => continue,
                    Err(e) => {
                        close_reason = e.to_string();
                        break;
                    }
                };
                let inbound = match Frame::decode(text.as_str()).and_then(Frame::into_inbound) {
                    Ok(inbound) => inbound,
                    Err(e) => {
                        warn!("dropping inbound frame: {e}");
                        continue;
                    }
                };
                let event = match inbound {
                    Inbound::Event(event) => TransportEvent::Server(event),
                    Inbound::Ack { id, ack } => {
                        let kind = reader_acks.lock().ok().and_then(|mut t| t.resolve(id));
                        match kind {
                            Some(kind) => TransportEvent::Ack { kind, ack },
                            None => {
                                debug!("acknowledgment {id} matches no pending request");
                                continue;
                            }
                        }
                    }
                };
                if event_tx.send(event).await.is_err() {
                    debug!("event receiver dropped, closing reader");
                    break;
                }
            }

            state_tx.send_replace(ConnectionState::Disconnected);
            let _ = event_tx
                .send(TransportEvent::Server(ServerEvent::ConnectionError(close_reason)))
                .await;
        });

        let transport = Self {
            outgoing_tx: out_tx,
            acks,
            ack_timeout: config.ack_timeout,
            state: state_rx,
        };
        Ok((transport, event_rx))
    }

    /// Get the current connection state.
    pub fn connection_state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Number of requests still waiting for an acknowledgment.
    pub fn pending_acks(&self) -> usize {
        self.acks.lock().map(|t| t.pending.len()).unwrap_or(0)
    }

    fn enqueue(&self, request: &Request, ack: Option<u64>) -> Result<(), TransportError> {
        let text = Frame::from_request(request, ack)?.encode()?;
        self.outgoing_tx.try_send(text).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => TransportError::Backpressure,
            mpsc::error::TrySendError::Closed(_) => TransportError::NotConnected,
        })
    }
}

impl Transport for WsTransport {
    fn send(&mut self, request: Request) -> Result<(), TransportError> {
        if self.connection_state() != ConnectionState::Connected {
            return Err(TransportError::NotConnected);
        }

        let kind = request.kind();
        let ack = if kind.expects_ack() {
            let mut table = self.acks.lock().map_err(|_| TransportError::NotConnected)?;
            for stale in table.expire(self.ack_timeout) {
                warn!("no acknowledgment for {stale} within {:?}", self.ack_timeout);
            }
            Some(table.register(kind))
        } else {
            None
        };

        let result = self.enqueue(&request, ack);
        if let (Err(_), Some(id)) = (&result, ack) {
            // The frame never left, so no acknowledgment will come for it.
            if let Ok(mut table) = self.acks.lock() {
                table.resolve(id);
            }
        }
        result
    }
}

/// Connect to the server and run a reconciler on top of the connection.
pub async fn connect_session(
    config: &ClientConfig,
) -> Result<(ReconcilerHandle, JoinHandle<()>), ProtocolError> {
    let (transport, events) = WsTransport::connect(config).await?;
    Ok(Reconciler::spawn(transport, events, config))
}

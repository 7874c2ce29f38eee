//! # poker-sync — session reconciler for planning-poker rooms
//!
//! Keeps a participant's local view of a room consistent with the
//! server-authoritative state broadcast over a WebSocket.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────┐   JSON frames    ┌───────────────┐
//! │ WsTransport      │ ◄──────────────► │ Session server│
//! │ (reader/writer)  │                  │ (authority)   │
//! └────────┬─────────┘                  └───────────────┘
//!          │ TransportEvent
//!          ▼
//! ┌──────────────────┐  Tick  ┌─────────────────┐
//! │ Reconciler       │ ◄───── │ CountdownTicker │
//! │ (single queue)   │        │ (cancellable)   │
//! └────────┬─────────┘        └─────────────────┘
//!          │ SessionSnapshot (watch)
//!          ▼
//!     observers / views
//! ```
//!
//! ## Modules
//!
//! - [`protocol`] — JSON event frames and their decoding
//! - [`transport`] — the `Transport` capability and an in-memory double
//! - [`ws`] — WebSocket transport
//! - [`ticker`] — cancellable countdown tick task
//! - [`reconciler`] — the event loop and its handle
//! - [`config`] — client configuration

pub mod config;
pub mod protocol;
pub mod reconciler;
pub mod ticker;
pub mod transport;
pub mod ws;

// Re-exports for convenience
pub use config::ClientConfig;
pub use protocol::{Frame, Inbound, ProtocolError};
pub use reconciler::{Input, Reconciler, ReconcilerClosed, ReconcilerHandle};
pub use ticker::CountdownTicker;
pub use transport::{MemoryTransport, Transport, TransportError, TransportEvent};
pub use ws::{connect_session, ConnectionState, WsTransport};

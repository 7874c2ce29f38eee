//! Typed inbound events and outbound requests.
//!
//! These are the session's view of the protocol; wire encoding lives in
//! `poker-sync`.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::chat::ChatMessage;
use crate::ledger::VoteMap;
use crate::roster::RosterMap;

/// Authoritative state pushed by the session server.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerEvent {
    /// Full participant list (`updateParticipants` or the join reply).
    Roster(RosterMap),
    /// Final tally; opens the reveal gate.
    VotesRevealed(VoteMap),
    /// Voting progress. `None` when the payload was not a mapping.
    VotesProgress(Option<VoteMap>),
    /// Chat history or the latest messages.
    ChatBatch(Vec<ChatMessage>),
    /// Transport connected. Diagnostic only.
    Connected,
    /// Transport failure. Diagnostic only.
    ConnectionError(String),
}

impl ServerEvent {
    /// Event name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Roster(_) => "roster-snapshot",
            Self::VotesRevealed(_) => "votes-revealed",
            Self::VotesProgress(_) => "votes-progress",
            Self::ChatBatch(_) => "chat-batch",
            Self::Connected => "connected",
            Self::ConnectionError(_) => "connection-error",
        }
    }
}

/// Requests sent to the session server. Fire-and-forget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Request {
    CreateRoom { room: String },
    JoinRoom { room: String, user: String },
    CastVote { room: String, user: String, value: String },
    RevealVotes { room: String },
    ResetVotes { room: String },
    SendChat { room: String, user: String, message: String },
}

impl Request {
    /// The kind of this request.
    pub fn kind(&self) -> RequestKind {
        match self {
            Self::CreateRoom { .. } => RequestKind::CreateRoom,
            Self::JoinRoom { .. } => RequestKind::JoinRoom,
            Self::CastVote { .. } => RequestKind::CastVote,
            Self::RevealVotes { .. } => RequestKind::RevealVotes,
            Self::ResetVotes { .. } => RequestKind::ResetVotes,
            Self::SendChat { .. } => RequestKind::SendChat,
        }
    }

    /// Room the request targets.
    pub fn room(&self) -> &str {
        match self {
            Self::CreateRoom { room }
            | Self::JoinRoom { room, .. }
            | Self::CastVote { room, .. }
            | Self::RevealVotes { room }
            | Self::ResetVotes { room }
            | Self::SendChat { room, .. } => room,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RequestKind {
    CreateRoom,
    JoinRoom,
    CastVote,
    RevealVotes,
    ResetVotes,
    SendChat,
}

impl RequestKind {
    /// Requests the server answers with an acknowledgment.
    pub fn expects_ack(self) -> bool {
        matches!(self, Self::CreateRoom | Self::JoinRoom | Self::SendChat)
    }
}

impl fmt::Display for RequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::CreateRoom => "create-room",
            Self::JoinRoom => "join-room",
            Self::CastVote => "cast-vote",
            Self::RevealVotes => "reveal-votes",
            Self::ResetVotes => "reset-votes",
            Self::SendChat => "send-chat",
        };
        f.write_str(name)
    }
}

/// Server reply to an acknowledged request.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Ack {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

//! JSON event-frame protocol spoken with the session server.
//!
//! Every WebSocket text message carries one frame:
//! ```text
//! { "event": "<name>", "data": <payload>, "ack": <id, optional> }
//! ```
//!
//! Outbound frames that expect an acknowledgment carry an `ack` id; the
//! server answers with an `"ack"` frame holding the same id and a
//! `{ success, message }` payload.
//!
//! | Direction | Event | Payload |
//! |-----------|-------|---------|
//! | in  | `updateParticipants`, `getParticipantsResponse` | `{ participants: {name: status} }` |
//! | in  | `votesRevealed` | `{ votes: {name: value} }` |
//! | in  | `updateVotes` | `{ votes: {name: value} }` (may be malformed) |
//! | in  | `updateChat` | `[{ user, message }]` |
//! | in  | `ack` | `{ success, message }` |
//! | out | `createRoom` | `{ roomId }` |
//! | out | `joinRoom` | `{ roomId, user }` |
//! | out | `sendVote` | `{ roomId, user, vote }` |
//! | out | `revealVotes`, `resetVotes` | `{ roomId }` |
//! | out | `sendMessage` | `{ roomId, user, message }` |

use indexmap::IndexMap;
use poker_core::{Ack, ChatMessage, Request, ServerEvent};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub const EVENT_UPDATE_PARTICIPANTS: &str = "updateParticipants";
pub const EVENT_PARTICIPANTS_RESPONSE: &str = "getParticipantsResponse";
pub const EVENT_VOTES_REVEALED: &str = "votesRevealed";
pub const EVENT_UPDATE_VOTES: &str = "updateVotes";
pub const EVENT_UPDATE_CHAT: &str = "updateChat";
pub const EVENT_ACK: &str = "ack";

pub const EVENT_CREATE_ROOM: &str = "createRoom";
pub const EVENT_JOIN_ROOM: &str = "joinRoom";
pub const EVENT_SEND_VOTE: &str = "sendVote";
pub const EVENT_REVEAL_VOTES: &str = "revealVotes";
pub const EVENT_RESET_VOTES: &str = "resetVotes";
pub const EVENT_SEND_MESSAGE: &str = "sendMessage";

/// Protocol errors.
#[derive(Debug, Clone, Error)]
pub enum ProtocolError {
    #[error("Serialization error: {0}")]
    SerializationError(String),
    #[error("Deserialization error: {0}")]
    DeserializationError(String),
    #[error("Unknown event: {0}")]
    UnknownEvent(String),
    #[error("Malformed {0} payload")]
    MalformedPayload(&'static str),
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),
    #[error("Connection closed")]
    ConnectionClosed,
    #[error("Connection timeout")]
    Timeout,
}

/// One wire frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub event: String,
    #[serde(default)]
    pub data: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ack: Option<u64>,
}

/// A decoded inbound frame.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    Event(ServerEvent),
    Ack { id: u64, ack: Ack },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RoomPayload<'a> {
    room_id: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JoinPayload<'a> {
    room_id: &'a str,
    user: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VotePayload<'a> {
    room_id: &'a str,
    user: &'a str,
    vote: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct MessagePayload<'a> {
    room_id: &'a str,
    user: &'a str,
    message: &'a str,
}

impl Frame {
    /// Build the outbound frame for a request.
    pub fn from_request(request: &Request, ack: Option<u64>) -> Result<Self, ProtocolError> {
        let (event, data) = match request {
            Request::CreateRoom { room } => {
                (EVENT_CREATE_ROOM, to_value(&RoomPayload { room_id: room })?)
            }
            Request::JoinRoom { room, user } => (
                EVENT_JOIN_ROOM,
                to_value(&JoinPayload { room_id: room, user })?,
            ),
            Request::CastVote { room, user, value } => (
                EVENT_SEND_VOTE,
                to_value(&VotePayload {
                    room_id: room,
                    user,
                    vote: value,
                })?,
            ),
            Request::RevealVotes { room } => {
                (EVENT_REVEAL_VOTES, to_value(&RoomPayload { room_id: room })?)
            }
            Request::ResetVotes { room } => {
                (EVENT_RESET_VOTES, to_value(&RoomPayload { room_id: room })?)
            }
            Request::SendChat {
                room,
                user,
                message,
            } => (
                EVENT_SEND_MESSAGE,
                to_value(&MessagePayload {
                    room_id: room,
                    user,
                    message,
                })?,
            ),
        };
        Ok(Self {
            event: event.to_string(),
            data,
            ack,
        })
    }

    /// Serialize to a text frame.
    pub fn encode(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(self).map_err(|e| ProtocolError::SerializationError(e.to_string()))
    }

    /// Deserialize from a text frame.
    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(text).map_err(|e| ProtocolError::DeserializationError(e.to_string()))
    }

    /// Interpret an inbound frame.
    ///
    /// A non-mapping `updateVotes` payload is not an error: it becomes an
    /// empty progress snapshot. Every other malformed payload is rejected
    /// whole so no sub-store sees a partial update.
    pub fn into_inbound(self) -> Result<Inbound, ProtocolError> {
        let event = match self.event.as_str() {
            EVENT_UPDATE_PARTICIPANTS | EVENT_PARTICIPANTS_RESPONSE => {
                let participants = field(&self.data, "participants")
                    .and_then(Value::as_object)
                    .ok_or(ProtocolError::MalformedPayload("participants"))?;
                ServerEvent::Roster(labels_of(participants))
            }
            EVENT_VOTES_REVEALED => {
                let votes = field(&self.data, "votes")
                    .and_then(Value::as_object)
                    .ok_or(ProtocolError::MalformedPayload("votesRevealed"))?;
                ServerEvent::VotesRevealed(votes_of(votes))
            }
            EVENT_UPDATE_VOTES => ServerEvent::VotesProgress(
                field(&self.data, "votes")
                    .and_then(Value::as_object)
                    .map(votes_of),
            ),
            EVENT_UPDATE_CHAT => {
                let batch: Vec<ChatMessage> = serde_json::from_value(self.data)
                    .map_err(|_| ProtocolError::MalformedPayload("updateChat"))?;
                ServerEvent::ChatBatch(batch)
            }
            EVENT_ACK => {
                let id = self.ack.ok_or(ProtocolError::MalformedPayload("ack"))?;
                let ack: Ack = serde_json::from_value(self.data).unwrap_or_default();
                return Ok(Inbound::Ack { id, ack });
            }
            other => return Err(ProtocolError::UnknownEvent(other.to_string())),
        };
        Ok(Inbound::Event(event))
    }
}

fn to_value<T: Serialize>(payload: &T) -> Result<Value, ProtocolError> {
    serde_json::to_value(payload).map_err(|e| ProtocolError::SerializationError(e.to_string()))
}

fn field<'a>(data: &'a Value, key: &str) -> Option<&'a Value> {
    data.as_object().and_then(|obj| obj.get(key))
}

/// Status labels: strings as sent, anything else in its JSON form.
fn labels_of(map: &serde_json::Map<String, Value>) -> IndexMap<String, String> {
    map.iter()
        .map(|(name, label)| {
            let label = match label {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (name.clone(), label)
        })
        .collect()
}

/// Vote values: strings as sent, numbers stringified, anything else dropped.
fn votes_of(map: &serde_json::Map<String, Value>) -> IndexMap<String, String> {
    map.iter()
        .filter_map(|(name, value)| match value {
            Value::String(s) => Some((name.clone(), s.clone())),
            Value::Number(n) => Some((name.clone(), n.to_string())),
            _ => None,
        })
        .collect()
}

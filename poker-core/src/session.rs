//! The session state machine.
//!
//! `Session` owns every sub-store of one room subscription and exposes pure
//! transitions: local actions and countdown ticks return the requests that
//! should go to the server, server events mutate sub-stores and return
//! nothing. No I/O and no clock live here.
//!
//! ```text
//!  Action ──► dispatch() ──► Vec<Request> ──► transport
//!  tick   ──► tick()     ──► Vec<Request> ──► transport   (auto-reveal)
//!  ServerEvent ──► apply() ──► roster | ledger | chat | countdown
//!                                   │
//!                                   ▼
//!                            SessionSnapshot ──► observers
//! ```
//!
//! Each event touches exactly one sub-store, except the reveal snapshot
//! which also stops the countdown.

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::chat::{ChatLog, ChatMessage};
use crate::countdown::{Countdown, Expired, DEFAULT_COUNTDOWN_SECS};
use crate::event::{Request, ServerEvent};
use crate::ledger::{VoteLedger, VoteMap};
use crate::roster::{Participant, Roster};

/// Local user intents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    CreateRoom { room: String },
    Join { room: String, user: String },
    CastVote(String),
    Reveal,
    Reset,
    SendChat(String),
    StartCountdown,
    SetStory { title: String, description: String },
    Leave,
}

/// The story being estimated. Local only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Story {
    pub title: String,
    pub description: String,
}

/// What the room view may show of the ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum VoteView {
    /// Only who has voted.
    Hidden { voters: Vec<String> },
    Revealed { votes: VoteMap },
}

/// Observable state published after every transition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub room: String,
    pub user: String,
    pub story: Story,
    pub participants: Vec<Participant>,
    pub votes: VoteView,
    pub revealed: bool,
    pub my_vote: Option<String>,
    pub average: Option<f64>,
    pub chat: Vec<ChatMessage>,
    pub countdown: Countdown,
}

pub struct Session {
    room: String,
    user: String,
    story: Story,
    roster: Roster,
    ledger: VoteLedger,
    chat: ChatLog,
    countdown: Countdown,
    /// Value the countdown returns to on reset.
    countdown_secs: u32,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(DEFAULT_COUNTDOWN_SECS)
    }
}

impl Session {
    /// Create an empty, unjoined session whose countdown resets to `countdown_secs`.
    pub fn new(countdown_secs: u32) -> Self {
        Self {
            room: String::new(),
            user: String::new(),
            story: Story::default(),
            roster: Roster::new(),
            ledger: VoteLedger::new(),
            chat: ChatLog::new(),
            countdown: Countdown::new(countdown_secs),
            countdown_secs,
        }
    }

    /// Apply a local action, returning the requests to send.
    ///
    /// Actions that need a room or user the session does not have are
    /// dropped without any state change.
    pub fn dispatch(&mut self, action: Action) -> Vec<Request> {
        match action {
            Action::CreateRoom { room } => {
                if room.is_empty() {
                    debug!("create-room suppressed: empty room id");
                    return Vec::new();
                }
                vec![Request::CreateRoom { room }]
            }

            Action::Join { room, user } => self.join(room, user),

            Action::CastVote(value) => {
                if !self.is_joined() {
                    debug!("cast-vote suppressed: not joined");
                    return Vec::new();
                }
                self.ledger.record_my_vote(value.clone());
                vec![Request::CastVote {
                    room: self.room.clone(),
                    user: self.user.clone(),
                    value,
                }]
            }

            Action::Reveal => {
                if self.room.is_empty() {
                    debug!("reveal-votes suppressed: no room");
                    return Vec::new();
                }
                // The gate only opens when the server confirms.
                self.countdown.stop();
                vec![self.reveal_request()]
            }

            Action::Reset => {
                if self.room.is_empty() {
                    debug!("reset-votes suppressed: no room");
                    return Vec::new();
                }
                self.ledger.reset();
                self.countdown.reset(self.countdown_secs);
                vec![Request::ResetVotes {
                    room: self.room.clone(),
                }]
            }

            Action::SendChat(message) => {
                if !self.is_joined() || message.is_empty() {
                    debug!("send-chat suppressed: not joined or empty message");
                    return Vec::new();
                }
                // Not appended locally; the server's broadcast brings it back.
                vec![Request::SendChat {
                    room: self.room.clone(),
                    user: self.user.clone(),
                    message,
                }]
            }

            Action::StartCountdown => match self.countdown.start() {
                Some(expired) => self.on_expired(expired),
                None => Vec::new(),
            },

            Action::SetStory { title, description } => {
                self.story = Story { title, description };
                Vec::new()
            }

            Action::Leave => {
                if self.is_joined() {
                    info!("leaving room {}", self.room);
                }
                *self = Session::new(self.countdown_secs);
                Vec::new()
            }
        }
    }

    fn join(&mut self, room: String, user: String) -> Vec<Request> {
        if room.is_empty() || user.is_empty() {
            debug!("join-room suppressed: empty room or user");
            return Vec::new();
        }
        if room != self.room || user != self.user {
            // A different room or identity starts a fresh session.
            *self = Session::new(self.countdown_secs);
        }
        self.room = room.clone();
        self.user = user.clone();
        vec![Request::JoinRoom { room, user }]
    }

    /// Apply an authoritative server event.
    ///
    /// Events arriving while not joined are ignored.
    pub fn apply(&mut self, event: ServerEvent) {
        match event {
            ServerEvent::Connected => info!("connected to session server"),
            ServerEvent::ConnectionError(detail) => {
                warn!("session server connection error: {detail}")
            }
            _ if !self.is_joined() => {
                debug!("ignoring {} while not joined", event.name());
            }
            ServerEvent::Roster(snapshot) => self.roster.replace(&snapshot),
            ServerEvent::VotesRevealed(votes) => {
                self.ledger.apply_reveal_snapshot(votes);
                self.countdown.stop();
            }
            ServerEvent::VotesProgress(votes) => {
                if votes.is_none() {
                    warn!("malformed votes-progress payload, clearing ledger");
                }
                self.ledger.apply_progress_snapshot(votes);
            }
            ServerEvent::ChatBatch(batch) => {
                let appended = self.chat.merge(batch);
                debug!("chat merge appended {} message(s)", appended.len());
            }
        }
    }

    /// Advance the countdown one second, returning the auto-reveal request
    /// when it expires.
    pub fn tick(&mut self) -> Vec<Request> {
        match self.countdown.tick() {
            Some(expired) => self.on_expired(expired),
            None => Vec::new(),
        }
    }

    fn on_expired(&mut self, _: Expired) -> Vec<Request> {
        self.countdown.stop();
        if self.room.is_empty() {
            debug!("countdown expired outside a room");
            return Vec::new();
        }
        info!("countdown expired, requesting reveal for {}", self.room);
        vec![self.reveal_request()]
    }

    fn reveal_request(&self) -> Request {
        Request::RevealVotes {
            room: self.room.clone(),
        }
    }

    /// Build the observable view of the session.
    pub fn snapshot(&self) -> SessionSnapshot {
        let votes = if self.ledger.is_revealed() {
            VoteView::Revealed {
                votes: self.ledger.votes().clone(),
            }
        } else {
            VoteView::Hidden {
                voters: self.ledger.voters().map(str::to_string).collect(),
            }
        };
        SessionSnapshot {
            room: self.room.clone(),
            user: self.user.clone(),
            story: self.story.clone(),
            participants: self.roster.participants().to_vec(),
            votes,
            revealed: self.ledger.is_revealed(),
            my_vote: self.ledger.my_vote().map(str::to_string),
            average: self.ledger.average(),
            chat: self.chat.entries().to_vec(),
            countdown: self.countdown,
        }
    }

    /// Whether both a room and a user are set.
    pub fn is_joined(&self) -> bool {
        !self.room.is_empty() && !self.user.is_empty()
    }

    /// Joined room id, empty when not joined.
    pub fn room(&self) -> &str {
        &self.room
    }

    /// Local user name.
    pub fn user(&self) -> &str {
        &self.user
    }

    /// Story under estimation.
    pub fn story(&self) -> &Story {
        &self.story
    }

    /// Participant roster.
    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    /// Vote ledger and reveal gate.
    pub fn ledger(&self) -> &VoteLedger {
        &self.ledger
    }

    /// Chat log.
    pub fn chat(&self) -> &ChatLog {
        &self.chat
    }

    /// Auto-reveal countdown.
    pub fn countdown(&self) -> &Countdown {
        &self.countdown
    }
}

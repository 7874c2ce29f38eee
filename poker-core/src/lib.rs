//! # poker-core — estimation session state
//!
//! Pure, synchronous building blocks for a planning-poker room. Nothing in
//! this crate performs I/O or reads a clock; the runtime in `poker-sync`
//! feeds it server events, local actions and one-second ticks.
//!
//! ## Modules
//!
//! - [`countdown`] — auto-reveal countdown
//! - [`chat`] — duplicate-suppressing chat log
//! - [`ledger`] — vote ledger, reveal gate and average
//! - [`roster`] — participant roster rebuilt from snapshots
//! - [`card`] — the estimation deck
//! - [`event`] — typed server events and outbound requests
//! - [`session`] — the state machine tying the sub-stores together

pub mod card;
pub mod chat;
pub mod countdown;
pub mod event;
pub mod ledger;
pub mod roster;
pub mod session;

// Re-exports for convenience
pub use card::{is_card_value, numeric_value, CARD_VALUES};
pub use chat::{ChatLog, ChatMessage};
pub use countdown::{Countdown, Expired, DEFAULT_COUNTDOWN_SECS};
pub use event::{Ack, Request, RequestKind, ServerEvent};
pub use ledger::{RevealState, VoteLedger, VoteMap};
pub use roster::{Participant, ParticipantStatus, Roster, RosterMap, ROSTER_CAPACITY};
pub use session::{Action, Session, SessionSnapshot, Story, VoteView};

//! Vote ledger and reveal gate.
//!
//! The ledger is always replaced wholesale from server snapshots, never
//! patched. Two snapshot kinds exist:
//!
//! - **progress** (`updateVotes`): who has voted so far. Replaces the ledger
//!   but leaves the reveal gate alone.
//! - **reveal** (`votesRevealed`): the final tally. Replaces the ledger and
//!   opens the gate.
//!
//! ```text
//!            reveal snapshot
//!   Hidden ─────────────────► Revealed
//!     ▲                          │
//!     └──────── reset() ─────────┘
//! ```
//!
//! The local user's own card ("my vote") is remembered separately and is
//! independent of the gate.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::card::numeric_value;

/// Participant name → card value, in server order.
pub type VoteMap = IndexMap<String, String>;

/// Whether vote values are visible to everyone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RevealState {
    #[default]
    Hidden,
    Revealed,
}

#[derive(Debug, Clone, Default)]
pub struct VoteLedger {
    votes: VoteMap,
    state: RevealState,
    my_vote: Option<String>,
    /// Cached mean, kept in step with `votes` while revealed.
    average: Option<f64>,
}

impl VoteLedger {
    /// Create an empty, hidden ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Remember the local user's card. Does not touch the shared ledger.
    pub fn record_my_vote(&mut self, value: impl Into<String>) {
        self.my_vote = Some(value.into());
    }

    /// Replace the ledger with the final tally and open the gate.
    pub fn apply_reveal_snapshot(&mut self, votes: VoteMap) {
        self.votes = votes;
        self.state = RevealState::Revealed;
        self.recompute_average();
    }

    /// Replace the ledger with a progress snapshot.
    ///
    /// `None` stands for a malformed payload and empties the ledger.
    pub fn apply_progress_snapshot(&mut self, votes: Option<VoteMap>) {
        self.votes = votes.unwrap_or_default();
        self.recompute_average();
    }

    /// Clear everything and close the gate.
    pub fn reset(&mut self) {
        self.votes.clear();
        self.state = RevealState::Hidden;
        self.my_vote = None;
        self.average = None;
    }

    /// Mean of the numeric votes, rounded to two decimals.
    ///
    /// Always `None` while hidden or when no vote is numeric.
    pub fn average(&self) -> Option<f64> {
        self.average
    }

    fn recompute_average(&mut self) {
        self.average = match self.state {
            RevealState::Hidden => None,
            RevealState::Revealed => mean_of(&self.votes),
        };
    }

    /// Current reveal state.
    pub fn state(&self) -> RevealState {
        self.state
    }

    /// Whether the reveal gate is open.
    pub fn is_revealed(&self) -> bool {
        self.state == RevealState::Revealed
    }

    /// Last vote mapping received from the server.
    pub fn votes(&self) -> &VoteMap {
        &self.votes
    }

    /// Names present in the ledger, without their values.
    pub fn voters(&self) -> impl Iterator<Item = &str> {
        self.votes.keys().map(String::as_str)
    }

    /// The value this client cast, if any.
    pub fn my_vote(&self) -> Option<&str> {
        self.my_vote.as_deref()
    }
}

fn mean_of(votes: &VoteMap) -> Option<f64> {
    let numeric: Vec<f64> = votes.values().filter_map(|v| numeric_value(v)).collect();
    if numeric.is_empty() {
        return None;
    }
    let mean = numeric.iter().sum::<f64>() / numeric.len() as f64;
    Some((mean * 100.0).round() / 100.0)
}

//! Participant roster, rebuilt from every snapshot.
//!
//! The server's mapping is authoritative: `replace` throws away the previous
//! roster so a participant missing from the latest snapshot is gone. Status
//! labels are trusted as sent, never inferred from votes.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Seats shown by the room view. Advisory only; never enforced here.
pub const ROSTER_CAPACITY: usize = 8;

/// Participant name → raw status label, in server order.
pub type RosterMap = IndexMap<String, String>;

/// Classification of a server status label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantStatus {
    NotVoted,
    Voting,
    Voted,
    /// A label this client does not recognise.
    Other(String),
}

impl ParticipantStatus {
    /// Classify a raw status label.
    pub fn from_label(label: &str) -> Self {
        match label {
            "not-voted" | "not voted" => Self::NotVoted,
            "voting" => Self::Voting,
            "voted" | "Ha votado" => Self::Voted,
            other => Self::Other(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub name: String,
    /// Display label: the server label with its first `-` replaced by a space.
    pub label: String,
    pub status: ParticipantStatus,
}

impl Participant {
    /// Build a participant, normalizing its status label.
    pub fn new(name: impl Into<String>, raw_label: &str) -> Self {
        Self {
            name: name.into(),
            label: normalize_label(raw_label),
            status: ParticipantStatus::from_label(raw_label),
        }
    }
}

/// Replace the first styling separator with a space.
fn normalize_label(raw: &str) -> String {
    raw.replacen('-', " ", 1)
}

#[derive(Debug, Clone, Default)]
pub struct Roster {
    participants: Vec<Participant>,
}

impl Roster {
    /// Create an empty roster.
    pub fn new() -> Self {
        Self::default()
    }

    /// Discard the current roster and rebuild it from `snapshot`.
    pub fn replace(&mut self, snapshot: &RosterMap) {
        self.participants = snapshot
            .iter()
            .map(|(name, label)| Participant::new(name.clone(), label))
            .collect();
    }

    /// Participants in server order.
    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    /// Look up a participant by name.
    pub fn get(&self, name: &str) -> Option<&Participant> {
        self.participants.iter().find(|p| p.name == name)
    }

    /// Number of participants.
    pub fn len(&self) -> usize {
        self.participants.len()
    }

    /// Whether the roster is empty.
    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    /// Whether the room holds more than [`ROSTER_CAPACITY`] participants.
    pub fn is_over_capacity(&self) -> bool {
        self.participants.len() > ROSTER_CAPACITY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(pairs: &[(&str, &str)]) -> RosterMap {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_replace_is_total() {
        let mut roster = Roster::new();
        roster.replace(&snapshot(&[("A", "voted"), ("B", "voting")]));
        assert_eq!(roster.len(), 2);

        roster.replace(&snapshot(&[("A", "voted")]));
        assert_eq!(roster.len(), 1);
        assert!(roster.get("B").is_none());
    }

    #[test]
    fn test_replace_keeps_snapshot_order() {
        let mut roster = Roster::new();
        roster.replace(&snapshot(&[("zoe", "voting"), ("adam", "voted"), ("mia", "not-voted")]));
        let names: Vec<&str> = roster.participants().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["zoe", "adam", "mia"]);
    }

    #[test]
    fn test_label_normalization_replaces_first_separator_only() {
        let p = Participant::new("A", "not-voted");
        assert_eq!(p.label, "not voted");
        assert_eq!(p.status, ParticipantStatus::NotVoted);

        let q = Participant::new("B", "a-b-c");
        assert_eq!(q.label, "a b-c");
        assert_eq!(q.status, ParticipantStatus::Other("a-b-c".into()));
    }

    #[test]
    fn test_status_classification() {
        assert_eq!(ParticipantStatus::from_label("voting"), ParticipantStatus::Voting);
        assert_eq!(ParticipantStatus::from_label("voted"), ParticipantStatus::Voted);
        assert_eq!(ParticipantStatus::from_label("Ha votado"), ParticipantStatus::Voted);
    }

    #[test]
    fn test_capacity_is_advisory() {
        let mut roster = Roster::new();
        let names: Vec<String> = (0..10).map(|i| format!("user{i}")).collect();
        let map: RosterMap = names.iter().map(|n| (n.clone(), "voting".to_string())).collect();

        roster.replace(&map);
        assert_eq!(roster.len(), 10);
        assert!(roster.is_over_capacity());
    }

    #[test]
    fn test_empty_snapshot_clears() {
        let mut roster = Roster::new();
        roster.replace(&snapshot(&[("A", "voted")]));
        roster.replace(&RosterMap::new());
        assert!(roster.is_empty());
    }
}

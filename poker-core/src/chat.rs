//! Append-only chat log with duplicate suppression.
//!
//! Messages carry no identifier, so two messages are the same message when
//! they have the same `(user, message)` pair. Incoming batches are merged in
//! order; anything already present (including earlier items of the same
//! batch) is skipped. The log never shrinks and never reorders.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A single chat line.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChatMessage {
    pub user: String,
    pub message: String,
}

impl ChatMessage {
    /// Create a message from its author and text.
    pub fn new(user: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            message: message.into(),
        }
    }
}

/// Ordered, duplicate-free chat history.
#[derive(Debug, Clone, Default)]
pub struct ChatLog {
    entries: Vec<ChatMessage>,
    /// Index of `(user, message)` pairs already in `entries`.
    seen: HashSet<(String, String)>,
}

impl ChatLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge an incoming batch, returning the messages actually appended.
    pub fn merge<I>(&mut self, incoming: I) -> Vec<ChatMessage>
    where
        I: IntoIterator<Item = ChatMessage>,
    {
        let mut appended = Vec::new();
        for msg in incoming {
            let key = (msg.user.clone(), msg.message.clone());
            if self.seen.insert(key) {
                self.entries.push(msg.clone());
                appended.push(msg);
            }
        }
        appended
    }

    /// Whether an identical `(user, message)` pair is already logged.
    pub fn contains(&self, user: &str, message: &str) -> bool {
        self.seen.contains(&(user.to_string(), message.to_string()))
    }

    /// Messages in merge order.
    pub fn entries(&self) -> &[ChatMessage] {
        &self.entries
    }

    /// Number of messages in the log.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no message has been merged yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

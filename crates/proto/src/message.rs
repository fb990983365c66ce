use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::action::Action;

/// Locally generated message identifier, increasing in creation order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub u64);

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Issues [`MessageId`]s seeded from wall-clock milliseconds.
///
/// Two ids requested within the same millisecond (the user message and its
/// assistant placeholder, typically) are still strictly ordered.
#[derive(Debug, Default, Clone)]
pub struct MessageIdGenerator {
    last: Option<u64>,
}

impl MessageIdGenerator {
    /// Returns the next id using the current time.
    pub fn next_id(&mut self) -> MessageId {
        let now = Utc::now().timestamp_millis().max(0) as u64;
        self.next_at(now)
    }

    /// Returns the next id for the given millisecond timestamp.
    pub fn next_at(&mut self, now_ms: u64) -> MessageId {
        let id = match self.last {
            Some(last) if now_ms <= last => last + 1,
            _ => now_ms,
        };
        self.last = Some(id);
        MessageId(id)
    }
}

/// Message role in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Prompt submitted by the end user.
    User,
    /// Streamed response from the chat backend.
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// Delivery status of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    /// Assistant turn still streaming.
    Sending,
    /// Completed normally.
    Sent,
    /// Turn failed; content carries the error notice.
    Error,
}

impl MessageStatus {
    /// `Sent` and `Error` end the message lifecycle.
    pub fn is_terminal(self) -> bool {
        matches!(self, MessageStatus::Sent | MessageStatus::Error)
    }
}

/// Image attached to an assistant response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    pub url: String,
    pub width: u32,
    pub height: u32,
}

/// A message in the conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Unique, creation-ordered id.
    pub id: MessageId,
    /// Author of the message.
    pub role: Role,
    /// Append-only text buffer.
    pub content: String,
    /// Wallet operations proposed by the backend, in arrival order.
    pub actions: Vec<Action>,
    /// Images attached by the backend, in arrival order.
    pub images: Vec<ImageRef>,
    /// Lifecycle status.
    pub status: MessageStatus,
    /// Creation timestamp in UTC.
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Creates a user message, already `Sent`.
    pub fn user(id: MessageId, content: impl Into<String>) -> Self {
        Self {
            id,
            role: Role::User,
            content: content.into(),
            actions: Vec::new(),
            images: Vec::new(),
            status: MessageStatus::Sent,
            timestamp: Utc::now(),
        }
    }

    /// Creates an empty assistant placeholder in `Sending` state.
    pub fn assistant_pending(id: MessageId) -> Self {
        Self {
            id,
            role: Role::Assistant,
            content: String::new(),
            actions: Vec::new(),
            images: Vec::new(),
            status: MessageStatus::Sending,
            timestamp: Utc::now(),
        }
    }

    /// Moves a `Sending` message to a terminal status.
    ///
    /// Returns `false` without changing anything when the message is
    /// already terminal.
    pub fn finalize(&mut self, status: MessageStatus) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.status = status;
        true
    }

    /// Appends an `Error:` notice to the content and marks the message failed.
    pub fn fail(&mut self, notice: &str) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.content.push_str("\n\n❌ Error: ");
        self.content.push_str(notice);
        self.status = MessageStatus::Error;
        true
    }
}

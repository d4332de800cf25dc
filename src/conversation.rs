//! Conversation history: the ordered, role-tagged turns of one session.
//!
//! [`ConversationHistory`] is append-only and enforces its own shape:
//!
//! ```text
//! [system] user assistant user assistant ...
//! ```
//!
//! * the `system` turn may only be pushed onto an empty history,
//! * a `user` turn must follow `system` or `assistant`,
//! * an `assistant` turn must follow `user`.
//!
//! The history is owned by the session state machine and reset to empty when
//! the session goes back to sleep.

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Role / Turn
// ---------------------------------------------------------------------------

/// Who authored a [`Turn`].
///
/// Serialises with lowercase names so a slice of turns can be sent as-is in
/// an OpenAI-compatible `messages` array.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One message of the conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

// ---------------------------------------------------------------------------
// HistoryError
// ---------------------------------------------------------------------------

/// A push that would break the history's role ordering.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HistoryError {
    #[error("a system turn can only open an empty conversation")]
    SystemNotFirst,

    #[error("{role} turn cannot follow {previous}")]
    OutOfOrder { role: Role, previous: String },
}

// ---------------------------------------------------------------------------
// ConversationHistory
// ---------------------------------------------------------------------------

/// Append-only sequence of [`Turn`]s with enforced role alternation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationHistory {
    turns: Vec<Turn>,
}

impl ConversationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open the conversation with the system prompt.
    pub fn push_system(&mut self, content: impl Into<String>) -> Result<(), HistoryError> {
        if !self.turns.is_empty() {
            return Err(HistoryError::SystemNotFirst);
        }
        self.turns.push(Turn::system(content));
        Ok(())
    }

    /// Append a user turn.  Allowed on an empty history, after the system
    /// turn, or after an assistant reply.
    pub fn push_user(&mut self, content: impl Into<String>) -> Result<(), HistoryError> {
        match self.last_role() {
            None | Some(Role::System) | Some(Role::Assistant) => {
                self.turns.push(Turn::user(content));
                Ok(())
            }
            Some(previous) => Err(HistoryError::OutOfOrder {
                role: Role::User,
                previous: previous.to_string(),
            }),
        }
    }

    /// Append an assistant reply.  Only allowed directly after a user turn.
    pub fn push_assistant(&mut self, content: impl Into<String>) -> Result<(), HistoryError> {
        match self.last_role() {
            Some(Role::User) => {
                self.turns.push(Turn::assistant(content));
                Ok(())
            }
            previous => Err(HistoryError::OutOfOrder {
                role: Role::Assistant,
                previous: previous.map_or_else(|| "nothing".to_string(), |r| r.to_string()),
            }),
        }
    }

    /// Drop every turn.  Used when the session goes back to sleep.
    pub fn clear(&mut self) {
        self.turns.clear();
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    fn last_role(&self) -> Option<Role> {
        self.turns.last().map(|t| t.role)
    }

    /// Content of the most recent assistant turn, if the history ends with
    /// one.
    pub fn last_reply(&self) -> Option<&str> {
        match self.turns.last() {
            Some(Turn {
                role: Role::Assistant,
                content,
            }) => Some(content.as_str()),
            _ => None,
        }
    }

    /// Number of user turns, i.e. completed or pending exchanges.
    pub fn exchanges(&self) -> usize {
        self.turns.iter().filter(|t| t.role == Role::User).count()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! Message entity for conversations.
//!
//! Messages are immutable records of visitor/assistant exchanges. History is
//! append-only; analyzers only ever read a bounded suffix of it.

use crate::domain::foundation::{DomainError, MessageId, Timestamp};
use serde::{Deserialize, Serialize};

/// Role of a message sender in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// System instructions (never shown to the visitor).
    System,
    /// Visitor input.
    User,
    /// Assistant reply, including appended guidance hints.
    Assistant,
}

/// An immutable message within a conversation.
///
/// # Invariants
///
/// - `content` is non-empty (validated at construction)
/// - `created_at` is set at construction and never changes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationMessage {
    id: MessageId,
    role: Role,
    content: String,
    created_at: Timestamp,
}

impl ConversationMessage {
    /// Creates a message stamped with `created_at`.
    ///
    /// # Errors
    ///
    /// - `BlankInput` if content is blank
    pub fn new(
        role: Role,
        content: impl Into<String>,
        created_at: Timestamp,
    ) -> Result<Self, DomainError> {
        let content = content.into();
        if content.trim().is_empty() {
            return Err(DomainError::blank("content"));
        }

        Ok(Self {
            id: MessageId::new(),
            role,
            content,
            created_at,
        })
    }

    /// Creates a visitor message stamped now.
    pub fn user(content: impl Into<String>) -> Result<Self, DomainError> {
        Self::new(Role::User, content, Timestamp::now())
    }

    /// Creates an assistant message stamped now.
    pub fn assistant(content: impl Into<String>) -> Result<Self, DomainError> {
        Self::new(Role::Assistant, content, Timestamp::now())
    }

    pub fn id(&self) -> &MessageId {
        &self.id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn created_at(&self) -> &Timestamp {
        &self.created_at
    }

    pub fn is_user(&self) -> bool {
        self.role == Role::User
    }

    pub fn is_assistant(&self) -> bool {
        self.role == Role::Assistant
    }

    /// Length in characters, not bytes.
    pub fn char_len(&self) -> usize {
        self.content.chars().count()
    }
}

/// Visitor messages among the newest `window` messages of `history`.
pub fn recent_user_messages(
    history: &[ConversationMessage],
    window: usize,
) -> impl Iterator<Item = &ConversationMessage> {
    let start = history.len().saturating_sub(window);
    history[start..].iter().filter(|m| m.is_user())
}

/// Mean character length of the given messages, or 0 when there are none.
pub fn average_length<'a>(messages: impl IntoIterator<Item = &'a ConversationMessage>) -> f64 {
    let (count, total) = messages
        .into_iter()
        .fold((0usize, 0usize), |(count, total), m| (count + 1, total + m.char_len()));
    if count == 0 {
        0.0
    } else {
        total as f64 / count as f64
    }
}

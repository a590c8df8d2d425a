//! Conversation repository port (write side).
//!
//! The pipeline only needs three writes: the append-only message log, the
//! per-session key/value store of brief answers, and a memory snapshot.
//!
//! # Design
//!
//! - **At-least-once**: Callers may repeat a write after a failure;
//!   implementations must tolerate duplicates
//! - **Non-fatal**: The orchestrator logs failures and continues the turn

use async_trait::async_trait;

use crate::domain::brief::BriefField;
use crate::domain::conversation::ConversationMessage;
use crate::domain::foundation::SessionId;
use crate::domain::memory::MemorySnapshot;

/// Repository port for conversation persistence.
#[async_trait]
pub trait ConversationRepository: Send + Sync {
    /// Append a message to the session's log.
    ///
    /// # Errors
    ///
    /// - `Storage` on persistence failure
    async fn save_message(
        &self,
        session_id: &SessionId,
        message: &ConversationMessage,
    ) -> Result<(), RepositoryError>;

    /// Set one brief answer, replacing any previous value.
    ///
    /// # Errors
    ///
    /// - `Storage` on persistence failure
    async fn patch_brief_field(
        &self,
        session_id: &SessionId,
        field: BriefField,
        value: &str,
    ) -> Result<(), RepositoryError>;

    /// Replace the session's memory snapshot.
    ///
    /// # Errors
    ///
    /// - `Serialization` if the snapshot cannot be encoded
    /// - `Storage` on persistence failure
    async fn save_memory_snapshot(
        &self,
        session_id: &SessionId,
        snapshot: &MemorySnapshot,
    ) -> Result<(), RepositoryError>;
}

/// Persistence errors.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("storage error: {0}")]
    Storage(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl RepositoryError {
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }
}

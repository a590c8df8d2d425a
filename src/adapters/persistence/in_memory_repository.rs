//! In-memory conversation repository.
//!
//! Useful for:
//! - Development and testing environments
//! - The interactive binary, which keeps nothing across restarts
//!
//! Snapshots are stored as JSON values, the same shape a document store
//! would receive.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;

use crate::domain::brief::BriefField;
use crate::domain::conversation::ConversationMessage;
use crate::domain::foundation::SessionId;
use crate::domain::memory::MemorySnapshot;
use crate::ports::{ConversationRepository, RepositoryError};

#[derive(Debug, Default)]
struct SessionRecord {
    messages: Vec<ConversationMessage>,
    brief: BTreeMap<BriefField, String>,
    memory: Option<serde_json::Value>,
}

/// In-memory implementation of the ConversationRepository port.
///
/// Thread-safe via an internal tokio `RwLock`.
#[derive(Debug, Default)]
pub struct InMemoryConversationRepository {
    sessions: RwLock<HashMap<SessionId, SessionRecord>>,
    fail_writes: AtomicBool,
}

impl InMemoryConversationRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every write fail with a storage error until turned off again.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Messages saved for a session, in write order.
    pub async fn messages(&self, session_id: &SessionId) -> Vec<ConversationMessage> {
        self.sessions
            .read()
            .await
            .get(session_id)
            .map(|r| r.messages.clone())
            .unwrap_or_default()
    }

    /// Brief answers saved for a session.
    pub async fn brief_fields(&self, session_id: &SessionId) -> BTreeMap<BriefField, String> {
        self.sessions
            .read()
            .await
            .get(session_id)
            .map(|r| r.brief.clone())
            .unwrap_or_default()
    }

    /// The latest memory snapshot for a session.
    pub async fn memory_snapshot(&self, session_id: &SessionId) -> Option<serde_json::Value> {
        self.sessions
            .read()
            .await
            .get(session_id)
            .and_then(|r| r.memory.clone())
    }

    fn check_writable(&self) -> Result<(), RepositoryError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(RepositoryError::storage("writes disabled"));
        }
        Ok(())
    }
}

#[async_trait]
impl ConversationRepository for InMemoryConversationRepository {
    async fn save_message(
        &self,
        session_id: &SessionId,
        message: &ConversationMessage,
    ) -> Result<(), RepositoryError> {
        self.check_writable()?;
        let mut sessions = self.sessions.write().await;
        let record = sessions.entry(*session_id).or_default();
        // Redelivery of the same message is a no-op.
        if !record.messages.iter().any(|m| m.id() == message.id()) {
            record.messages.push(message.clone());
        }
        Ok(())
    }

    async fn patch_brief_field(
        &self,
        session_id: &SessionId,
        field: BriefField,
        value: &str,
    ) -> Result<(), RepositoryError> {
        self.check_writable()?;
        self.sessions
            .write()
            .await
            .entry(*session_id)
            .or_default()
            .brief
            .insert(field, value.to_string());
        Ok(())
    }

    async fn save_memory_snapshot(
        &self,
        session_id: &SessionId,
        snapshot: &MemorySnapshot,
    ) -> Result<(), RepositoryError> {
        self.check_writable()?;
        let value = serde_json::to_value(snapshot)?;
        self.sessions
            .write()
            .await
            .entry(*session_id)
            .or_default()
            .memory = Some(value);
        Ok(())
    }
}

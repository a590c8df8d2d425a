//! Conversation memory.
//!
//! Accumulates durable visitor state across a session: communication style,
//! topic interests, project facts and engagement metrics.

mod memory;
mod personalize;

pub use memory::{
    CommunicationStyle, ConversationMemory, ConversationPatterns, EngagementLevel,
    MemorySnapshot, ProjectContext, ResponseLength, SessionMetrics, UserPreferences,
    SATISFACTION_CAPACITY,
};
pub use personalize::first_sentences;

//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the conversation pipeline and its collaborators. Adapters implement them.
//!
//! - `AIProvider` - LLM completion used to phrase replies
//! - `ContentFilter` - Blocked-content check run before everything else
//! - `ConversationRepository` - Message log, brief answers, memory snapshots

mod ai_provider;
mod content_filter;
mod conversation_repository;

pub use ai_provider::{
    AIError, AIProvider, CompletionRequest, CompletionResponse, FinishReason, ProviderInfo,
    TranscriptLine, DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE,
};
pub use content_filter::ContentFilter;
pub use conversation_repository::{ConversationRepository, RepositoryError};

//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the conversation pipeline to external systems:
//! - `ai` - LLM providers (OpenAI-compatible, mock)
//! - `content` - Blocked-content filters
//! - `persistence` - Conversation repositories

pub mod ai;
pub mod content;
pub mod persistence;

pub use ai::{MockAIProvider, OpenAIConfig, OpenAIProvider};
pub use content::KeywordBlocklist;
pub use persistence::InMemoryConversationRepository;

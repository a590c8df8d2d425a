//! Application layer - the conversation loop.
//!
//! Sequences the domain components for each visitor turn and coordinates
//! the AI provider, content filter and repository ports.

pub mod handlers;

pub use handlers::{ConversationOrchestrator, OrchestratorSettings, TurnOutcome};

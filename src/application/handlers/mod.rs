//! Application handlers.

pub mod conversation;

pub use conversation::{build_system_prompt, ConversationOrchestrator, OrchestratorSettings, TurnOutcome};

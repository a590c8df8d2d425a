//! Conversation handlers.
//!
//! Processes visitor messages and composes the LLM system prompt.

mod process_message;
mod prompt;

pub use process_message::{ConversationOrchestrator, OrchestratorSettings, TurnOutcome};
pub use prompt::build_system_prompt;

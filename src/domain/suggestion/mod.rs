//! Reply suggestions.
//!
//! Generates the ranked quick replies shown under each assistant message and
//! keeps the bounded per-session record of what was generated and used.

mod engine;
mod suggestion;

pub use engine::{fallback_suggestions, SuggestionEngine, MAX_SUGGESTIONS};
pub use suggestion::{
    AdvancedSuggestion, SuggestionKind, SuggestionLog, SuggestionUsage,
    SUGGESTION_HISTORY_CAPACITY, USAGE_LOG_CAPACITY,
};

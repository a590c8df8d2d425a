//! Conversation session aggregate.
//!
//! Owns the per-visitor state each turn reads and mutates.

mod aggregate;

pub use aggregate::ConversationSession;

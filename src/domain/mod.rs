//! Domain layer containing the conversation pipeline.
//!
//! # Module Organization
//!
//! - `foundation` - Shared primitives (IDs, timestamps, languages, errors)
//! - `lexicon` - Per-language keyword packs and matching helpers
//! - `conversation` - Entity extraction, intent classification, phases, signals
//! - `memory` - Session-scoped visitor model and response personalization
//! - `suggestion` - Ranked reply suggestions
//! - `guidance` - Proactive hints
//! - `brief` - The project brief the conversation produces
//! - `session` - The aggregate tying per-visitor state together

pub mod brief;
pub mod conversation;
pub mod foundation;
pub mod guidance;
pub mod lexicon;
pub mod memory;
pub mod session;
pub mod suggestion;

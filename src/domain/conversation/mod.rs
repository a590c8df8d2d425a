//! Conversation understanding.
//!
//! Turns a raw visitor message into an [`EnhancedIntentContext`]: extracted
//! entities, the classified intent, the funnel phase and per-turn signals.

mod classifier;
mod enhanced;
mod entities;
mod intent;
mod message;
mod phase;
pub mod signals;

pub use classifier::{ClassifierConfig, IntentClassifier, INTENT_HISTORY_CAPACITY};
pub use enhanced::{EnhancedIntentContext, SignalAnalyzer};
pub use entities::{EntityExtractor, BUDGET, SERVICE, TIMELINE};
pub use intent::{Intent, IntentContext};
pub use message::{average_length, recent_user_messages, ConversationMessage, Role};
pub use phase::{ConversationPhase, PhaseThresholds, PhaseTracker};
pub use signals::{EmotionalState, UrgencyLevel};

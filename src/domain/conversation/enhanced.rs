//! Intent context enriched with per-turn signals.

use serde::{Deserialize, Serialize};

use super::signals::{
    analyze_emotion, analyze_urgency, complexity_score, conversation_quality, topic_progression,
    user_satisfaction,
};
use super::{ConversationMessage, EmotionalState, IntentContext, UrgencyLevel};
use crate::domain::lexicon::LanguagePack;

/// An [`IntentContext`] plus the signals derived from the message and history.
///
/// Derived fresh each turn; only its effects on memory outlive the turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnhancedIntentContext {
    pub base: IntentContext,
    pub emotional_state: EmotionalState,
    pub urgency_level: UrgencyLevel,
    /// `0.0..=1.0`
    pub complexity_score: f64,
    pub topic_progression: Vec<String>,
    /// `0.0..=1.0`
    pub conversation_quality: f64,
    /// `0.0..=1.0`
    pub user_satisfaction: f64,
}

/// Builds enhanced contexts.
#[derive(Debug, Clone, Copy, Default)]
pub struct SignalAnalyzer;

impl SignalAnalyzer {
    /// Enriches `base` for `message`, with `history` ending at that message.
    pub fn enhance(
        base: IntentContext,
        message: &str,
        history: &[ConversationMessage],
        pack: &LanguagePack,
    ) -> EnhancedIntentContext {
        EnhancedIntentContext {
            emotional_state: analyze_emotion(message, pack),
            urgency_level: analyze_urgency(message, pack),
            complexity_score: complexity_score(message, pack),
            topic_progression: topic_progression(history, pack),
            conversation_quality: conversation_quality(history),
            user_satisfaction: user_satisfaction(history, pack),
            base,
        }
    }
}

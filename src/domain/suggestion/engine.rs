//! Ranked reply-suggestion generation.
//!
//! Four generators (intent, emotion, topic, urgency) each turn canned
//! language-pack suggestions into scored candidates. The merged batch is
//! de-duplicated by text, ranked by `priority + context_relevance` and cut
//! to the top six.

use crate::domain::conversation::{
    ConversationMessage, EmotionalState, EnhancedIntentContext, UrgencyLevel,
};
use crate::domain::foundation::Timestamp;
use crate::domain::lexicon::{normalize, CannedSuggestion, LanguagePack};
use crate::domain::memory::ConversationMemory;

use super::{AdvancedSuggestion, SuggestionLog};

/// Most suggestions returned per turn.
pub const MAX_SUGGESTIONS: usize = 6;

const INTENT_PRIORITY: f64 = 0.9;
const INTENT_RELEVANCE: f64 = 0.8;
const EMOTION_RELEVANCE: f64 = 0.75;
const TOPIC_PRIORITY: f64 = 0.6;
const TOPIC_RELEVANCE: f64 = 0.6;
const TOPIC_INTEREST_BONUS: f64 = 0.1;
const URGENCY_RELEVANCE: f64 = 0.5;
const FALLBACK_SCORE: f64 = 0.5;
const RECENT_TOPICS: usize = 2;
const ECHO_WINDOW: usize = 6;
const ECHO_PENALTY: f64 = 0.5;

/// Generates suggestions for a turn.
#[derive(Debug, Clone)]
pub struct SuggestionEngine {
    max_results: usize,
}

impl SuggestionEngine {
    pub fn new(max_results: usize) -> Self {
        Self {
            max_results: max_results.clamp(1, MAX_SUGGESTIONS),
        }
    }

    /// Ranked suggestions for the turn described by `context`.
    ///
    /// The batch is recorded in `log`; usage counts come from it too.
    /// Suggestions whose text the visitor just sent are demoted.
    pub fn generate(
        &self,
        context: &EnhancedIntentContext,
        memory: &ConversationMemory,
        history: &[ConversationMessage],
        pack: &LanguagePack,
        log: &mut SuggestionLog,
        now: Timestamp,
    ) -> Vec<AdvancedSuggestion> {
        let mut candidates = Vec::new();
        candidates.extend(intent_suggestions(context, pack));
        candidates.extend(emotional_suggestions(context, pack));
        candidates.extend(topic_suggestions(context, memory, pack));
        candidates.extend(urgency_suggestions(context, pack));

        let echoed: Vec<String> = history
            .iter()
            .rev()
            .take(ECHO_WINDOW)
            .filter(|m| m.is_user())
            .map(|m| normalize(m.content().trim()))
            .collect();

        let mut batch: Vec<AdvancedSuggestion> = Vec::with_capacity(candidates.len());
        for (id, canned, priority, relevance) in candidates {
            let relevance = if echoed.contains(&normalize(canned.text.trim())) {
                relevance * ECHO_PENALTY
            } else {
                relevance
            };
            let suggestion = AdvancedSuggestion {
                usage_count: Some(log.usage_count(&id)),
                id,
                text: canned.text.clone(),
                kind: canned.kind,
                priority,
                context_relevance: relevance,
                timestamp: Some(now),
            };

            match batch.iter_mut().find(|s| s.text == suggestion.text) {
                Some(existing) if existing.score() < suggestion.score() => *existing = suggestion,
                Some(_) => {}
                None => batch.push(suggestion),
            }
        }

        batch.sort_by(|a, b| b.score().total_cmp(&a.score()));
        batch.truncate(self.max_results);
        log.record_batch(&batch);

        tracing::debug!(count = batch.len(), "Generated suggestions");
        batch
    }
}

impl Default for SuggestionEngine {
    fn default() -> Self {
        Self::new(MAX_SUGGESTIONS)
    }
}

/// The neutral suggestion set used when a turn degrades.
pub fn fallback_suggestions(pack: &LanguagePack, now: Timestamp) -> Vec<AdvancedSuggestion> {
    pack.suggestions
        .fallback
        .iter()
        .map(|canned| AdvancedSuggestion {
            id: format!("fallback:{}", canned.key),
            text: canned.text.clone(),
            kind: canned.kind,
            priority: FALLBACK_SCORE,
            context_relevance: FALLBACK_SCORE,
            usage_count: None,
            timestamp: Some(now),
        })
        .collect()
}

type Candidate<'a> = (String, &'a CannedSuggestion, f64, f64);

fn tagged<'a>(
    generator: &'static str,
    list: Option<&'a Vec<CannedSuggestion>>,
    priority: f64,
    relevance: f64,
) -> impl Iterator<Item = Candidate<'a>> {
    list.into_iter().flatten().map(move |canned| {
        (
            format!("{}:{}", generator, canned.key),
            canned,
            priority,
            relevance,
        )
    })
}

fn intent_suggestions<'a>(
    context: &EnhancedIntentContext,
    pack: &'a LanguagePack,
) -> impl Iterator<Item = Candidate<'a>> {
    tagged(
        "intent",
        pack.suggestions.intent.get(&context.base.intent),
        INTENT_PRIORITY,
        INTENT_RELEVANCE,
    )
}

fn emotional_suggestions<'a>(
    context: &EnhancedIntentContext,
    pack: &'a LanguagePack,
) -> impl Iterator<Item = Candidate<'a>> {
    let priority = match context.emotional_state {
        EmotionalState::Frustrated => 1.0,
        EmotionalState::Uncertain => 0.85,
        EmotionalState::Excited => 0.7,
        EmotionalState::Satisfied => 0.6,
        EmotionalState::Neutral => 0.0,
    };
    let list = if priority > 0.0 {
        pack.suggestions.emotion.get(&context.emotional_state)
    } else {
        None
    };
    tagged("emotion", list, priority, EMOTION_RELEVANCE)
}

fn topic_suggestions<'a>(
    context: &EnhancedIntentContext,
    memory: &ConversationMemory,
    pack: &'a LanguagePack,
) -> Vec<Candidate<'a>> {
    let interests = &memory.user_preferences().topic_interests;
    let progression = &context.topic_progression;
    let recent = &progression[progression.len().saturating_sub(RECENT_TOPICS)..];

    recent
        .iter()
        .flat_map(|topic| {
            let relevance = if interests.contains(topic) {
                TOPIC_RELEVANCE + TOPIC_INTEREST_BONUS
            } else {
                TOPIC_RELEVANCE
            };
            tagged(
                "topic",
                pack.suggestions.topic.get(topic),
                TOPIC_PRIORITY,
                relevance,
            )
        })
        .collect()
}

fn urgency_suggestions<'a>(
    context: &EnhancedIntentContext,
    pack: &'a LanguagePack,
) -> impl Iterator<Item = Candidate<'a>> {
    let priority = match context.urgency_level {
        UrgencyLevel::Critical => 1.0,
        UrgencyLevel::High => 0.85,
        UrgencyLevel::Medium => 0.5,
        UrgencyLevel::Low => 0.3,
    };
    let relevance = if context.urgency_level == UrgencyLevel::Critical {
        0.9
    } else {
        URGENCY_RELEVANCE
    };
    tagged(
        "urgency",
        pack.suggestions.urgency.get(&context.urgency_level),
        priority,
        relevance,
    )
}

//! Proactive guidance state machine.
//!
//! Idle while the active set is empty, guidance-active otherwise. Pattern
//! checks propose actions, activation de-duplicates them by trigger, and a
//! timing gate decides when the highest-priority one may be shown.

use serde::{Deserialize, Serialize};

use super::{GuidanceAction, GuidanceTrigger};
use crate::domain::conversation::{
    ConversationMessage, ConversationPhase, EnhancedIntentContext, Intent, IntentContext,
};
use crate::domain::foundation::{BoundedHistory, GuidanceId, Timestamp};
use crate::domain::lexicon::{contains_keyword, normalize, LanguagePack};
use crate::domain::memory::{ConversationMemory, EngagementLevel};

const STAGNATION_WINDOW: usize = 5;
const STAGNATION_REPEATS: usize = 3;
const CONFUSION_WINDOW: usize = 6;

/// Timing and retention for guidance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuidanceConfig {
    /// Minimum seconds between two shown hints.
    pub cooldown_secs: i64,
    /// Seconds after a visitor message during which nothing is shown.
    pub typing_grace_secs: i64,
    pub history_capacity: usize,
}

impl Default for GuidanceConfig {
    fn default() -> Self {
        Self {
            cooldown_secs: 30,
            typing_grace_secs: 10,
            history_capacity: 10,
        }
    }
}

/// Per-session proactive guidance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProactiveGuidance {
    config: GuidanceConfig,
    active: Vec<GuidanceAction>,
    history: BoundedHistory<GuidanceAction>,
    last_shown_at: Option<Timestamp>,
}

impl ProactiveGuidance {
    pub fn new(config: GuidanceConfig) -> Self {
        let history = BoundedHistory::with_capacity(config.history_capacity);
        Self {
            config,
            active: Vec::new(),
            history,
            last_shown_at: None,
        }
    }

    /// Runs every pattern check and returns the actions that fired.
    ///
    /// `intent_history` must already include the current turn's context.
    pub fn analyze_conversation_flow(
        &self,
        history: &[ConversationMessage],
        context: &EnhancedIntentContext,
        intent_history: &BoundedHistory<IntentContext>,
        memory: &ConversationMemory,
        pack: &LanguagePack,
        now: Timestamp,
    ) -> Vec<GuidanceAction> {
        let phase = context.base.conversation_phase;
        let metrics = memory.session_metrics();

        let checks = [
            (GuidanceTrigger::Stagnation, is_stagnating(intent_history)),
            (
                GuidanceTrigger::Confusion,
                is_confused(history, pack) || metrics.engagement_level == EngagementLevel::Low,
            ),
            (
                GuidanceTrigger::Hesitation,
                phase == ConversationPhase::Qualification
                    && metrics.completion_likelihood < 0.4
                    && metrics.message_count > 8,
            ),
            (
                GuidanceTrigger::CompletionReadiness,
                metrics.completion_likelihood > 0.8 && phase != ConversationPhase::Completion,
            ),
            (
                GuidanceTrigger::LowEngagement,
                metrics.message_count > 15
                    && metrics.engagement_level != EngagementLevel::High
                    && metrics.completion_likelihood < 0.5,
            ),
        ];

        checks
            .into_iter()
            .filter(|(_, fired)| *fired)
            .map(|(trigger, _)| GuidanceAction::new(trigger, pack.guidance_message(trigger), now))
            .collect()
    }

    /// Activates candidates whose trigger is not already active.
    ///
    /// Returns how many were activated.
    pub fn activate_guidance(&mut self, candidates: Vec<GuidanceAction>) -> usize {
        let mut activated = 0;
        for candidate in candidates {
            if self.active.iter().any(|a| a.trigger == candidate.trigger) {
                continue;
            }
            tracing::debug!(trigger = %candidate.trigger, "Guidance activated");
            self.history.push(candidate.clone());
            self.active.push(candidate);
            activated += 1;
        }
        activated
    }

    /// Whether a hint may be shown now.
    ///
    /// False during the cooldown after the previous hint, and while the
    /// visitor's last message is younger than the typing grace period.
    pub fn should_show_guidance(&self, history: &[ConversationMessage], now: Timestamp) -> bool {
        if let Some(shown) = self.last_shown_at {
            if now.seconds_since(&shown) < self.config.cooldown_secs {
                return false;
            }
        }

        match history.last() {
            Some(last) if last.is_user() => {
                now.seconds_since(last.created_at()) >= self.config.typing_grace_secs
            }
            _ => true,
        }
    }

    /// Highest-priority active action; the earliest activated wins ties.
    pub fn get_next_guidance_message(&self) -> Option<&GuidanceAction> {
        self.active
            .iter()
            .fold(None, |best: Option<&GuidanceAction>, action| match best {
                Some(b) if b.priority >= action.priority => Some(b),
                _ => Some(action),
            })
    }

    /// Starts the cooldown.
    pub fn mark_shown(&mut self, now: Timestamp) {
        self.last_shown_at = Some(now);
    }

    /// Removes an action from the active set. Returns false for unknown ids.
    pub fn dismiss_guidance(&mut self, id: &GuidanceId) -> bool {
        let before = self.active.len();
        self.active.retain(|a| &a.id != id);
        self.active.len() != before
    }

    /// Shows the next due action: marks it shown, dismisses it and returns it.
    pub fn take_due(&mut self, history: &[ConversationMessage], now: Timestamp) -> Option<GuidanceAction> {
        if !self.should_show_guidance(history, now) {
            return None;
        }
        let next = self.get_next_guidance_message()?.clone();
        self.mark_shown(now);
        self.dismiss_guidance(&next.id);
        tracing::info!(trigger = %next.trigger, "Guidance shown");
        Some(next)
    }

    pub fn is_idle(&self) -> bool {
        self.active.is_empty()
    }

    pub fn active(&self) -> &[GuidanceAction] {
        &self.active
    }

    pub fn history(&self) -> &BoundedHistory<GuidanceAction> {
        &self.history
    }

    /// Drops every active action, keeping history and cooldown.
    pub fn clear_active(&mut self) {
        self.active.clear();
    }
}

impl Default for ProactiveGuidance {
    fn default() -> Self {
        Self::new(GuidanceConfig::default())
    }
}

fn is_stagnating(intent_history: &BoundedHistory<IntentContext>) -> bool {
    let recent: Vec<Intent> = intent_history
        .last_n(STAGNATION_WINDOW)
        .map(|c| c.intent)
        .collect();
    recent
        .iter()
        .any(|intent| recent.iter().filter(|i| *i == intent).count() >= STAGNATION_REPEATS)
}

fn is_confused(history: &[ConversationMessage], pack: &LanguagePack) -> bool {
    let start = history.len().saturating_sub(CONFUSION_WINDOW);
    history[start..].iter().filter(|m| m.is_user()).any(|m| {
        let lowered = normalize(m.content());
        pack.confusion.iter().any(|k| contains_keyword(&lowered, k))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::conversation::{EmotionalState, Role, UrgencyLevel};
    use crate::domain::foundation::Language;
    use crate::domain::lexicon::LanguagePacks;
    use crate::domain::guidance::GuidancePriority;

    fn english() -> LanguagePack {
        LanguagePacks::builtin().unwrap().pack(Language::English).clone()
    }

    fn t(secs: i64) -> Timestamp {
        Timestamp::from_unix_secs(1_700_000_000 + secs)
    }

    fn intent_context(intent: Intent, phase: ConversationPhase) -> IntentContext {
        IntentContext {
            intent,
            confidence: 60.0,
            entities: Default::default(),
            previous_intents: vec![],
            conversation_phase: phase,
        }
    }

    fn enhanced(intent: Intent, phase: ConversationPhase) -> EnhancedIntentContext {
        EnhancedIntentContext {
            base: intent_context(intent, phase),
            emotional_state: EmotionalState::Neutral,
            urgency_level: UrgencyLevel::Low,
            complexity_score: 0.0,
            topic_progression: vec![],
            conversation_quality: 0.5,
            user_satisfaction: 0.5,
        }
    }

    struct Conversation {
        messages: Vec<ConversationMessage>,
        intents: BoundedHistory<IntentContext>,
        memory: ConversationMemory,
    }

    impl Conversation {
        fn new() -> Self {
            Self {
                messages: Vec::new(),
                intents: BoundedHistory::with_capacity(10),
                memory: ConversationMemory::default(),
            }
        }

        fn user(&mut self, text: &str, intent: Intent, phase: ConversationPhase) -> EnhancedIntentContext {
            let at = t(self.messages.len() as i64 * 60);
            self.messages
                .push(ConversationMessage::new(Role::User, text, at).unwrap());
            let context = enhanced(intent, phase);
            self.intents.push(context.base.clone());
            self.memory
                .update_memory(&self.messages, &context, text, &english());
            self.messages
                .push(ConversationMessage::new(Role::Assistant, "ok", at.plus_secs(1)).unwrap());
            context
        }

        fn analyze(&self, guidance: &ProactiveGuidance, context: &EnhancedIntentContext) -> Vec<GuidanceTrigger> {
            guidance
                .analyze_conversation_flow(&self.messages, context, &self.intents, &self.memory, &english(), t(0))
                .into_iter()
                .map(|a| a.trigger)
                .collect()
        }
    }

    const CHATTY: &str = "We run a small bakery downtown and would like the new look ready by spring";

    mod checks {
        use super::*;

        #[test]
        fn fresh_conversation_raises_nothing() {
            let mut conversation = Conversation::new();
            let context = conversation.user(CHATTY, Intent::ProjectInquiry, ConversationPhase::Discovery);
            assert!(conversation.analyze(&ProactiveGuidance::default(), &context).is_empty());
        }

        #[test]
        fn repeated_intent_is_stagnation() {
            let mut conversation = Conversation::new();
            let mut context = conversation.user(CHATTY, Intent::PricingQuestion, ConversationPhase::Discovery);
            for intent in [Intent::Greeting, Intent::PricingQuestion, Intent::PricingQuestion] {
                context = conversation.user(CHATTY, intent, ConversationPhase::Discovery);
            }
            let triggers = conversation.analyze(&ProactiveGuidance::default(), &context);
            assert_eq!(triggers, vec![GuidanceTrigger::Stagnation]);
        }

        #[test]
        fn confusion_keyword_in_recent_messages() {
            let mut conversation = Conversation::new();
            conversation.user(CHATTY, Intent::ProjectInquiry, ConversationPhase::Discovery);
            let context = conversation.user(
                "Sorry, I don't understand what a brief is for our bakery project",
                Intent::BriefCreation,
                ConversationPhase::Discovery,
            );
            let triggers = conversation.analyze(&ProactiveGuidance::default(), &context);
            assert!(triggers.contains(&GuidanceTrigger::Confusion));
        }

        #[test]
        fn low_engagement_counts_as_confusion() {
            let mut conversation = Conversation::new();
            let mut context = conversation.user("ok", Intent::GeneralChat, ConversationPhase::Discovery);
            for intent in [Intent::Greeting, Intent::PortfolioRequest] {
                context = conversation.user("hm", intent, ConversationPhase::Discovery);
            }
            assert_eq!(conversation.memory.session_metrics().engagement_level, EngagementLevel::Low);
            let triggers = conversation.analyze(&ProactiveGuidance::default(), &context);
            assert!(triggers.contains(&GuidanceTrigger::Confusion));
        }

        #[test]
        fn hesitation_in_long_qualification() {
            let mut conversation = Conversation::new();
            let rotation = [Intent::ServiceExploration, Intent::PricingQuestion, Intent::PortfolioRequest];
            let mut context = conversation.user(CHATTY, Intent::Greeting, ConversationPhase::Qualification);
            for i in 0..8 {
                context = conversation.user(CHATTY, rotation[i % 3], ConversationPhase::Qualification);
            }
            let triggers = conversation.analyze(&ProactiveGuidance::default(), &context);
            assert!(triggers.contains(&GuidanceTrigger::Hesitation));
        }

        #[test]
        fn completion_readiness_before_completion_only() {
            let mut conversation = Conversation::new();
            let mut context = conversation.user(CHATTY, Intent::BriefCreation, ConversationPhase::Briefing);
            context = conversation.user(CHATTY, Intent::BriefCreation, context.base.conversation_phase);
            let triggers = conversation.analyze(&ProactiveGuidance::default(), &context);
            assert!(triggers.contains(&GuidanceTrigger::CompletionReadiness));

            let done = enhanced(Intent::BriefCreation, ConversationPhase::Completion);
            let triggers = conversation.analyze(&ProactiveGuidance::default(), &done);
            assert!(!triggers.contains(&GuidanceTrigger::CompletionReadiness));
        }

        #[test]
        fn long_unproductive_conversation_is_low_engagement() {
            let mut conversation = Conversation::new();
            let rotation = [Intent::Greeting, Intent::PortfolioRequest, Intent::GeneralChat, Intent::ServiceExploration];
            let terse = "Tell me more about your options";
            let mut context = conversation.user(terse, Intent::Greeting, ConversationPhase::Discovery);
            for i in 0..15 {
                context = conversation.user(terse, rotation[i % 4], ConversationPhase::Discovery);
            }
            assert_eq!(conversation.memory.session_metrics().engagement_level, EngagementLevel::Medium);
            let triggers = conversation.analyze(&ProactiveGuidance::default(), &context);
            assert!(triggers.contains(&GuidanceTrigger::LowEngagement));
        }
    }

    mod activation {
        use super::*;

        #[test]
        fn deduplicates_by_trigger() {
            let mut guidance = ProactiveGuidance::default();
            let first = vec![
                GuidanceAction::new(GuidanceTrigger::Confusion, "a", t(0)),
                GuidanceAction::new(GuidanceTrigger::Confusion, "b", t(0)),
            ];
            assert_eq!(guidance.activate_guidance(first), 1);
            assert_eq!(
                guidance.activate_guidance(vec![GuidanceAction::new(GuidanceTrigger::Confusion, "c", t(1))]),
                0
            );
            assert_eq!(guidance.active().len(), 1);
            assert_eq!(guidance.history().len(), 1);
        }

        #[test]
        fn history_is_capped() {
            let mut guidance = ProactiveGuidance::default();
            for i in 0..30 {
                let trigger = GuidanceTrigger::ALL[i % 5];
                let action = GuidanceAction::new(trigger, "x", t(i as i64));
                let id = action.id;
                guidance.activate_guidance(vec![action]);
                guidance.dismiss_guidance(&id);
            }
            assert_eq!(guidance.history().len(), 10);
            assert!(guidance.is_idle());
        }

        #[test]
        fn next_message_prefers_priority_then_age() {
            let mut guidance = ProactiveGuidance::default();
            guidance.activate_guidance(vec![
                GuidanceAction::new(GuidanceTrigger::LowEngagement, "low", t(0)),
                GuidanceAction::new(GuidanceTrigger::Stagnation, "medium first", t(0)),
                GuidanceAction::new(GuidanceTrigger::Hesitation, "medium second", t(0)),
            ]);
            let next = guidance.get_next_guidance_message().unwrap();
            assert_eq!(next.priority, GuidancePriority::Medium);
            assert_eq!(next.message, "medium first");
        }

        #[test]
        fn dismissing_unknown_id_is_noop() {
            let mut guidance = ProactiveGuidance::default();
            assert!(!guidance.dismiss_guidance(&GuidanceId::new()));
            assert!(guidance.is_idle());
        }
    }

    mod gating {
        use super::*;

        fn user_at(secs: i64) -> Vec<ConversationMessage> {
            vec![ConversationMessage::new(Role::User, "hello", t(secs)).unwrap()]
        }

        #[test]
        fn waits_while_visitor_is_typing() {
            let guidance = ProactiveGuidance::default();
            assert!(!guidance.should_show_guidance(&user_at(0), t(5)));
            assert!(guidance.should_show_guidance(&user_at(0), t(10)));
        }

        #[test]
        fn assistant_last_message_does_not_block() {
            let guidance = ProactiveGuidance::default();
            let history = vec![ConversationMessage::new(Role::Assistant, "hi", t(0)).unwrap()];
            assert!(guidance.should_show_guidance(&history, t(0)));
        }

        #[test]
        fn cooldown_blocks_second_hint() {
            let mut guidance = ProactiveGuidance::default();
            guidance.activate_guidance(vec![
                GuidanceAction::new(GuidanceTrigger::Confusion, "first", t(0)),
                GuidanceAction::new(GuidanceTrigger::Stagnation, "second", t(0)),
            ]);
            let history = vec![ConversationMessage::new(Role::Assistant, "reply", t(0)).unwrap()];

            let shown = guidance.take_due(&history, t(100)).unwrap();
            assert_eq!(shown.message, "first");
            assert!(guidance.take_due(&history, t(120)).is_none());

            let later = guidance.take_due(&history, t(130)).unwrap();
            assert_eq!(later.message, "second");
            assert!(guidance.is_idle());
        }
    }
}

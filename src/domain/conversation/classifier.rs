//! Keyword-scored intent classification.
//!
//! Each intent is scored as the share of its keywords present in the message,
//! weighted by domain importance and boosted when it naturally follows the
//! recent intents. Low-confidence winners collapse to `general_chat`.

use crate::domain::foundation::BoundedHistory;
use crate::domain::lexicon::{count_matches, normalize, LanguagePack};

use super::{ConversationMessage, ConversationPhase, EntityExtractor, Intent, IntentContext, PhaseThresholds, PhaseTracker};

/// Intent history kept per session.
pub const INTENT_HISTORY_CAPACITY: usize = 10;

const PREVIOUS_INTENTS: usize = 3;
const MAX_CONFIDENCE: f64 = 95.0;

/// Tuning for the classifier.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassifierConfig {
    /// Winners below this confidence (percent) become `general_chat`.
    pub confidence_floor: f64,
    /// Multiplier for the natural successors of the previous intent.
    pub progression_boost: f64,
    /// Multiplier for the intent predicted by the last two intents.
    pub sequence_boost: f64,
}

impl ClassifierConfig {
    pub fn basic() -> Self {
        Self {
            confidence_floor: 30.0,
            ..Self::enhanced()
        }
    }

    pub fn enhanced() -> Self {
        Self {
            confidence_floor: 40.0,
            progression_boost: 1.3,
            sequence_boost: 1.4,
        }
    }
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self::enhanced()
    }
}

/// Classifies messages and derives the phase they put the session in.
#[derive(Debug, Clone, Default)]
pub struct IntentClassifier {
    config: ClassifierConfig,
    tracker: PhaseTracker,
}

impl IntentClassifier {
    pub fn new(config: ClassifierConfig, thresholds: PhaseThresholds) -> Self {
        Self {
            config,
            tracker: PhaseTracker::new(thresholds),
        }
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Classifies `message`.
    ///
    /// `history` already contains the message being classified;
    /// `intent_history` holds the contexts of earlier turns. The returned
    /// phase is `current_phase` advanced by this turn, never behind it.
    pub fn classify(
        &self,
        message: &str,
        history: &[ConversationMessage],
        pack: &LanguagePack,
        intent_history: &BoundedHistory<IntentContext>,
        current_phase: ConversationPhase,
    ) -> IntentContext {
        let previous: Vec<Intent> = intent_history.iter().map(|c| c.intent).collect();
        let (intent, confidence) = self.score(message, pack, &previous);

        let derived = self.tracker.derive_phase(history, intent, &previous);
        let conversation_phase = PhaseTracker::advance(current_phase, derived);

        tracing::debug!(
            intent = %intent,
            confidence,
            phase = %conversation_phase,
            "Classified message"
        );

        IntentContext {
            intent,
            confidence,
            entities: EntityExtractor::extract(message, pack),
            previous_intents: previous[previous.len().saturating_sub(PREVIOUS_INTENTS)..].to_vec(),
            conversation_phase,
        }
    }

    /// Winning intent and its confidence in percent.
    fn score(&self, message: &str, pack: &LanguagePack, previous: &[Intent]) -> (Intent, f64) {
        let lowered = normalize(message);
        let last = previous.last().copied();
        let predicted = match previous {
            [.., a, b] => sequence_prediction(*a, *b),
            _ => None,
        };

        let mut best = (Intent::ALL[0], f64::MIN);
        for intent in Intent::ALL {
            let keywords = pack.intent_keywords(intent);
            if keywords.is_empty() {
                continue;
            }

            let mut score =
                count_matches(&lowered, keywords) as f64 / keywords.len() as f64 * intent.domain_weight();
            if last.is_some_and(|prev| natural_successors(prev).contains(&intent)) {
                score *= self.config.progression_boost;
            }
            if predicted == Some(intent) {
                score *= self.config.sequence_boost;
            }

            if score > best.1 {
                best = (intent, score);
            }
        }

        let confidence = (best.1.max(0.0) * 100.0).min(MAX_CONFIDENCE);
        if confidence < self.config.confidence_floor {
            (Intent::GeneralChat, confidence)
        } else {
            (best.0, confidence)
        }
    }
}

/// Intents that naturally follow `previous`.
fn natural_successors(previous: Intent) -> &'static [Intent] {
    use Intent::*;
    match previous {
        Greeting => &[ProjectInquiry, ServiceExploration],
        ProjectInquiry => &[ServiceExploration, BriefCreation],
        ServiceExploration => &[PricingQuestion, ProjectInquiry, BriefCreation],
        PricingQuestion => &[TimelineQuestion, BriefCreation],
        TimelineQuestion => &[BriefCreation],
        BriefCreation => &[BriefCreation, CreativeAssistance],
        CreativeAssistance => &[BriefCreation],
        PortfolioRequest => &[ServiceExploration, PricingQuestion],
        GeneralChat => &[],
    }
}

/// Intent predicted by a known two-intent sequence.
fn sequence_prediction(first: Intent, second: Intent) -> Option<Intent> {
    use Intent::*;
    match (first, second) {
        (ProjectInquiry, ServiceExploration) => Some(PricingQuestion),
        (ServiceExploration, PricingQuestion) => Some(TimelineQuestion),
        (PricingQuestion, TimelineQuestion) => Some(BriefCreation),
        (Greeting, ProjectInquiry) => Some(ServiceExploration),
        (CreativeAssistance, BriefCreation) => Some(BriefCreation),
        (BriefCreation, BriefCreation) => Some(BriefCreation),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::Language;
    use crate::domain::lexicon::LanguagePacks;
    use proptest::prelude::*;

    fn pack(language: Language) -> LanguagePack {
        LanguagePacks::builtin().unwrap().pack(language).clone()
    }

    fn context(intent: Intent) -> IntentContext {
        IntentContext {
            intent,
            confidence: 80.0,
            entities: Default::default(),
            previous_intents: Vec::new(),
            conversation_phase: ConversationPhase::Discovery,
        }
    }

    fn history_of(intents: &[Intent]) -> BoundedHistory<IntentContext> {
        let mut history = BoundedHistory::with_capacity(INTENT_HISTORY_CAPACITY);
        for intent in intents {
            history.push(context(*intent));
        }
        history
    }

    fn classify(message: &str, language: Language, previous: &[Intent]) -> IntentContext {
        let history: Vec<ConversationMessage> = ConversationMessage::user(message).into_iter().collect();
        IntentClassifier::default().classify(
            message,
            &history,
            &pack(language),
            &history_of(previous),
            ConversationPhase::Discovery,
        )
    }

    mod scoring {
        use super::*;

        #[test]
        fn website_help_is_project_inquiry() {
            let context = classify("I need help with a website", Language::English, &[]);
            assert_eq!(context.intent, Intent::ProjectInquiry);
            assert!((context.confidence - 60.0).abs() < 1e-9);
            assert!(context.entities.is_empty());
        }

        #[test]
        fn arabic_price_question() {
            let context = classify("السعر 500 ريال", Language::Arabic, &[]);
            assert_eq!(context.intent, Intent::PricingQuestion);
            assert!((context.confidence - 55.0).abs() < 1e-9);
            assert_eq!(context.entity("budget"), Some("500 ريال"));
        }

        #[test]
        fn no_keywords_is_general_chat_at_zero() {
            let context = classify("zzz qqq", Language::English, &[]);
            assert_eq!(context.intent, Intent::GeneralChat);
            assert_eq!(context.confidence, 0.0);
        }

        #[test]
        fn weak_signal_falls_below_floor() {
            // One of eight pricing keywords: 1/8 * 1.1 = 13.75%.
            let context = classify("what is the price", Language::English, &[]);
            assert_eq!(context.intent, Intent::GeneralChat);
            assert!(context.confidence > 0.0);
        }

        #[test]
        fn basic_floor_is_lower() {
            // timeline_question: 3/8 * 1.0 = 37.5%, between the two floors.
            let message = "deadline and timeline, when?";
            let history = vec![ConversationMessage::user(message).unwrap()];
            let basic = IntentClassifier::new(ClassifierConfig::basic(), PhaseThresholds::basic())
                .classify(
                    message,
                    &history,
                    &pack(Language::English),
                    &history_of(&[]),
                    ConversationPhase::Discovery,
                );
            let enhanced = classify(message, Language::English, &[]);

            assert_eq!(basic.intent, Intent::TimelineQuestion);
            assert_eq!(enhanced.intent, Intent::GeneralChat);
            assert_eq!(basic.confidence, enhanced.confidence);
        }

        #[test]
        fn confidence_is_capped() {
            let context = classify(
                "brief: create, start, requirements, details, fill",
                Language::English,
                &[Intent::BriefCreation, Intent::BriefCreation],
            );
            assert_eq!(context.intent, Intent::BriefCreation);
            assert_eq!(context.confidence, 95.0);
        }
    }

    mod boosting {
        use super::*;

        #[test]
        fn natural_progression_boosts_successor() {
            let classifier = IntentClassifier::default();
            let english = pack(Language::English);
            // brief_creation: 3/6 * 1.3 = 65%, boosted by 1.3 after project_inquiry.
            let plain = classifier.score("start the brief details", &english, &[]);
            let boosted =
                classifier.score("start the brief details", &english, &[Intent::ProjectInquiry]);

            assert_eq!(plain.0, Intent::BriefCreation);
            assert_eq!(boosted.0, Intent::BriefCreation);
            assert!((boosted.1 / plain.1 - 1.3).abs() < 1e-9);
        }

        #[test]
        fn sequence_prediction_boosts_next_intent() {
            let classifier = IntentClassifier::default();
            let english = pack(Language::English);
            let message = "how much and what is the cost";
            let plain = classifier.score(message, &english, &[Intent::Greeting]);
            let predicted = classifier.score(
                message,
                &english,
                &[Intent::ProjectInquiry, Intent::ServiceExploration],
            );
            assert_eq!(predicted.0, Intent::PricingQuestion);
            // progression 1.3 and sequence 1.4 both apply.
            assert!((predicted.1 / plain.1 - 1.3 * 1.4).abs() < 1e-9);
        }

        #[test]
        fn known_sequences() {
            assert_eq!(
                sequence_prediction(Intent::PricingQuestion, Intent::TimelineQuestion),
                Some(Intent::BriefCreation)
            );
            assert_eq!(sequence_prediction(Intent::GeneralChat, Intent::Greeting), None);
        }
    }

    mod context_record {
        use super::*;

        #[test]
        fn keeps_at_most_three_previous_intents() {
            let context = classify(
                "hello",
                Language::English,
                &[
                    Intent::Greeting,
                    Intent::ProjectInquiry,
                    Intent::ServiceExploration,
                    Intent::PricingQuestion,
                ],
            );
            assert_eq!(
                context.previous_intents,
                vec![Intent::ProjectInquiry, Intent::ServiceExploration, Intent::PricingQuestion]
            );
        }

        #[test]
        fn phase_never_regresses() {
            let message = "hello";
            let history = vec![ConversationMessage::user(message).unwrap()];
            let context = IntentClassifier::default().classify(
                message,
                &history,
                &pack(Language::English),
                &history_of(&[]),
                ConversationPhase::Briefing,
            );
            assert_eq!(context.conversation_phase, ConversationPhase::Briefing);
        }
    }

    proptest! {
        #[test]
        fn classification_is_deterministic(message in "[a-z ]{0,40}") {
            let first = classify(&message, Language::English, &[]);
            let second = classify(&message, Language::English, &[]);
            prop_assert_eq!(first, second);
        }

        #[test]
        fn digits_only_never_match_an_intent(message in "[0-9 ]{1,20}") {
            let context = classify(&message, Language::English, &[]);
            prop_assert_eq!(context.intent, Intent::GeneralChat);
            prop_assert_eq!(context.confidence, 0.0);
        }

        #[test]
        fn confidence_stays_in_range(message in ".{0,60}") {
            let context = classify(&message, Language::English, &[Intent::BriefCreation, Intent::BriefCreation]);
            prop_assert!((0.0..=95.0).contains(&context.confidence));
        }
    }
}

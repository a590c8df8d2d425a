//! Reply personalization from the visitor model.

use super::{CommunicationStyle, ConversationMemory, ResponseLength};
use crate::domain::conversation::signals::is_sentence_end;
use crate::domain::conversation::{Intent, IntentContext, SERVICE};
use crate::domain::lexicon::{replace_phrase, LanguagePack};

const BRIEF_SENTENCES: usize = 2;

impl ConversationMemory {
    /// Adapts `base` to the visitor's style and length preference.
    ///
    /// Brief visitors get the first two sentences. Formal visitors get the
    /// pack's phrase swaps, casual ones the casual suffix. A project inquiry
    /// gets a callback line when a service was mentioned in an earlier turn.
    pub fn get_personalized_response(
        &self,
        base: &str,
        context: &IntentContext,
        pack: &LanguagePack,
    ) -> String {
        let personalization = &pack.personalization;
        let preferences = self.user_preferences();

        let mut response = match preferences.response_length {
            ResponseLength::Brief => first_sentences(base, BRIEF_SENTENCES),
            _ => base.trim().to_string(),
        };

        match preferences.communication_style {
            CommunicationStyle::Formal => {
                for (from, to) in &personalization.formal_replacements {
                    response = replace_phrase(&response, from, to);
                }
            }
            CommunicationStyle::Casual => {
                if !response.ends_with(personalization.casual_suffix.trim()) {
                    response.push_str(&personalization.casual_suffix);
                }
            }
            CommunicationStyle::Friendly => {}
        }

        if context.intent == Intent::ProjectInquiry {
            if let Some(service) = self.earlier_service(context) {
                let callback = personalization.callback.replace("{service}", service);
                response.push_str("\n\n");
                response.push_str(&callback);
            }
        }

        response
    }

    // A service known before this turn; one other than the current message's
    // service is preferred.
    fn earlier_service(&self, context: &IntentContext) -> Option<&str> {
        let current = context.entity(SERVICE);
        let earlier = self.services_before_latest_turn();
        earlier
            .iter()
            .map(String::as_str)
            .find(|service| Some(*service) != current)
            .or_else(|| earlier.first().map(String::as_str))
    }
}

/// The first `limit` sentences of `text`.
///
/// A sentence ends at a run of terminators followed by whitespace or the end
/// of the text, so "3.5" does not split and "..." counts once.
pub fn first_sentences(text: &str, limit: usize) -> String {
    let text = text.trim();
    let mut ended = 0;
    let mut chars = text.char_indices().peekable();

    while let Some((index, c)) = chars.next() {
        if !is_sentence_end(c) {
            continue;
        }
        match chars.peek() {
            Some((_, next)) if is_sentence_end(*next) => continue,
            Some((_, next)) if !next.is_whitespace() => continue,
            _ => {}
        }
        ended += 1;
        if ended == limit {
            return text[..index + c.len_utf8()].to_string();
        }
    }

    text.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::conversation::{
        ConversationMessage, ConversationPhase, EmotionalState, EnhancedIntentContext,
        UrgencyLevel,
    };
    use crate::domain::foundation::Language;
    use crate::domain::lexicon::LanguagePacks;

    fn english() -> LanguagePack {
        LanguagePacks::builtin().unwrap().pack(Language::English).clone()
    }

    fn intent_context(intent: Intent, service: Option<&str>) -> IntentContext {
        IntentContext {
            intent,
            confidence: 60.0,
            entities: service
                .map(|s| (SERVICE.to_string(), s.to_string()))
                .into_iter()
                .collect(),
            previous_intents: vec![],
            conversation_phase: ConversationPhase::Discovery,
        }
    }

    fn memory_after(messages: &[(&str, Intent, Option<&str>)]) -> ConversationMemory {
        let pack = english();
        let mut memory = ConversationMemory::default();
        let mut history = Vec::new();
        for (text, intent, service) in messages {
            history.push(ConversationMessage::user(*text).unwrap());
            let context = EnhancedIntentContext {
                base: intent_context(*intent, *service),
                emotional_state: EmotionalState::Neutral,
                urgency_level: UrgencyLevel::Low,
                complexity_score: 0.0,
                topic_progression: vec![],
                conversation_quality: 0.5,
                user_satisfaction: 0.5,
            };
            memory.update_memory(&history, &context, text, &pack);
        }
        memory
    }

    const LONG_FRIENDLY: &str = "We have a bakery in the old town and we want our new packaging to feel warm and handmade like our bread.";

    mod sentences {
        use super::*;

        #[test]
        fn keeps_first_two_sentences() {
            let text = "First one. Second one! Third one? Fourth.";
            assert_eq!(first_sentences(text, 2), "First one. Second one!");
        }

        #[test]
        fn decimals_do_not_split_and_ellipsis_counts_once() {
            let text = "It costs 3.5 thousand... roughly. Then more. And more.";
            assert_eq!(first_sentences(text, 2), "It costs 3.5 thousand... roughly.");
        }

        #[test]
        fn arabic_question_mark_ends_sentence() {
            let text = "ما هي الخدمة؟ نحن نقدم الكثير. شكرا.";
            assert_eq!(first_sentences(text, 2), "ما هي الخدمة؟ نحن نقدم الكثير.");
        }

        #[test]
        fn short_text_is_untouched() {
            assert_eq!(first_sentences("Only one sentence", 2), "Only one sentence");
        }
    }

    mod styles {
        use super::*;

        #[test]
        fn formal_visitors_get_formal_phrasing() {
            let memory = memory_after(&[(
                "Dear team, could you kindly help me with a new catalogue for our firm please",
                Intent::GeneralChat,
                None,
            )]);
            let reply = memory.get_personalized_response(
                "Hi! Let's get started, we can't wait.",
                &intent_context(Intent::GeneralChat, None),
                &english(),
            );
            assert!(reply.starts_with("Hello!"));
            assert!(reply.contains("Let us"));
            assert!(reply.contains("cannot"));
        }

        #[test]
        fn casual_visitors_get_suffix() {
            let memory = memory_after(&[("yo dude wanna make a cool logo for my food truck lol ok", Intent::GeneralChat, None)]);
            let reply = memory.get_personalized_response(
                "Sounds fun. Tell me more about the truck.",
                &intent_context(Intent::GeneralChat, None),
                &english(),
            );
            assert!(reply.ends_with("😊"));
        }

        #[test]
        fn brief_visitors_get_two_sentences() {
            let memory = memory_after(&[("logo pls", Intent::GeneralChat, None)]);
            let reply = memory.get_personalized_response(
                "Great choice. Logos are our specialty. We have many styles.",
                &intent_context(Intent::GeneralChat, None),
                &english(),
            );
            assert_eq!(reply, "Great choice. Logos are our specialty.");
        }

        #[test]
        fn friendly_moderate_reply_is_unchanged() {
            let memory = memory_after(&[(LONG_FRIENDLY, Intent::GeneralChat, None)]);
            let base = "One. Two. Three.";
            let reply = memory.get_personalized_response(
                base,
                &intent_context(Intent::GeneralChat, None),
                &english(),
            );
            assert_eq!(reply, base);
        }
    }

    mod callback {
        use super::*;

        #[test]
        fn project_inquiry_recalls_earlier_service() {
            let memory = memory_after(&[
                (LONG_FRIENDLY, Intent::ProjectInquiry, Some("logo design")),
                (LONG_FRIENDLY, Intent::ProjectInquiry, None),
            ]);
            let reply = memory.get_personalized_response(
                "Tell me more.",
                &intent_context(Intent::ProjectInquiry, None),
                &english(),
            );
            assert!(reply.ends_with("Earlier you mentioned logo design. Would you like to build on that?"));
        }

        #[test]
        fn service_mentioned_only_now_gets_no_callback() {
            let memory = memory_after(&[(LONG_FRIENDLY, Intent::ProjectInquiry, Some("logo design"))]);
            let reply = memory.get_personalized_response(
                "Tell me more.",
                &intent_context(Intent::ProjectInquiry, Some("logo design")),
                &english(),
            );
            assert_eq!(reply, "Tell me more.");
        }

        #[test]
        fn service_repeated_from_earlier_turn_gets_callback() {
            let memory = memory_after(&[
                (LONG_FRIENDLY, Intent::ProjectInquiry, Some("logo design")),
                (LONG_FRIENDLY, Intent::ProjectInquiry, Some("logo design")),
            ]);
            let reply = memory.get_personalized_response(
                "Tell me more.",
                &intent_context(Intent::ProjectInquiry, Some("logo design")),
                &english(),
            );
            assert!(reply.ends_with("Earlier you mentioned logo design. Would you like to build on that?"));
        }

        #[test]
        fn other_intents_get_no_callback() {
            let memory = memory_after(&[(LONG_FRIENDLY, Intent::ProjectInquiry, Some("logo design"))]);
            let reply = memory.get_personalized_response(
                "Tell me more.",
                &intent_context(Intent::PricingQuestion, None),
                &english(),
            );
            assert_eq!(reply, "Tell me more.");
        }
    }
}

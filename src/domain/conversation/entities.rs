//! Entity extraction from free text.
//!
//! Pulls the requested service, budget and timeline out of a message using
//! the language pack's keyword lists and regexes. First match per category
//! wins; an absent entity is an absent key.

use std::collections::BTreeMap;

use crate::domain::lexicon::{contains_keyword, first_match, normalize, LanguagePack};

pub const SERVICE: &str = "service";
pub const BUDGET: &str = "budget";
pub const TIMELINE: &str = "timeline";

/// Stateless extractor over a language pack.
#[derive(Debug, Clone, Copy, Default)]
pub struct EntityExtractor;

impl EntityExtractor {
    /// Extracts `service`, `budget` and `timeline` entities.
    pub fn extract(message: &str, pack: &LanguagePack) -> BTreeMap<String, String> {
        let lowered = normalize(message);
        let mut entities = BTreeMap::new();

        if let Some(service) = Self::service(&lowered, pack) {
            entities.insert(SERVICE.to_string(), service);
        }
        if let Some(budget) = Self::budget(message, pack) {
            entities.insert(BUDGET.to_string(), budget);
        }
        if let Some(timeline) = Self::timeline(message, &lowered, pack) {
            entities.insert(TIMELINE.to_string(), timeline);
        }

        entities
    }

    fn service(lowered: &str, pack: &LanguagePack) -> Option<String> {
        pack.entities
            .services
            .iter()
            .find(|service| {
                service
                    .keywords
                    .iter()
                    .any(|keyword| contains_keyword(lowered, keyword))
            })
            .map(|service| service.label.clone())
    }

    fn budget(message: &str, pack: &LanguagePack) -> Option<String> {
        pack.entities
            .budget_pattern
            .find(message)
            .map(|m| trim_amount(m.as_str()))
            .filter(|amount| !amount.is_empty())
    }

    fn timeline(message: &str, lowered: &str, pack: &LanguagePack) -> Option<String> {
        if let Some(m) = pack.entities.timeline_pattern.find(message) {
            return Some(m.as_str().trim().to_string());
        }
        first_match(lowered, &pack.entities.timeline_keywords).map(str::to_string)
    }
}

// Thousands separators can trail a match that ends a clause ("$5,000, and").
fn trim_amount(raw: &str) -> String {
    raw.trim()
        .trim_end_matches(|c| c == ',' || c == '.' || c == '٬')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::Language;
    use crate::domain::lexicon::LanguagePacks;

    fn pack(language: Language) -> LanguagePack {
        LanguagePacks::builtin().unwrap().pack(language).clone()
    }

    mod english {
        use super::*;

        #[test]
        fn plain_request_has_no_entities() {
            let entities = EntityExtractor::extract("I need help with a website", &pack(Language::English));
            assert!(entities.is_empty());
        }

        #[test]
        fn extracts_service_label() {
            let entities =
                EntityExtractor::extract("We want a new Logo for the cafe", &pack(Language::English));
            assert_eq!(entities.get(SERVICE).map(String::as_str), Some("logo design"));
        }

        #[test]
        fn first_service_in_pack_order_wins() {
            let entities = EntityExtractor::extract(
                "branding and web design please",
                &pack(Language::English),
            );
            assert_eq!(entities.get(SERVICE).map(String::as_str), Some("web design"));
        }

        #[test]
        fn extracts_dollar_budget_without_trailing_punctuation() {
            let entities = EntityExtractor::extract(
                "Our budget is $5,000, maybe more",
                &pack(Language::English),
            );
            assert_eq!(entities.get(BUDGET).map(String::as_str), Some("$5,000"));
        }

        #[test]
        fn extracts_suffixed_budget() {
            let entities = EntityExtractor::extract("around 3k for everything", &pack(Language::English));
            assert_eq!(entities.get(BUDGET).map(String::as_str), Some("3k"));
        }

        #[test]
        fn regex_timeline_beats_keyword_timeline() {
            let entities = EntityExtractor::extract(
                "asap, ideally within 3 weeks",
                &pack(Language::English),
            );
            assert_eq!(entities.get(TIMELINE).map(String::as_str), Some("3 weeks"));
        }

        #[test]
        fn keyword_timeline_when_no_duration() {
            let entities = EntityExtractor::extract("We need it by next month", &pack(Language::English));
            assert_eq!(entities.get(TIMELINE).map(String::as_str), Some("next month"));
        }

        #[test]
        fn bare_numbers_are_not_budgets() {
            let entities = EntityExtractor::extract("We have 3 locations", &pack(Language::English));
            assert!(!entities.contains_key(BUDGET));
        }
    }

    mod arabic {
        use super::*;

        #[test]
        fn extracts_riyal_budget() {
            let entities = EntityExtractor::extract("السعر 500 ريال", &pack(Language::Arabic));
            assert_eq!(entities.get(BUDGET).map(String::as_str), Some("500 ريال"));
            assert!(!entities.contains_key(SERVICE));
        }

        #[test]
        fn extracts_service_and_duration() {
            let entities =
                EntityExtractor::extract("أريد تصميم شعار خلال 2 أسابيع", &pack(Language::Arabic));
            assert_eq!(entities.get(SERVICE).map(String::as_str), Some("تصميم شعار"));
            assert_eq!(entities.get(TIMELINE).map(String::as_str), Some("2 أسابيع"));
        }
    }
}

//! Per-language keyword packs.
//!
//! Every keyword list, regex, canned suggestion and canned message the
//! pipeline uses comes from a [`LanguagePack`]. Packs are YAML documents
//! embedded in the binary and validated once at startup.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

use crate::domain::conversation::{EmotionalState, Intent, UrgencyLevel};
use crate::domain::foundation::Language;
use crate::domain::guidance::GuidanceTrigger;
use crate::domain::memory::CommunicationStyle;
use crate::domain::suggestion::SuggestionKind;

const ENGLISH_SOURCE: &str = include_str!("en.yaml");
const ARABIC_SOURCE: &str = include_str!("ar.yaml");

static BUILTIN: Lazy<Result<Arc<LanguagePacks>, LexiconError>> = Lazy::new(|| {
    LanguagePacks::from_sources(ENGLISH_SOURCE, ARABIC_SOURCE).map(Arc::new)
});

/// Errors raised while loading or validating a language pack.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LexiconError {
    #[error("Language pack '{language}' could not be parsed: {message}")]
    Parse { language: Language, message: String },

    #[error("Language pack file '{path}' could not be read: {message}")]
    Io { path: String, message: String },

    #[error("Language pack declares '{found}' but was loaded as '{expected}'")]
    LanguageMismatch { expected: Language, found: Language },

    #[error("Language pack '{language}' has no entries for '{section}'")]
    MissingSection { language: Language, section: String },
}

impl LexiconError {
    fn missing(language: Language, section: impl Into<String>) -> Self {
        Self::MissingSection {
            language,
            section: section.into(),
        }
    }
}

/// A service name and the phrases that mention it.
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceKeywords {
    pub label: String,
    pub keywords: Vec<String>,
}

/// Patterns used by the entity extractor.
#[derive(Debug, Clone, Deserialize)]
pub struct EntityPatterns {
    pub services: Vec<ServiceKeywords>,
    #[serde(deserialize_with = "deserialize_regex")]
    pub budget_pattern: Regex,
    #[serde(deserialize_with = "deserialize_regex")]
    pub timeline_pattern: Regex,
    pub timeline_keywords: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StyleMarkers {
    pub formal: Vec<String>,
    pub casual: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SentimentMarkers {
    pub positive: Vec<String>,
    pub negative: Vec<String>,
}

/// Text transforms applied to replies based on the visitor's style.
#[derive(Debug, Clone, Deserialize)]
pub struct Personalization {
    /// `(from, to)` pairs swapped when the visitor writes formally.
    pub formal_replacements: Vec<(String, String)>,
    /// Appended to replies for casual visitors.
    pub casual_suffix: String,
    /// Callback line; `{service}` is replaced by the earliest mentioned service.
    pub callback: String,
}

/// One canned reply suggestion.
#[derive(Debug, Clone, Deserialize)]
pub struct CannedSuggestion {
    pub key: String,
    pub text: String,
    pub kind: SuggestionKind,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SuggestionCatalog {
    pub intent: BTreeMap<Intent, Vec<CannedSuggestion>>,
    pub emotion: BTreeMap<EmotionalState, Vec<CannedSuggestion>>,
    #[serde(default)]
    pub topic: BTreeMap<String, Vec<CannedSuggestion>>,
    pub urgency: BTreeMap<UrgencyLevel, Vec<CannedSuggestion>>,
    pub fallback: Vec<CannedSuggestion>,
}

/// All language-specific vocabulary for one language.
#[derive(Debug, Clone, Deserialize)]
pub struct LanguagePack {
    pub language: Language,
    pub intents: BTreeMap<Intent, Vec<String>>,
    pub entities: EntityPatterns,
    pub emotions: BTreeMap<EmotionalState, Vec<String>>,
    pub urgency: BTreeMap<UrgencyLevel, Vec<String>>,
    pub technical_terms: Vec<String>,
    pub topics: BTreeMap<String, Vec<String>>,
    pub industries: BTreeMap<String, Vec<String>>,
    pub design_preferences: Vec<String>,
    pub styles: StyleMarkers,
    pub sentiment: SentimentMarkers,
    pub confusion: Vec<String>,
    pub personalization: Personalization,
    pub suggestions: SuggestionCatalog,
    pub guidance: BTreeMap<GuidanceTrigger, String>,
    pub fallbacks: BTreeMap<CommunicationStyle, String>,
}

impl LanguagePack {
    /// Parses, normalizes and validates a pack expected to be `expected`.
    pub fn parse(expected: Language, source: &str) -> Result<Self, LexiconError> {
        let mut pack: LanguagePack =
            serde_yaml::from_str(source).map_err(|e| LexiconError::Parse {
                language: expected,
                message: e.to_string(),
            })?;

        if pack.language != expected {
            return Err(LexiconError::LanguageMismatch {
                expected,
                found: pack.language,
            });
        }

        pack.normalize();
        pack.validate()?;
        Ok(pack)
    }

    /// Keywords for an intent. Validation guarantees the list is non-empty.
    pub fn intent_keywords(&self, intent: Intent) -> &[String] {
        self.intents.get(&intent).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn emotion_keywords(&self, emotion: EmotionalState) -> &[String] {
        self.emotions.get(&emotion).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn urgency_phrases(&self, level: UrgencyLevel) -> &[String] {
        self.urgency.get(&level).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn guidance_message(&self, trigger: GuidanceTrigger) -> &str {
        self.guidance.get(&trigger).map(String::as_str).unwrap_or_default()
    }

    pub fn fallback_message(&self, style: CommunicationStyle) -> &str {
        self.fallbacks.get(&style).map(String::as_str).unwrap_or_default()
    }

    fn normalize(&mut self) {
        let lower_all = |list: &mut Vec<String>| {
            for keyword in list.iter_mut() {
                *keyword = keyword.trim().to_lowercase();
            }
            list.retain(|keyword| !keyword.is_empty());
        };

        self.intents.values_mut().for_each(lower_all);
        self.entities
            .services
            .iter_mut()
            .for_each(|service| lower_all(&mut service.keywords));
        lower_all(&mut self.entities.timeline_keywords);
        self.emotions.values_mut().for_each(lower_all);
        self.urgency.values_mut().for_each(lower_all);
        lower_all(&mut self.technical_terms);
        self.topics.values_mut().for_each(lower_all);
        self.industries.values_mut().for_each(lower_all);
        lower_all(&mut self.design_preferences);
        lower_all(&mut self.styles.formal);
        lower_all(&mut self.styles.casual);
        lower_all(&mut self.sentiment.positive);
        lower_all(&mut self.sentiment.negative);
        lower_all(&mut self.confusion);
    }

    fn validate(&self) -> Result<(), LexiconError> {
        let language = self.language;

        for intent in Intent::ALL {
            if self.intent_keywords(intent).is_empty() {
                return Err(LexiconError::missing(language, format!("intents.{}", intent)));
            }
            if self.suggestions.intent.get(&intent).map_or(true, Vec::is_empty) {
                return Err(LexiconError::missing(
                    language,
                    format!("suggestions.intent.{}", intent),
                ));
            }
        }

        for emotion in EmotionalState::SCORED {
            if self.emotion_keywords(emotion).is_empty() {
                return Err(LexiconError::missing(language, format!("emotions.{}", emotion)));
            }
            if self.suggestions.emotion.get(&emotion).map_or(true, Vec::is_empty) {
                return Err(LexiconError::missing(
                    language,
                    format!("suggestions.emotion.{}", emotion),
                ));
            }
        }

        for level in UrgencyLevel::ALL {
            if self.urgency_phrases(level).is_empty() {
                return Err(LexiconError::missing(language, format!("urgency.{}", level)));
            }
            if self.suggestions.urgency.get(&level).map_or(true, Vec::is_empty) {
                return Err(LexiconError::missing(
                    language,
                    format!("suggestions.urgency.{}", level),
                ));
            }
        }

        for trigger in GuidanceTrigger::ALL {
            if self.guidance_message(trigger).trim().is_empty() {
                return Err(LexiconError::missing(language, format!("guidance.{}", trigger)));
            }
        }

        for style in CommunicationStyle::ALL {
            if self.fallback_message(style).trim().is_empty() {
                return Err(LexiconError::missing(language, format!("fallbacks.{}", style)));
            }
        }

        if self.suggestions.fallback.is_empty() {
            return Err(LexiconError::missing(language, "suggestions.fallback"));
        }
        if self.entities.services.is_empty() {
            return Err(LexiconError::missing(language, "entities.services"));
        }
        if self.confusion.is_empty() {
            return Err(LexiconError::missing(language, "confusion"));
        }

        Ok(())
    }
}

fn deserialize_regex<'de, D>(deserializer: D) -> Result<Regex, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Regex::new(&raw).map_err(serde::de::Error::custom)
}

/// The validated packs for every supported language.
#[derive(Debug, Clone)]
pub struct LanguagePacks {
    english: LanguagePack,
    arabic: LanguagePack,
}

impl LanguagePacks {
    /// The embedded packs, parsed once per process.
    pub fn builtin() -> Result<Arc<Self>, LexiconError> {
        BUILTIN.clone()
    }

    /// Embedded packs, replaced by `<dir>/<code>.yaml` where such a file exists.
    pub fn with_overrides(dir: &Path) -> Result<Arc<Self>, LexiconError> {
        let english = Self::load_one(dir, Language::English, ENGLISH_SOURCE)?;
        let arabic = Self::load_one(dir, Language::Arabic, ARABIC_SOURCE)?;
        Ok(Arc::new(Self { english, arabic }))
    }

    /// Parses packs from raw YAML sources.
    pub fn from_sources(english: &str, arabic: &str) -> Result<Self, LexiconError> {
        Ok(Self {
            english: LanguagePack::parse(Language::English, english)?,
            arabic: LanguagePack::parse(Language::Arabic, arabic)?,
        })
    }

    /// The pack for a language.
    pub fn pack(&self, language: Language) -> &LanguagePack {
        match language {
            Language::English => &self.english,
            Language::Arabic => &self.arabic,
        }
    }

    fn load_one(dir: &Path, language: Language, builtin: &str) -> Result<LanguagePack, LexiconError> {
        let path = dir.join(format!("{}.yaml", language.code()));
        if !path.exists() {
            return LanguagePack::parse(language, builtin);
        }

        let source = std::fs::read_to_string(&path).map_err(|e| LexiconError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        tracing::info!(language = %language, path = %path.display(), "Loaded language pack override");
        LanguagePack::parse(language, &source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    mod builtin_packs {
        use super::*;

        #[test]
        fn builtin_packs_are_valid() {
            let packs = LanguagePacks::builtin().unwrap();
            assert_eq!(packs.pack(Language::English).language, Language::English);
            assert_eq!(packs.pack(Language::Arabic).language, Language::Arabic);
        }

        #[test]
        fn every_intent_has_keywords_in_every_language() {
            let packs = LanguagePacks::builtin().unwrap();
            for language in Language::ALL {
                for intent in Intent::ALL {
                    assert!(
                        !packs.pack(language).intent_keywords(intent).is_empty(),
                        "{} has no keywords for {}",
                        language,
                        intent
                    );
                }
            }
        }

        #[test]
        fn keywords_are_lowercased() {
            let packs = LanguagePacks::builtin().unwrap();
            let pack = packs.pack(Language::English);
            for keywords in pack.intents.values() {
                for keyword in keywords {
                    assert_eq!(keyword, &keyword.to_lowercase());
                }
            }
        }

        #[test]
        fn budget_pattern_matches_currency_amounts() {
            let packs = LanguagePacks::builtin().unwrap();
            let en = &packs.pack(Language::English).entities.budget_pattern;
            let ar = &packs.pack(Language::Arabic).entities.budget_pattern;

            assert_eq!(en.find("around $5,000 total").unwrap().as_str(), "$5,000");
            assert_eq!(ar.find("السعر 500 ريال").unwrap().as_str(), "500 ريال");
        }
    }

    mod validation {
        use super::*;

        #[test]
        fn rejects_pack_with_wrong_language() {
            let result = LanguagePack::parse(Language::Arabic, ENGLISH_SOURCE);
            assert!(matches!(result, Err(LexiconError::LanguageMismatch { .. })));
        }

        #[test]
        fn rejects_pack_missing_intent_keywords() {
            let broken = ENGLISH_SOURCE.replace(
                "  general_chat: [thanks, thank you, ok, okay, cool, nice, bye]",
                "  general_chat: []",
            );
            let result = LanguagePack::parse(Language::English, &broken);
            match result {
                Err(LexiconError::MissingSection { section, .. }) => {
                    assert_eq!(section, "intents.general_chat")
                }
                other => panic!("expected missing section, got {:?}", other),
            }
        }

        #[test]
        fn rejects_invalid_regex() {
            let broken = ENGLISH_SOURCE.replace(
                r"timeline_pattern: '(?i)\b\d+\s?(?:days?|weeks?|months?)\b'",
                "timeline_pattern: '(unclosed'",
            );
            let result = LanguagePack::parse(Language::English, &broken);
            assert!(matches!(result, Err(LexiconError::Parse { .. })));
        }

        #[test]
        fn rejects_malformed_yaml() {
            let result = LanguagePack::parse(Language::English, "language: [en");
            assert!(matches!(result, Err(LexiconError::Parse { .. })));
        }
    }

    mod overrides {
        use super::*;

        #[test]
        fn missing_override_files_keep_builtin_packs() {
            let dir = tempfile::tempdir().unwrap();
            let packs = LanguagePacks::with_overrides(dir.path()).unwrap();
            assert!(!packs.pack(Language::Arabic).intents.is_empty());
        }

        #[test]
        fn override_file_replaces_builtin_pack() {
            let dir = tempfile::tempdir().unwrap();
            let custom = ENGLISH_SOURCE.replace(
                "  greeting: [hello, hi, hey, good morning, good evening, greetings]",
                "  greeting: [howdy]",
            );
            let mut file = std::fs::File::create(dir.path().join("en.yaml")).unwrap();
            file.write_all(custom.as_bytes()).unwrap();

            let packs = LanguagePacks::with_overrides(dir.path()).unwrap();
            assert_eq!(
                packs.pack(Language::English).intent_keywords(Intent::Greeting),
                &["howdy".to_string()]
            );
        }

        #[test]
        fn broken_override_file_is_an_error() {
            let dir = tempfile::tempdir().unwrap();
            std::fs::write(dir.path().join("ar.yaml"), "language: ar\n").unwrap();

            let result = LanguagePacks::with_overrides(dir.path());
            assert!(result.is_err());
        }
    }
}

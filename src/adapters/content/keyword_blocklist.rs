//! Keyword blocklist content filter.
//!
//! Case-insensitive, whole-word for Latin terms. Warning and suggestion texts
//! are per language and can be replaced by the host.

use std::collections::BTreeMap;

use crate::domain::foundation::Language;
use crate::domain::lexicon::{contains_keyword, normalize};
use crate::ports::ContentFilter;

const DEFAULT_TERMS: &[&str] = &["hack", "crack", "pirated", "porn", "scam", "قرصنة", "إباحي", "احتيال"];

/// Content filter backed by a fixed term list.
#[derive(Debug, Clone)]
pub struct KeywordBlocklist {
    terms: Vec<String>,
    warnings: BTreeMap<Language, String>,
    suggestions: BTreeMap<Language, Vec<String>>,
}

impl KeywordBlocklist {
    /// Blocklist over `terms` with the default texts.
    pub fn new<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let terms = terms
            .into_iter()
            .map(|t| normalize(t.as_ref().trim()))
            .filter(|t| !t.is_empty())
            .collect();

        let warnings = BTreeMap::from([
            (
                Language::English,
                "I'm sorry, I can't help with that request. Let's keep our conversation focused on your creative project."
                    .to_string(),
            ),
            (
                Language::Arabic,
                "عذراً، لا يمكنني المساعدة في هذا الطلب. دعنا نركز على مشروعك الإبداعي.".to_string(),
            ),
        ]);

        let suggestions = BTreeMap::from([
            (
                Language::English,
                vec![
                    "Tell me about your project".to_string(),
                    "What services do you offer?".to_string(),
                    "Show me your portfolio".to_string(),
                ],
            ),
            (
                Language::Arabic,
                vec![
                    "أخبرني عن مشروعك".to_string(),
                    "ما هي الخدمات التي تقدمونها؟".to_string(),
                    "أرني أعمالكم السابقة".to_string(),
                ],
            ),
        ]);

        Self {
            terms,
            warnings,
            suggestions,
        }
    }

    /// Replaces the warning for `language`.
    pub fn with_warning(mut self, language: Language, warning: impl Into<String>) -> Self {
        self.warnings.insert(language, warning.into());
        self
    }

    /// Replaces the suggestions for `language`.
    pub fn with_suggestions(mut self, language: Language, suggestions: Vec<String>) -> Self {
        self.suggestions.insert(language, suggestions);
        self
    }

    pub fn terms(&self) -> &[String] {
        &self.terms
    }
}

impl Default for KeywordBlocklist {
    fn default() -> Self {
        Self::new(DEFAULT_TERMS)
    }
}

impl ContentFilter for KeywordBlocklist {
    fn is_blocked(&self, text: &str) -> bool {
        let lowered = normalize(text);
        self.terms.iter().any(|term| contains_keyword(&lowered, term))
    }

    fn warning(&self, language: Language) -> String {
        self.warnings.get(&language).cloned().unwrap_or_default()
    }

    fn suggestions(&self, language: Language) -> Vec<String> {
        self.suggestions.get(&language).cloned().unwrap_or_default()
    }
}

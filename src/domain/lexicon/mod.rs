//! Language packs and keyword matching.
//!
//! All analyzers are keyword and regex heuristics; this module owns the
//! vocabulary they score against.

mod matching;
mod pack;

pub use matching::{
    contains_keyword, count_all_occurrences, count_matches, count_occurrences, first_match,
    normalize, replace_phrase,
};
pub use pack::{
    CannedSuggestion, EntityPatterns, LanguagePack, LanguagePacks, LexiconError,
    Personalization, SentimentMarkers, ServiceKeywords, StyleMarkers, SuggestionCatalog,
};

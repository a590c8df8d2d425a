//! Content filter port.
//!
//! Consulted before any other processing. A blocked message never reaches
//! the classifier and is not stored; the visitor receives the filter's
//! warning and suggestion list verbatim.

use crate::domain::foundation::Language;

/// Port for the blocked-content check.
pub trait ContentFilter: Send + Sync {
    /// Whether `text` must not be processed.
    fn is_blocked(&self, text: &str) -> bool;

    /// Canned warning returned instead of a reply.
    fn warning(&self, language: Language) -> String;

    /// Generic suggestions shown with the warning.
    fn suggestions(&self, language: Language) -> Vec<String>;
}

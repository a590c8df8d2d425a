//! Reply suggestions and their usage log.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{BoundedHistory, Timestamp};

/// Generated suggestions kept per session.
pub const SUGGESTION_HISTORY_CAPACITY: usize = 50;

/// Recorded suggestion uses kept per session.
pub const USAGE_LOG_CAPACITY: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionKind {
    Question,
    Action,
    Clarification,
    Guidance,
}

/// One ranked reply suggestion. Never modified once generated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvancedSuggestion {
    /// Stable across turns: `"<generator>:<key>"`.
    pub id: String,
    pub text: String,
    pub kind: SuggestionKind,
    pub priority: f64,
    pub context_relevance: f64,
    pub usage_count: Option<u32>,
    pub timestamp: Option<Timestamp>,
}

impl AdvancedSuggestion {
    /// Ranking score.
    pub fn score(&self) -> f64 {
        self.priority + self.context_relevance
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestionUsage {
    pub suggestion_id: String,
    pub used_at: Timestamp,
}

/// Per-session record of generated and used suggestions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestionLog {
    generated: BoundedHistory<AdvancedSuggestion>,
    usage: BoundedHistory<SuggestionUsage>,
}

impl SuggestionLog {
    pub fn new() -> Self {
        Self {
            generated: BoundedHistory::with_capacity(SUGGESTION_HISTORY_CAPACITY),
            usage: BoundedHistory::with_capacity(USAGE_LOG_CAPACITY),
        }
    }

    pub fn record_batch(&mut self, batch: &[AdvancedSuggestion]) {
        for suggestion in batch {
            self.generated.push(suggestion.clone());
        }
    }

    /// Records that the visitor picked a suggestion.
    ///
    /// Ids the log never generated are recorded too; the host owns the UI.
    pub fn record_usage(&mut self, suggestion_id: impl Into<String>, used_at: Timestamp) {
        self.usage.push(SuggestionUsage {
            suggestion_id: suggestion_id.into(),
            used_at,
        });
    }

    /// Uses of `suggestion_id` still inside the usage log.
    pub fn usage_count(&self, suggestion_id: &str) -> u32 {
        self.usage
            .iter()
            .filter(|u| u.suggestion_id == suggestion_id)
            .count() as u32
    }

    pub fn generated(&self) -> &BoundedHistory<AdvancedSuggestion> {
        &self.generated
    }

    pub fn usage(&self) -> &BoundedHistory<SuggestionUsage> {
        &self.usage
    }
}

impl Default for SuggestionLog {
    fn default() -> Self {
        Self::new()
    }
}

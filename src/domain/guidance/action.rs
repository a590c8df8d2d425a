//! Guidance actions surfaced without the visitor asking.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::{GuidanceId, Timestamp};

/// Conversation pattern that raised a guidance action.
///
/// At most one active action exists per trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuidanceTrigger {
    Stagnation,
    Confusion,
    Hesitation,
    CompletionReadiness,
    LowEngagement,
}

impl GuidanceTrigger {
    pub const ALL: [GuidanceTrigger; 5] = [
        GuidanceTrigger::Stagnation,
        GuidanceTrigger::Confusion,
        GuidanceTrigger::Hesitation,
        GuidanceTrigger::CompletionReadiness,
        GuidanceTrigger::LowEngagement,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Self::Stagnation => "stagnation",
            Self::Confusion => "confusion",
            Self::Hesitation => "hesitation",
            Self::CompletionReadiness => "completion_readiness",
            Self::LowEngagement => "low_engagement",
        }
    }
}

impl fmt::Display for GuidanceTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuidanceKind {
    Hint,
    Redirect,
    Clarification,
    CompletionPrompt,
}

/// Ordered: `Urgent` is shown first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuidancePriority {
    Low,
    Medium,
    High,
    Urgent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuidanceTiming {
    Immediate,
    Delayed,
    Contextual,
}

/// A proactive hint waiting to be shown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuidanceAction {
    pub id: GuidanceId,
    pub kind: GuidanceKind,
    pub message: String,
    pub priority: GuidancePriority,
    pub trigger: GuidanceTrigger,
    pub timing: GuidanceTiming,
    pub created_at: Timestamp,
}

impl GuidanceAction {
    pub fn new(
        trigger: GuidanceTrigger,
        message: impl Into<String>,
        created_at: Timestamp,
    ) -> Self {
        let (kind, priority, timing) = match trigger {
            GuidanceTrigger::Stagnation => (
                GuidanceKind::Redirect,
                GuidancePriority::Medium,
                GuidanceTiming::Contextual,
            ),
            GuidanceTrigger::Confusion => (
                GuidanceKind::Clarification,
                GuidancePriority::High,
                GuidanceTiming::Immediate,
            ),
            GuidanceTrigger::Hesitation => (
                GuidanceKind::Hint,
                GuidancePriority::Medium,
                GuidanceTiming::Delayed,
            ),
            GuidanceTrigger::CompletionReadiness => (
                GuidanceKind::CompletionPrompt,
                GuidancePriority::Urgent,
                GuidanceTiming::Immediate,
            ),
            GuidanceTrigger::LowEngagement => (
                GuidanceKind::Hint,
                GuidancePriority::Low,
                GuidanceTiming::Delayed,
            ),
        };

        Self {
            id: GuidanceId::new(),
            kind,
            message: message.into(),
            priority,
            trigger,
            timing,
            created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priorities_are_ordered() {
        assert!(GuidancePriority::Urgent > GuidancePriority::High);
        assert!(GuidancePriority::High > GuidancePriority::Medium);
        assert!(GuidancePriority::Medium > GuidancePriority::Low);
    }

    #[test]
    fn trigger_decides_kind_and_priority() {
        let now = Timestamp::from_unix_secs(0);
        let ready = GuidanceAction::new(GuidanceTrigger::CompletionReadiness, "ready", now);
        assert_eq!(ready.kind, GuidanceKind::CompletionPrompt);
        assert_eq!(ready.priority, GuidancePriority::Urgent);
        assert_eq!(ready.timing, GuidanceTiming::Immediate);

        let stuck = GuidanceAction::new(GuidanceTrigger::Stagnation, "stuck", now);
        assert_eq!(stuck.kind, GuidanceKind::Redirect);
        assert_eq!(stuck.timing, GuidanceTiming::Contextual);
    }

    #[test]
    fn trigger_serializes_as_key() {
        for trigger in GuidanceTrigger::ALL {
            let json = serde_json::to_string(&trigger).unwrap();
            assert_eq!(json, format!("\"{}\"", trigger.key()));
        }
    }
}

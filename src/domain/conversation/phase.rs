//! Conversation phases and the tracker that derives them.
//!
//! A phase is the coarse funnel stage of the session. It is derived from
//! counts of recent intents, only ever moves forward on its own, and shapes
//! the directive the assistant is given for its reply.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{ConversationMessage, Intent};

/// Funnel stage of a conversation, in advancing order.
///
/// - `Discovery` → `Qualification` → `Briefing` → `Completion`
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum ConversationPhase {
    /// Learning who the visitor is and what they are after.
    #[default]
    Discovery,

    /// Narrowing down the service, price range and fit.
    Qualification,

    /// Collecting the fields of the project brief.
    Briefing,

    /// Brief is ready to be handed off.
    Completion,
}

impl ConversationPhase {
    /// The assistant's primary directive in this phase.
    pub fn directive(&self) -> &'static str {
        match self {
            Self::Discovery => {
                "Welcome the visitor and find out what they want to create. Keep questions open."
            }
            Self::Qualification => {
                "Clarify the service, budget range and timeline. Answer pricing questions plainly."
            }
            Self::Briefing => {
                "Collect the missing brief details one question at a time: audience, style, budget, deadline."
            }
            Self::Completion => {
                "Summarize the brief back to the visitor and confirm it is ready to submit."
            }
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Discovery => "discovery",
            Self::Qualification => "qualification",
            Self::Briefing => "briefing",
            Self::Completion => "completion",
        }
    }
}

impl fmt::Display for ConversationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Thresholds for phase derivation.
///
/// The two presets are the historical "basic" and "enhanced" rule sets.
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseThresholds {
    /// Histories shorter than this are always in discovery.
    pub min_history: usize,

    /// Number of intents (current included) inspected for set membership.
    pub window: usize,

    /// Members of a set needed inside the window to enter its phase.
    pub min_matches: usize,

    /// Completion once repeated brief creation passes this many visitor messages.
    pub completion_after_user_messages: Option<usize>,

    /// Intents that indicate briefing, when briefing is detected by window.
    pub briefing_intents: Vec<Intent>,

    /// Intents that indicate qualification.
    pub qualification_intents: Vec<Intent>,
}

impl PhaseThresholds {
    pub fn basic() -> Self {
        Self {
            min_history: 3,
            window: 3,
            min_matches: 2,
            completion_after_user_messages: None,
            briefing_intents: Vec::new(),
            qualification_intents: vec![Intent::ProjectInquiry, Intent::ServiceExploration],
        }
    }

    pub fn enhanced() -> Self {
        Self {
            min_history: 3,
            window: 3,
            min_matches: 2,
            completion_after_user_messages: Some(8),
            briefing_intents: vec![Intent::BriefCreation, Intent::CreativeAssistance],
            qualification_intents: vec![
                Intent::ProjectInquiry,
                Intent::ServiceExploration,
                Intent::PricingQuestion,
            ],
        }
    }
}

impl Default for PhaseThresholds {
    fn default() -> Self {
        Self::enhanced()
    }
}

/// Derives the conversation phase from recent intents.
#[derive(Debug, Clone, Default)]
pub struct PhaseTracker {
    thresholds: PhaseThresholds,
}

impl PhaseTracker {
    pub fn new(thresholds: PhaseThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &PhaseThresholds {
        &self.thresholds
    }

    /// Phase implied by the current turn alone.
    ///
    /// `history` includes the current visitor message; `previous_intents`
    /// are the intents of earlier turns, oldest first.
    pub fn derive_phase(
        &self,
        history: &[ConversationMessage],
        current: Intent,
        previous_intents: &[Intent],
    ) -> ConversationPhase {
        let t = &self.thresholds;

        if history.len() < t.min_history {
            return ConversationPhase::Discovery;
        }

        let last_three = &previous_intents[previous_intents.len().saturating_sub(3)..];
        if current == Intent::BriefCreation && last_three.contains(&Intent::BriefCreation) {
            let user_messages = history.iter().filter(|m| m.is_user()).count();
            return match t.completion_after_user_messages {
                Some(limit) if user_messages > limit => ConversationPhase::Completion,
                _ => ConversationPhase::Briefing,
            };
        }

        let earlier = t.window.saturating_sub(1);
        let window: Vec<Intent> = previous_intents[previous_intents.len().saturating_sub(earlier)..]
            .iter()
            .copied()
            .chain(std::iter::once(current))
            .collect();
        let hits = |set: &[Intent]| window.iter().filter(|i| set.contains(i)).count();

        if !t.briefing_intents.is_empty() && hits(&t.briefing_intents) >= t.min_matches {
            return ConversationPhase::Briefing;
        }
        if hits(&t.qualification_intents) >= t.min_matches {
            return ConversationPhase::Qualification;
        }

        ConversationPhase::Discovery
    }

    /// The phase to store: the later of `current` and `derived`.
    pub fn advance(current: ConversationPhase, derived: ConversationPhase) -> ConversationPhase {
        current.max(derived)
    }
}

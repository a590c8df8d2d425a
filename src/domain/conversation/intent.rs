//! Intent taxonomy and the per-message classification record.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::ConversationPhase;

/// The classified purpose of a visitor message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Greeting,
    ProjectInquiry,
    ServiceExploration,
    PricingQuestion,
    TimelineQuestion,
    BriefCreation,
    CreativeAssistance,
    PortfolioRequest,
    GeneralChat,
}

impl Intent {
    /// Every intent, in scoring order. Earlier entries win exact ties.
    pub const ALL: [Intent; 9] = [
        Intent::Greeting,
        Intent::ProjectInquiry,
        Intent::ServiceExploration,
        Intent::PricingQuestion,
        Intent::TimelineQuestion,
        Intent::BriefCreation,
        Intent::CreativeAssistance,
        Intent::PortfolioRequest,
        Intent::GeneralChat,
    ];

    /// Snake-case key used in language packs and logs.
    pub fn key(&self) -> &'static str {
        match self {
            Self::Greeting => "greeting",
            Self::ProjectInquiry => "project_inquiry",
            Self::ServiceExploration => "service_exploration",
            Self::PricingQuestion => "pricing_question",
            Self::TimelineQuestion => "timeline_question",
            Self::BriefCreation => "brief_creation",
            Self::CreativeAssistance => "creative_assistance",
            Self::PortfolioRequest => "portfolio_request",
            Self::GeneralChat => "general_chat",
        }
    }

    /// Static domain weight applied to the raw keyword score.
    pub fn domain_weight(&self) -> f64 {
        match self {
            Self::Greeting => 0.8,
            Self::ProjectInquiry => 1.2,
            Self::ServiceExploration => 1.1,
            Self::PricingQuestion => 1.1,
            Self::TimelineQuestion => 1.0,
            Self::BriefCreation => 1.3,
            Self::CreativeAssistance => 1.0,
            Self::PortfolioRequest => 0.9,
            Self::GeneralChat => 0.8,
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Classification of one inbound message.
///
/// Produced once per message by the classifier and never modified
/// afterwards; sessions keep the last ten in their intent history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentContext {
    pub intent: Intent,
    /// Confidence in percent, `0..=95`.
    pub confidence: f64,
    /// Extracted facts keyed by `service`, `budget`, `timeline`.
    pub entities: BTreeMap<String, String>,
    /// Up to three preceding intents, oldest first.
    pub previous_intents: Vec<Intent>,
    pub conversation_phase: ConversationPhase,
}

impl IntentContext {
    pub fn entity(&self, key: &str) -> Option<&str> {
        self.entities.get(key).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_match_serde_names() {
        for intent in Intent::ALL {
            let json = serde_json::to_string(&intent).unwrap();
            assert_eq!(json, format!("\"{}\"", intent.key()));
        }
    }

    #[test]
    fn weights_stay_within_domain_range() {
        for intent in Intent::ALL {
            let weight = intent.domain_weight();
            assert!((0.8..=1.3).contains(&weight), "{} has weight {}", intent, weight);
        }
    }

    #[test]
    fn brief_creation_carries_highest_weight() {
        let max = Intent::ALL
            .iter()
            .max_by(|a, b| a.domain_weight().total_cmp(&b.domain_weight()))
            .copied();
        assert_eq!(max, Some(Intent::BriefCreation));
    }
}

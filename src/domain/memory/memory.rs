//! Session-scoped visitor model.
//!
//! One `ConversationMemory` lives for the whole session. It is passed by
//! reference into every turn and updated in place after classification; it
//! is never rolled back, even when the reply itself fails.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::domain::conversation::{
    average_length, ConversationMessage, EnhancedIntentContext, Intent, BUDGET, SERVICE, TIMELINE,
};
use crate::domain::foundation::{BoundedHistory, Language};
use crate::domain::lexicon::{contains_keyword, count_matches, first_match, normalize, LanguagePack};

/// Satisfaction indicators kept per session.
pub const SATISFACTION_CAPACITY: usize = 10;

const MIN_LIKELIHOOD: f64 = 0.1;
const MAX_LIKELIHOOD: f64 = 0.95;

/// Tone the visitor writes in, mirrored by replies.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum CommunicationStyle {
    #[default]
    Friendly,
    Formal,
    Casual,
}

impl CommunicationStyle {
    pub const ALL: [CommunicationStyle; 3] = [
        CommunicationStyle::Friendly,
        CommunicationStyle::Formal,
        CommunicationStyle::Casual,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Self::Friendly => "friendly",
            Self::Formal => "formal",
            Self::Casual => "casual",
        }
    }
}

impl fmt::Display for CommunicationStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Preferred reply length, inferred from how much the visitor writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ResponseLength {
    Brief,
    #[default]
    Moderate,
    Comprehensive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EngagementLevel {
    Low,
    #[default]
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct UserPreferences {
    pub communication_style: CommunicationStyle,
    pub response_length: ResponseLength,
    pub topic_interests: BTreeSet<String>,
    pub language: Language,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ProjectContext {
    /// Services in the order they were first mentioned.
    pub mentioned_services: Vec<String>,
    pub budget_range: Option<String>,
    pub timeline: Option<String>,
    pub industry_focus: Option<String>,
    pub design_preferences: BTreeSet<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationPatterns {
    /// Intents of messages that asked a question, first occurrence order.
    pub frequent_question_types: Vec<Intent>,
    pub intent_usage: BTreeMap<Intent, u32>,
    /// 1 for a satisfied turn, 0 otherwise.
    pub satisfaction_indicators: BoundedHistory<u8>,
}

impl ConversationPatterns {
    /// Mean of the satisfaction ring, or 0.5 before any turn.
    pub fn average_satisfaction(&self) -> f64 {
        if self.satisfaction_indicators.is_empty() {
            return 0.5;
        }
        let total: u32 = self.satisfaction_indicators.iter().map(|v| u32::from(*v)).sum();
        f64::from(total) / self.satisfaction_indicators.len() as f64
    }

    fn total_turns(&self) -> u32 {
        self.intent_usage.values().sum()
    }
}

impl Default for ConversationPatterns {
    fn default() -> Self {
        Self {
            frequent_question_types: Vec::new(),
            intent_usage: BTreeMap::new(),
            satisfaction_indicators: BoundedHistory::with_capacity(SATISFACTION_CAPACITY),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionMetrics {
    /// Visitor messages seen so far.
    pub message_count: usize,
    pub engagement_level: EngagementLevel,
    /// `0.1..=0.95`
    pub completion_likelihood: f64,
}

impl Default for SessionMetrics {
    fn default() -> Self {
        Self {
            message_count: 0,
            engagement_level: EngagementLevel::Medium,
            completion_likelihood: MIN_LIKELIHOOD,
        }
    }
}

/// Accumulated visitor model for one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ConversationMemory {
    user_preferences: UserPreferences,
    project_context: ProjectContext,
    conversation_patterns: ConversationPatterns,
    session_metrics: SessionMetrics,
    /// How many services were known before the latest turn.
    #[serde(default)]
    services_before_turn: usize,
}

impl ConversationMemory {
    /// Neutral memory for a session in `language`.
    pub fn new(language: Language) -> Self {
        let mut memory = Self::default();
        memory.user_preferences.language = language;
        memory
    }

    pub fn user_preferences(&self) -> &UserPreferences {
        &self.user_preferences
    }

    pub fn project_context(&self) -> &ProjectContext {
        &self.project_context
    }

    pub fn conversation_patterns(&self) -> &ConversationPatterns {
        &self.conversation_patterns
    }

    pub fn session_metrics(&self) -> &SessionMetrics {
        &self.session_metrics
    }

    /// Services already known before the latest turn, in first-mention order.
    pub fn services_before_latest_turn(&self) -> &[String] {
        let services = &self.project_context.mentioned_services;
        &services[..self.services_before_turn.min(services.len())]
    }

    /// Folds one turn into the memory.
    ///
    /// `history` ends with `latest_message`; `context` is that message's
    /// enhanced classification.
    pub fn update_memory(
        &mut self,
        history: &[ConversationMessage],
        context: &EnhancedIntentContext,
        latest_message: &str,
        pack: &LanguagePack,
    ) {
        let lowered = normalize(latest_message);
        let users: Vec<&ConversationMessage> = history.iter().filter(|m| m.is_user()).collect();
        let average = average_length(users.iter().copied());

        self.user_preferences.language = pack.language;
        self.update_style(&lowered, pack);
        self.user_preferences.response_length = match average {
            a if a < 50.0 => ResponseLength::Brief,
            a if a > 150.0 => ResponseLength::Comprehensive,
            _ => ResponseLength::Moderate,
        };
        self.user_preferences
            .topic_interests
            .extend(context.topic_progression.iter().cloned());

        self.update_project(&lowered, context, pack);
        self.update_patterns(latest_message, context);

        self.session_metrics.message_count = users.len();
        self.session_metrics.engagement_level = engagement_level(users.len(), average);
        self.session_metrics.completion_likelihood = self.completion_likelihood();
    }

    /// A serializable summary for persistence.
    pub fn snapshot(&self) -> MemorySnapshot {
        MemorySnapshot {
            communication_style: self.user_preferences.communication_style,
            response_length: self.user_preferences.response_length,
            language: self.user_preferences.language,
            topic_interests: self.user_preferences.topic_interests.iter().cloned().collect(),
            mentioned_services: self.project_context.mentioned_services.clone(),
            budget_range: self.project_context.budget_range.clone(),
            timeline: self.project_context.timeline.clone(),
            industry_focus: self.project_context.industry_focus.clone(),
            design_preferences: self.project_context.design_preferences.iter().cloned().collect(),
            frequent_question_types: self.conversation_patterns.frequent_question_types.clone(),
            intent_usage: self.conversation_patterns.intent_usage.clone(),
            average_satisfaction: self.conversation_patterns.average_satisfaction(),
            message_count: self.session_metrics.message_count,
            engagement_level: self.session_metrics.engagement_level,
            completion_likelihood: self.session_metrics.completion_likelihood,
        }
    }

    // Ties, including no signal at all, keep the stored style.
    fn update_style(&mut self, lowered: &str, pack: &LanguagePack) {
        let formal = count_matches(lowered, &pack.styles.formal);
        let casual = count_matches(lowered, &pack.styles.casual);
        if formal > casual {
            self.user_preferences.communication_style = CommunicationStyle::Formal;
        } else if casual > formal {
            self.user_preferences.communication_style = CommunicationStyle::Casual;
        }
    }

    fn update_project(&mut self, lowered: &str, context: &EnhancedIntentContext, pack: &LanguagePack) {
        self.services_before_turn = self.project_context.mentioned_services.len();
        let project = &mut self.project_context;
        if let Some(service) = context.base.entities.get(SERVICE) {
            if !project.mentioned_services.contains(service) {
                project.mentioned_services.push(service.clone());
            }
        }
        if let Some(budget) = context.base.entity(BUDGET) {
            project.budget_range = Some(budget.to_string());
        }
        if let Some(timeline) = context.base.entity(TIMELINE) {
            project.timeline = Some(timeline.to_string());
        }

        if let Some((industry, _)) = pack
            .industries
            .iter()
            .find(|(_, keywords)| first_match(lowered, keywords).is_some())
        {
            project.industry_focus = Some(industry.clone());
        }

        project.design_preferences.extend(
            pack.design_preferences
                .iter()
                .filter(|keyword| contains_keyword(lowered, keyword))
                .cloned(),
        );
    }

    fn update_patterns(&mut self, latest_message: &str, context: &EnhancedIntentContext) {
        let patterns = &mut self.conversation_patterns;
        let intent = context.base.intent;

        if latest_message.contains(['?', '؟']) && !patterns.frequent_question_types.contains(&intent) {
            patterns.frequent_question_types.push(intent);
        }
        *patterns.intent_usage.entry(intent).or_insert(0) += 1;
        patterns
            .satisfaction_indicators
            .push(u8::from(context.user_satisfaction >= 0.5));
    }

    fn completion_likelihood(&self) -> f64 {
        let patterns = &self.conversation_patterns;
        let total = patterns.total_turns();
        let briefing = patterns
            .intent_usage
            .get(&Intent::BriefCreation)
            .copied()
            .unwrap_or(0);

        let ratio = if total == 0 {
            0.0
        } else {
            f64::from(briefing) / f64::from(total)
        };
        let bonus = if self.session_metrics.engagement_level == EngagementLevel::High {
            0.1
        } else {
            0.0
        };

        (MIN_LIKELIHOOD + 0.8 * ratio + bonus).clamp(MIN_LIKELIHOOD, MAX_LIKELIHOOD)
    }
}

fn engagement_level(user_messages: usize, average_length: f64) -> EngagementLevel {
    if user_messages >= 6 && average_length > 60.0 {
        EngagementLevel::High
    } else if user_messages >= 3 && average_length < 12.0 {
        EngagementLevel::Low
    } else {
        EngagementLevel::Medium
    }
}

/// Flat, serializable view of a [`ConversationMemory`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemorySnapshot {
    pub communication_style: CommunicationStyle,
    pub response_length: ResponseLength,
    pub language: Language,
    pub topic_interests: Vec<String>,
    pub mentioned_services: Vec<String>,
    pub budget_range: Option<String>,
    pub timeline: Option<String>,
    pub industry_focus: Option<String>,
    pub design_preferences: Vec<String>,
    pub frequent_question_types: Vec<Intent>,
    pub intent_usage: BTreeMap<Intent, u32>,
    pub average_satisfaction: f64,
    pub message_count: usize,
    pub engagement_level: EngagementLevel,
    pub completion_likelihood: f64,
}

//! The project brief the conversation works toward.
//!
//! A draft is re-assembled from memory after every turn; fields that changed
//! since the last turn are patched into the host's key/value store.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::conversation::ConversationPhase;
use crate::domain::foundation::Language;
use crate::domain::memory::ConversationMemory;

/// A single answer in the brief.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BriefField {
    Service,
    Description,
    Audience,
    Style,
    Budget,
    Deadline,
    Language,
}

impl BriefField {
    pub const ALL: [BriefField; 7] = [
        BriefField::Service,
        BriefField::Description,
        BriefField::Audience,
        BriefField::Style,
        BriefField::Budget,
        BriefField::Deadline,
        BriefField::Language,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Self::Service => "service",
            Self::Description => "description",
            Self::Audience => "audience",
            Self::Style => "style",
            Self::Budget => "budget",
            Self::Deadline => "deadline",
            Self::Language => "language",
        }
    }
}

impl fmt::Display for BriefField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Brief data as collected so far.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BriefDraft {
    pub service: Option<String>,
    pub description: Option<String>,
    pub audience: Option<String>,
    pub style: Option<String>,
    pub budget: Option<String>,
    pub deadline: Option<String>,
    pub language: Language,
}

impl BriefDraft {
    /// Assembles the draft from memory and the captured project description.
    pub fn from_memory(memory: &ConversationMemory, description: Option<&str>) -> Self {
        let project = memory.project_context();
        let style = if project.design_preferences.is_empty() {
            None
        } else {
            Some(
                project
                    .design_preferences
                    .iter()
                    .map(String::as_str)
                    .collect::<Vec<_>>()
                    .join(", "),
            )
        };

        Self {
            service: project.mentioned_services.first().cloned(),
            description: description.map(str::to_string),
            audience: project.industry_focus.clone(),
            style,
            budget: project.budget_range.clone(),
            deadline: project.timeline.clone(),
            language: memory.user_preferences().language,
        }
    }

    pub fn field(&self, field: BriefField) -> Option<String> {
        match field {
            BriefField::Service => self.service.clone(),
            BriefField::Description => self.description.clone(),
            BriefField::Audience => self.audience.clone(),
            BriefField::Style => self.style.clone(),
            BriefField::Budget => self.budget.clone(),
            BriefField::Deadline => self.deadline.clone(),
            BriefField::Language => Some(self.language.code().to_string()),
        }
    }

    /// Fields that have no value yet.
    pub fn missing_fields(&self) -> Vec<BriefField> {
        BriefField::ALL
            .into_iter()
            .filter(|f| self.field(*f).is_none())
            .collect()
    }

    /// Fields whose value differs from `previous`, with their new value.
    pub fn changed_since(&self, previous: &BriefDraft) -> Vec<(BriefField, String)> {
        BriefField::ALL
            .into_iter()
            .filter_map(|f| match (self.field(f), previous.field(f)) {
                (Some(now), before) if before.as_deref() != Some(now.as_str()) => Some((f, now)),
                _ => None,
            })
            .collect()
    }
}

/// The brief handed to downstream collaborators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BriefStatus {
    pub brief: BriefDraft,
    /// True once the conversation reached the completion phase.
    pub complete: bool,
}

impl BriefStatus {
    pub fn new(brief: BriefDraft, phase: ConversationPhase) -> Self {
        Self {
            brief,
            complete: phase == ConversationPhase::Completion,
        }
    }
}

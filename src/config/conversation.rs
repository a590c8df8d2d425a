//! Conversation pipeline configuration

use serde::Deserialize;
use std::path::PathBuf;

use super::error::ValidationError;
use crate::domain::conversation::{ClassifierConfig, PhaseThresholds};
use crate::domain::foundation::Language;
use crate::domain::guidance::GuidanceConfig;
use crate::domain::suggestion::MAX_SUGGESTIONS;

/// Which preset a tunable component runs with.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    Basic,
    #[default]
    Enhanced,
}

/// Conversation pipeline configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ConversationConfig {
    /// Classifier confidence floor preset
    #[serde(default)]
    pub classifier: Variant,

    /// Phase threshold preset
    #[serde(default)]
    pub phase: Variant,

    #[serde(default = "default_cooldown")]
    pub guidance_cooldown_secs: u32,

    #[serde(default = "default_typing_grace")]
    pub typing_grace_secs: u32,

    /// Language of a fresh session before the visitor writes
    #[serde(default = "default_language")]
    pub default_language: Language,

    /// Directory with `en.yaml` / `ar.yaml` overriding the built-in packs
    pub language_pack_dir: Option<PathBuf>,

    /// Messages of history sent along to the LLM
    #[serde(default = "default_history_window")]
    pub history_window: usize,

    #[serde(default = "default_max_suggestions")]
    pub max_suggestions: usize,
}

impl ConversationConfig {
    pub fn classifier_config(&self) -> ClassifierConfig {
        match self.classifier {
            Variant::Basic => ClassifierConfig::basic(),
            Variant::Enhanced => ClassifierConfig::enhanced(),
        }
    }

    pub fn phase_thresholds(&self) -> PhaseThresholds {
        match self.phase {
            Variant::Basic => PhaseThresholds::basic(),
            Variant::Enhanced => PhaseThresholds::enhanced(),
        }
    }

    pub fn guidance_config(&self) -> GuidanceConfig {
        GuidanceConfig {
            cooldown_secs: i64::from(self.guidance_cooldown_secs),
            typing_grace_secs: i64::from(self.typing_grace_secs),
            ..GuidanceConfig::default()
        }
    }

    /// Validate conversation configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_suggestions == 0 || self.max_suggestions > MAX_SUGGESTIONS {
            return Err(ValidationError::InvalidSuggestionCount(MAX_SUGGESTIONS));
        }

        if self.history_window == 0 {
            return Err(ValidationError::InvalidHistoryWindow);
        }

        if let Some(dir) = &self.language_pack_dir {
            if !dir.is_dir() {
                return Err(ValidationError::MissingLanguagePackDir(
                    dir.display().to_string(),
                ));
            }
        }

        Ok(())
    }
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            classifier: Variant::default(),
            phase: Variant::default(),
            guidance_cooldown_secs: default_cooldown(),
            typing_grace_secs: default_typing_grace(),
            default_language: default_language(),
            language_pack_dir: None,
            history_window: default_history_window(),
            max_suggestions: default_max_suggestions(),
        }
    }
}

fn default_cooldown() -> u32 {
    30
}

fn default_typing_grace() -> u32 {
    10
}

fn default_language() -> Language {
    Language::English
}

fn default_history_window() -> usize {
    10
}

fn default_max_suggestions() -> usize {
    MAX_SUGGESTIONS
}

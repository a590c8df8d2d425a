//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `BRIEF_ASSISTANT` prefix and nested values use double underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use brief_assistant::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Replies phrased by {:?}", config.ai.provider);
//! ```

mod ai;
mod conversation;
mod error;
mod logging;

pub use ai::{AiConfig, AiProvider};
pub use conversation::{ConversationConfig, Variant};
pub use error::{ConfigError, ValidationError};
pub use logging::LoggingConfig;

use serde::Deserialize;
use std::sync::Arc;

use crate::domain::lexicon::LanguagePacks;

/// Root application configuration
///
/// Every section has defaults, so an empty environment yields a working
/// offline setup with the mock provider.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    /// AI provider configuration
    #[serde(default)]
    pub ai: AiConfig,

    /// Conversation pipeline tuning
    #[serde(default)]
    pub conversation: ConversationConfig,

    /// Log filter and format
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Reads `.env` (if present) and `BRIEF_ASSISTANT__*` variables.
    ///
    /// `BRIEF_ASSISTANT__AI__PROVIDER=openai` sets `ai.provider`;
    /// `BRIEF_ASSISTANT__CONVERSATION__DEFAULT_LANGUAGE=ar` sets
    /// `conversation.default_language`. Unset values keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::LoadError` if a value has the wrong type
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("BRIEF_ASSISTANT")
                    .prefix_separator("__")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Checks every section; run once at startup.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.ai.validate()?;
        self.conversation.validate()?;
        self.logging.validate()?;
        Ok(())
    }

    /// Loads the language packs, applying overrides from the configured
    /// directory. Fails fast on any invalid pack.
    pub fn language_packs(&self) -> Result<Arc<LanguagePacks>, ConfigError> {
        let packs = match &self.conversation.language_pack_dir {
            Some(dir) => LanguagePacks::with_overrides(dir)?,
            None => LanguagePacks::builtin()?,
        };
        Ok(packs)
    }
}

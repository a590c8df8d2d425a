//! Configuration error types

use thiserror::Error;

use crate::domain::lexicon::LexiconError;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),

    #[error("Language pack failed to load: {0}")]
    LanguagePack(#[from] LexiconError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid request timeout")]
    InvalidTimeout,

    #[error("Temperature must be between 0.0 and 2.0")]
    InvalidTemperature,

    #[error("AI base URL must start with http:// or https://")]
    InvalidBaseUrl,

    #[error("Suggestion count must be between 1 and {0}")]
    InvalidSuggestionCount(usize),

    #[error("History window must be at least 1")]
    InvalidHistoryWindow,

    #[error("Language pack directory does not exist: {0}")]
    MissingLanguagePackDir(String),

    #[error("Invalid log filter: {0}")]
    InvalidLogFilter(String),
}

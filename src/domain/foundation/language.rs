//! Supported conversation languages.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ValidationError;

/// Language a visitor writes in. Every language has a matching language pack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Language {
    #[serde(rename = "en")]
    English,
    #[serde(rename = "ar")]
    Arabic,
}

impl Language {
    /// All supported languages, in pack loading order.
    pub const ALL: [Language; 2] = [Language::English, Language::Arabic];

    /// ISO 639-1 code, also the language pack file stem.
    pub fn code(&self) -> &'static str {
        match self {
            Self::English => "en",
            Self::Arabic => "ar",
        }
    }

    /// Guesses the language of a message from its script.
    ///
    /// Arabic wins when Arabic letters outnumber Latin ones.
    pub fn detect(text: &str) -> Self {
        let (arabic, latin) = text.chars().fold((0usize, 0usize), |(a, l), c| {
            if ('\u{0600}'..='\u{06FF}').contains(&c) || ('\u{0750}'..='\u{077F}').contains(&c) {
                (a + 1, l)
            } else if c.is_ascii_alphabetic() {
                (a, l + 1)
            } else {
                (a, l)
            }
        });

        if arabic > latin {
            Self::Arabic
        } else {
            Self::English
        }
    }
}

impl Default for Language {
    fn default() -> Self {
        Self::English
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "en" | "english" => Ok(Self::English),
            "ar" | "arabic" => Ok(Self::Arabic),
            other => Err(ValidationError::UnsupportedLanguage(other.to_string())),
        }
    }
}

//! Errors the domain hands back to the host.
//!
//! Analysis never fails: unknown input resolves to `general_chat` and an
//! empty entity map. What remains is input the pipeline refuses to accept.

use serde::Serialize;
use thiserror::Error;

/// A value that could not be constructed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} cannot be blank")]
    Blank { field: &'static str },

    #[error("unsupported language code '{0}'")]
    UnsupportedLanguage(String),
}

/// Machine-readable category of a [`DomainError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    BlankInput,
    UnsupportedLanguage,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::BlankInput => "BLANK_INPUT",
            ErrorCode::UnsupportedLanguage => "UNSUPPORTED_LANGUAGE",
        }
    }
}

/// Host-facing rejection with the offending field, if any.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("[{}] {message}", .code.as_str())]
pub struct DomainError {
    pub code: ErrorCode,
    pub message: String,
    pub field: Option<&'static str>,
}

impl DomainError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            field: None,
        }
    }

    /// Rejects a blank `field`.
    pub fn blank(field: &'static str) -> Self {
        ValidationError::Blank { field }.into()
    }
}

impl From<ValidationError> for DomainError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::Blank { field } => Self {
                field: Some(field),
                ..Self::new(ErrorCode::BlankInput, err.to_string())
            },
            ValidationError::UnsupportedLanguage(_) => {
                Self::new(ErrorCode::UnsupportedLanguage, err.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_records_the_field() {
        let err = DomainError::blank("content");
        assert_eq!(err.code, ErrorCode::BlankInput);
        assert_eq!(err.field, Some("content"));
        assert_eq!(err.to_string(), "[BLANK_INPUT] content cannot be blank");
    }

    #[test]
    fn unsupported_language_has_no_field() {
        let err: DomainError = ValidationError::UnsupportedLanguage("fr".into()).into();
        assert_eq!(err.code, ErrorCode::UnsupportedLanguage);
        assert!(err.field.is_none());
        assert!(err.message.contains("'fr'"));
    }

    #[test]
    fn code_serializes_screaming_snake() {
        let json = serde_json::to_string(&ErrorCode::BlankInput).unwrap();
        assert_eq!(json, "\"BLANK_INPUT\"");
    }
}

//! Foundation module - Shared domain primitives.
//!
//! Contains value objects, identifiers, enums, and error types
//! that form the vocabulary of the brief assistant domain.

mod bounded_history;
mod errors;
mod ids;
mod language;
mod timestamp;

pub use bounded_history::BoundedHistory;
pub use errors::{DomainError, ErrorCode, ValidationError};
pub use ids::{GuidanceId, MessageId, SessionId};
pub use language::Language;
pub use timestamp::Timestamp;

//! AI Provider Port - the LLM that phrases assistant replies.
//!
//! The pipeline decides *what* the assistant does next (phase directive,
//! visitor signals, open brief fields) and packs it into the system prompt.
//! The provider only turns that into prose, so every failure here is
//! recoverable: the orchestrator falls back to a canned reply.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use crate::domain::conversation::{ConversationMessage, Role};
use crate::domain::foundation::SessionId;

pub const DEFAULT_MAX_TOKENS: u32 = 400;
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Port for LLM completions.
#[async_trait]
pub trait AIProvider: Send + Sync {
    /// Writes the assistant reply for one turn.
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, AIError>;

    /// Provider and model names, for logs.
    fn provider_info(&self) -> ProviderInfo;
}

/// One turn's worth of context for the LLM.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub session_id: SessionId,
    /// Phase directive, visitor signals and open brief fields.
    pub system_prompt: String,
    /// Recent transcript, oldest first.
    pub transcript: Vec<TranscriptLine>,
    pub max_tokens: u32,
    pub temperature: f32,
}

/// A transcript entry as the provider sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TranscriptLine {
    pub role: Role,
    pub content: String,
}

impl CompletionRequest {
    pub fn new(session_id: SessionId, system_prompt: impl Into<String>) -> Self {
        Self {
            session_id,
            system_prompt: system_prompt.into(),
            transcript: Vec::new(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
        }
    }

    /// Appends the last `window` messages of the session log.
    pub fn with_transcript(mut self, history: &[ConversationMessage], window: usize) -> Self {
        let start = history.len().saturating_sub(window);
        self.transcript
            .extend(history[start..].iter().map(|m| TranscriptLine {
                role: m.role(),
                content: m.content().to_string(),
            }));
        self
    }

    pub fn with_line(mut self, role: Role, content: impl Into<String>) -> Self {
        self.transcript.push(TranscriptLine {
            role,
            content: content.into(),
        });
        self
    }

    pub fn with_limits(mut self, max_tokens: u32, temperature: f32) -> Self {
        self.max_tokens = max_tokens;
        self.temperature = temperature;
        self
    }

    /// The visitor message this request answers.
    pub fn latest_visitor_line(&self) -> Option<&str> {
        self.transcript
            .iter()
            .rev()
            .find(|line| line.role == Role::User)
            .map(|line| line.content.as_str())
    }
}

/// The provider's reply.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionResponse {
    pub content: String,
    /// Model that actually answered.
    pub model: String,
    pub finish_reason: FinishReason,
    /// Prompt plus completion tokens, 0 when the provider does not say.
    pub tokens_used: u32,
}

/// Why the model stopped generating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FinishReason {
    Stop,
    /// Cut off at `max_tokens`.
    Length,
    /// The provider's own safety filter withheld the reply.
    ContentFilter,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderInfo {
    /// e.g. "openai", "mock"
    pub name: String,
    pub model: String,
}

impl ProviderInfo {
    pub fn new(name: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
        }
    }
}

/// AI provider errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AIError {
    #[error("provider is rate limiting, retry in {retry_after_secs}s")]
    RateLimited { retry_after_secs: u32 },

    /// The provider declined to answer the prompt.
    #[error("provider refused the prompt: {0}")]
    Refused(String),

    #[error("provider unavailable: {0}")]
    Unavailable(String),

    #[error("provider rejected the credentials")]
    AuthenticationFailed,

    #[error("network error: {0}")]
    Network(String),

    /// The reply could not be decoded or was empty.
    #[error("unusable reply: {0}")]
    MalformedReply(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("no reply within {secs}s")]
    Timeout { secs: u64 },
}

impl AIError {
    pub fn timeout(after: Duration) -> Self {
        Self::Timeout {
            secs: after.as_secs(),
        }
    }

    /// Transient failures worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AIError::RateLimited { .. }
                | AIError::Unavailable(_)
                | AIError::Network(_)
                | AIError::Timeout { .. }
        )
    }
}

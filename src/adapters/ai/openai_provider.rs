//! OpenAI Provider - chat-completions client for OpenAI-compatible APIs.
//!
//! ```ignore
//! let provider = OpenAIProvider::new(
//!     OpenAIConfig::new(api_key).with_model("gpt-4o-mini"),
//! )?;
//! ```
//!
//! The system prompt goes first, followed by the transcript. Transient
//! failures (429, 5xx, network, timeouts) are retried with exponential
//! backoff up to `max_retries` times; everything else is returned at once.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::sleep;

use crate::domain::conversation::Role;
use crate::ports::{AIError, AIProvider, CompletionRequest, CompletionResponse, FinishReason, ProviderInfo};

const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_RETRY_AFTER_SECS: u32 = 30;

/// Configuration for the OpenAI provider.
#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    api_key: Secret<String>,
    pub model: String,
    /// Point at any OpenAI-compatible gateway.
    pub base_url: String,
    /// Per-attempt HTTP timeout.
    pub timeout: Duration,
    pub max_retries: u32,
    /// First backoff delay; doubles on every retry.
    pub retry_base_delay: Duration,
}

impl OpenAIConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Secret::new(api_key.into()),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
            max_retries: 2,
            retry_base_delay: Duration::from_secs(1),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_retry_base_delay(mut self, delay: Duration) -> Self {
        self.retry_base_delay = delay;
        self
    }

    /// Delay before retry number `attempt` (0-based).
    fn backoff(&self, attempt: u32) -> Duration {
        self.retry_base_delay
            .saturating_mul(2u32.saturating_pow(attempt))
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

/// OpenAI chat-completions provider.
pub struct OpenAIProvider {
    config: OpenAIConfig,
    client: Client,
}

impl OpenAIProvider {
    /// # Errors
    ///
    /// - `BadRequest` if the HTTP client cannot be built
    pub fn new(config: OpenAIConfig) -> Result<Self, AIError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AIError::BadRequest(format!("HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    async fn attempt(&self, body: &ChatBody<'_>) -> Result<CompletionResponse, AIError> {
        let response = self
            .client
            .post(self.config.endpoint())
            .bearer_auth(self.config.api_key.expose_secret())
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AIError::timeout(self.config.timeout)
                } else {
                    AIError::Network(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(error_for_status(status, &text));
        }

        let reply: ChatReply = response
            .json()
            .await
            .map_err(|e| AIError::MalformedReply(e.to_string()))?;
        reply.into_completion()
    }
}

#[async_trait]
impl AIProvider for OpenAIProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, AIError> {
        let body = ChatBody::new(&self.config.model, &request);
        let mut attempt = 0;

        loop {
            match self.attempt(&body).await {
                Err(err) if err.is_retryable() && attempt < self.config.max_retries => {
                    let delay = match &err {
                        AIError::RateLimited { retry_after_secs } => {
                            Duration::from_secs(u64::from(*retry_after_secs))
                                .min(self.config.backoff(attempt + 2))
                        }
                        _ => self.config.backoff(attempt),
                    };
                    tracing::warn!(
                        session_id = %request.session_id,
                        error = %err,
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        "Retrying reply generation"
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
                result => return result,
            }
        }
    }

    fn provider_info(&self) -> ProviderInfo {
        ProviderInfo::new("openai", &self.config.model)
    }
}

/// Maps a non-success status and its body to an error.
fn error_for_status(status: StatusCode, body: &str) -> AIError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AIError::AuthenticationFailed,
        StatusCode::TOO_MANY_REQUESTS => AIError::RateLimited {
            retry_after_secs: retry_after(body),
        },
        StatusCode::BAD_REQUEST if body.contains("content_policy") => {
            AIError::Refused(error_message(body).unwrap_or_else(|| body.to_string()))
        }
        StatusCode::BAD_REQUEST => {
            AIError::BadRequest(error_message(body).unwrap_or_else(|| body.to_string()))
        }
        s if s.is_server_error() => AIError::Unavailable(format!("{}: {}", s, body)),
        s => AIError::Network(format!("unexpected status {}", s)),
    }
}

fn error_message(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    Some(parsed.error.message)
}

/// Reads "try again in Ns" from an error body.
fn retry_after(body: &str) -> u32 {
    error_message(body)
        .and_then(|message| {
            let rest = message.split("try again in ").nth(1)?;
            let digits: String = rest.chars().take_while(char::is_ascii_digit).collect();
            digits.parse().ok()
        })
        .unwrap_or(DEFAULT_RETRY_AFTER_SECS)
}

fn role_name(role: Role) -> &'static str {
    match role {
        Role::System => "system",
        Role::User => "user",
        Role::Assistant => "assistant",
    }
}

// ----- Wire types -----

#[derive(Debug, Serialize)]
struct ChatBody<'a> {
    model: &'a str,
    messages: Vec<ChatLine<'a>>,
    max_tokens: u32,
    temperature: f32,
}

impl<'a> ChatBody<'a> {
    fn new(model: &'a str, request: &'a CompletionRequest) -> Self {
        let system = ChatLine {
            role: role_name(Role::System),
            content: &request.system_prompt,
        };
        let transcript = request.transcript.iter().map(|line| ChatLine {
            role: role_name(line.role),
            content: &line.content,
        });

        Self {
            model,
            messages: std::iter::once(system).chain(transcript).collect(),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatLine<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    model: String,
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

impl ChatReply {
    fn into_completion(self) -> Result<CompletionResponse, AIError> {
        let choice = self
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AIError::MalformedReply("no choices".to_string()))?;

        let finish_reason = match choice.finish_reason.as_deref() {
            Some("length") => FinishReason::Length,
            Some("content_filter") => FinishReason::ContentFilter,
            _ => FinishReason::Stop,
        };

        Ok(CompletionResponse {
            content: choice.message.content.unwrap_or_default(),
            model: self.model,
            finish_reason,
            tokens_used: self.usage.map_or(0, |u| u.total_tokens),
        })
    }
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReplyMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatReplyMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    total_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

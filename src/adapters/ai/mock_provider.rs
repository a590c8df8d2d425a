//! Scripted AI provider for tests and offline runs.
//!
//! Replies are consumed from a script in order; once the script runs dry
//! every call gets [`DEFAULT_REPLY`]. Failures and latency can be scripted
//! too, which is how the degraded paths of the orchestrator are exercised.
//!
//! ```ignore
//! let ai = MockAIProvider::new()
//!     .with_response("Happy to help with your logo!")
//!     .with_error(AIError::Unavailable("maintenance".into()));
//! ```

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::sleep;

use crate::ports::{
    AIError, AIProvider, CompletionRequest, CompletionResponse, FinishReason, ProviderInfo,
};

pub const DEFAULT_REPLY: &str =
    "Thanks for the details! Could you tell me a bit more about your project?";

const MOCK_MODEL: &str = "mock-model";

/// Scripted provider. Clones share the script and the request log.
#[derive(Debug, Clone, Default)]
pub struct MockAIProvider {
    script: Arc<Mutex<VecDeque<Result<String, AIError>>>>,
    requests: Arc<Mutex<Vec<CompletionRequest>>>,
    delay: Duration,
}

// A panic while holding the lock cannot leave either queue half-written.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockAIProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a successful reply.
    pub fn with_response(self, reply: impl Into<String>) -> Self {
        lock(&self.script).push_back(Ok(reply.into()));
        self
    }

    /// Queues a failure.
    pub fn with_error(self, error: AIError) -> Self {
        lock(&self.script).push_back(Err(error));
        self
    }

    /// Latency added to every call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn call_count(&self) -> usize {
        lock(&self.requests).len()
    }

    /// Every request received so far, oldest first.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        lock(&self.requests).clone()
    }

    pub fn last_system_prompt(&self) -> Option<String> {
        lock(&self.requests)
            .last()
            .map(|request| request.system_prompt.clone())
    }
}

#[async_trait]
impl AIProvider for MockAIProvider {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, AIError> {
        let prompt_words = request.system_prompt.split_whitespace().count();
        lock(&self.requests).push(request);

        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }

        let next = lock(&self.script).pop_front();
        let content = next.unwrap_or_else(|| Ok(DEFAULT_REPLY.to_string()))?;
        let tokens_used = (prompt_words + content.split_whitespace().count()) as u32;

        Ok(CompletionResponse {
            content,
            model: MOCK_MODEL.to_string(),
            finish_reason: FinishReason::Stop,
            tokens_used,
        })
    }

    fn provider_info(&self) -> ProviderInfo {
        ProviderInfo::new("mock", MOCK_MODEL)
    }
}

//! ProcessMessage handler: the per-turn conversation loop.
//!
//! Sequences the pipeline for one visitor message:
//!
//! 1. Blocked-content check (short-circuits, nothing is stored)
//! 2. Entity extraction and intent classification, phase update
//! 3. Signal analysis and memory update
//! 4. Suggestions and proactive guidance analysis
//! 5. LLM reply under a timeout, personalized to the visitor
//! 6. Due guidance hint appended, writes persisted, brief reported
//!
//! The handler is the only error boundary. Upstream failures (LLM, storage)
//! degrade the turn but never abort it; state derived from the visitor's
//! own message is kept either way.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::time::timeout;

use super::prompt::build_system_prompt;
use crate::config::AppConfig;
use crate::domain::brief::BriefStatus;
use crate::domain::conversation::{
    ConversationMessage, ConversationPhase, EnhancedIntentContext, Intent, IntentClassifier,
    SignalAnalyzer,
};
use crate::domain::foundation::{DomainError, Language, Timestamp};
use crate::domain::guidance::GuidanceConfig;
use crate::domain::lexicon::{LanguagePack, LanguagePacks};
use crate::domain::session::ConversationSession;
use crate::domain::suggestion::{
    fallback_suggestions, AdvancedSuggestion, SuggestionEngine, MAX_SUGGESTIONS,
};
use crate::ports::{
    AIError, AIProvider, CompletionRequest, ContentFilter, ConversationRepository, FinishReason,
};

/// Tunables for the orchestrator.
#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    /// Budget for the LLM call, retries included.
    pub ai_timeout: Duration,
    /// Messages of history sent to the LLM.
    pub history_window: usize,
    pub max_tokens: u32,
    pub temperature: f32,
    pub max_suggestions: usize,
    /// Guidance timing for sessions started through the orchestrator.
    pub guidance: GuidanceConfig,
}

impl OrchestratorSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            ai_timeout: config.ai.timeout(),
            history_window: config.conversation.history_window,
            max_tokens: config.ai.max_tokens,
            temperature: config.ai.temperature,
            max_suggestions: config.conversation.max_suggestions,
            guidance: config.conversation.guidance_config(),
        }
    }
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}

/// What the host shows the visitor after a turn.
#[derive(Debug, Clone, Serialize)]
pub struct TurnOutcome {
    /// Assistant reply, with a guidance hint appended when one was due.
    pub response: String,
    /// Quick-reply texts, best first.
    pub suggestions: Vec<String>,
    /// Ranked suggestions behind `suggestions`; empty for blocked turns.
    pub ranked_suggestions: Vec<AdvancedSuggestion>,
    /// Classified intent; `None` when the message was blocked.
    pub intent: Option<Intent>,
    pub phase: ConversationPhase,
    /// Guidance text appended to the reply, if any.
    pub guidance_shown: Option<String>,
    /// Present once the conversation reached completion.
    pub brief: Option<BriefStatus>,
    /// The message hit the content filter.
    pub blocked: bool,
    /// The reply is a canned fallback because the LLM failed.
    pub degraded: bool,
}

/// Top-level conversation loop.
pub struct ConversationOrchestrator {
    ai: Arc<dyn AIProvider>,
    filter: Arc<dyn ContentFilter>,
    repository: Arc<dyn ConversationRepository>,
    packs: Arc<LanguagePacks>,
    classifier: IntentClassifier,
    suggestions: SuggestionEngine,
    settings: OrchestratorSettings,
}

impl ConversationOrchestrator {
    /// Creates an orchestrator with the enhanced presets and default settings.
    pub fn new(
        ai: Arc<dyn AIProvider>,
        filter: Arc<dyn ContentFilter>,
        repository: Arc<dyn ConversationRepository>,
        packs: Arc<LanguagePacks>,
    ) -> Self {
        Self {
            ai,
            filter,
            repository,
            packs,
            classifier: IntentClassifier::default(),
            suggestions: SuggestionEngine::new(MAX_SUGGESTIONS),
            settings: OrchestratorSettings::default(),
        }
    }

    /// Applies the classifier presets and tunables from configuration.
    pub fn configured(mut self, config: &AppConfig) -> Self {
        self.classifier = IntentClassifier::new(
            config.conversation.classifier_config(),
            config.conversation.phase_thresholds(),
        );
        self.with_settings(OrchestratorSettings::from_config(config))
    }

    pub fn with_settings(mut self, settings: OrchestratorSettings) -> Self {
        self.suggestions = SuggestionEngine::new(settings.max_suggestions);
        self.settings = settings;
        self
    }

    pub fn settings(&self) -> &OrchestratorSettings {
        &self.settings
    }

    /// A fresh session using the configured guidance timing.
    pub fn start_session(&self, language: Language) -> ConversationSession {
        ConversationSession::with_guidance(language, self.settings.guidance.clone())
    }

    /// Processes one visitor message stamped now.
    ///
    /// # Errors
    ///
    /// - `BlankInput` if the message is blank
    pub async fn process_message(
        &self,
        session: &mut ConversationSession,
        text: &str,
    ) -> Result<TurnOutcome, DomainError> {
        self.process_message_at(session, text, Timestamp::now()).await
    }

    /// Processes one visitor message as if it arrived at `now`.
    ///
    /// # Errors
    ///
    /// - `BlankInput` if the message is blank
    pub async fn process_message_at(
        &self,
        session: &mut ConversationSession,
        text: &str,
        now: Timestamp,
    ) -> Result<TurnOutcome, DomainError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(DomainError::blank("content"));
        }

        let language = if text.chars().any(char::is_alphabetic) {
            Language::detect(text)
        } else {
            session.language()
        };

        if self.filter.is_blocked(text) {
            tracing::warn!(session_id = %session.id(), "Blocked message");
            return Ok(TurnOutcome {
                response: self.filter.warning(language),
                suggestions: self.filter.suggestions(language),
                ranked_suggestions: Vec::new(),
                intent: None,
                phase: session.phase(),
                guidance_shown: None,
                brief: None,
                blocked: true,
                degraded: false,
            });
        }

        let pack = self.packs.pack(language);

        let user_message = session.push_user_message(text, language, now)?.clone();
        self.persist_message(session, &user_message).await;

        let phase_before = session.phase();
        let base = session.classify_turn(&self.classifier, text, pack);
        if session.phase() != phase_before {
            tracing::info!(
                session_id = %session.id(),
                from = %phase_before,
                to = %session.phase(),
                "Conversation phase advanced"
            );
        }

        let enhanced = SignalAnalyzer::enhance(base, text, session.messages(), pack);
        session.update_memory(&enhanced, text, pack);

        let ranked = session.generate_suggestions(&self.suggestions, &enhanced, pack, now);
        session.analyze_guidance(&enhanced, pack, now);
        // The prompt lists what is still missing, so refresh before composing.
        let changed_fields = session.refresh_brief();

        let composed = self.compose_reply(session, &enhanced, &ranked, pack).await;
        let (reply, ranked, degraded) = match composed {
            Ok(reply) => (reply, ranked, false),
            Err(err) => {
                tracing::warn!(session_id = %session.id(), error = %err, "Falling back to canned reply");
                let style = session.memory().user_preferences().communication_style;
                (
                    pack.fallback_message(style).to_string(),
                    fallback_suggestions(pack, now),
                    true,
                )
            }
        };

        let assistant_message = session.push_assistant_message(&reply, now)?.clone();
        self.persist_message(session, &assistant_message).await;

        let mut response = reply;
        let guidance_shown = match session.take_due_guidance(now) {
            Some(action) => {
                let hint = session.push_assistant_message(&action.message, now)?.clone();
                self.persist_message(session, &hint).await;
                response.push_str("\n\n");
                response.push_str(&action.message);
                Some(action.message)
            }
            None => None,
        };

        for (field, value) in changed_fields {
            if let Err(err) = self
                .repository
                .patch_brief_field(session.id(), field, &value)
                .await
            {
                tracing::warn!(session_id = %session.id(), field = %field, error = %err, "Failed to patch brief field");
            }
        }
        if let Err(err) = self
            .repository
            .save_memory_snapshot(session.id(), &session.memory().snapshot())
            .await
        {
            tracing::warn!(session_id = %session.id(), error = %err, "Failed to save memory snapshot");
        }

        let phase = session.phase();
        let brief = (phase == ConversationPhase::Completion).then(|| session.brief_status());
        if brief.is_some() && phase_before != ConversationPhase::Completion {
            tracing::info!(
                session_id = %session.id(),
                missing = session.brief().missing_fields().len(),
                "Brief complete"
            );
        }

        Ok(TurnOutcome {
            response,
            suggestions: ranked.iter().map(|s| s.text.clone()).collect(),
            ranked_suggestions: ranked,
            intent: Some(enhanced.base.intent),
            phase,
            guidance_shown,
            brief,
            blocked: false,
            degraded,
        })
    }

    /// Guidance that became due between turns, e.g. after the visitor
    /// stopped typing. The hint is logged as an assistant message.
    pub async fn pending_guidance(
        &self,
        session: &mut ConversationSession,
        now: Timestamp,
    ) -> Option<String> {
        let action = session.take_due_guidance(now)?;
        match session.push_assistant_message(&action.message, now) {
            Ok(message) => {
                let message = message.clone();
                self.persist_message(session, &message).await;
            }
            Err(err) => tracing::warn!(error = %err.message, "Guidance message rejected"),
        }
        Some(action.message)
    }

    /// Asks the LLM for the reply and personalizes it.
    async fn compose_reply(
        &self,
        session: &ConversationSession,
        context: &EnhancedIntentContext,
        suggestions: &[AdvancedSuggestion],
        pack: &LanguagePack,
    ) -> Result<String, AIError> {
        let prompt = build_system_prompt(
            session.language(),
            context,
            session.memory(),
            session.brief(),
            suggestions,
        );
        let request = CompletionRequest::new(*session.id(), prompt)
            .with_transcript(session.messages(), self.settings.history_window)
            .with_limits(self.settings.max_tokens, self.settings.temperature);

        let completion = timeout(self.settings.ai_timeout, self.ai.complete(request))
            .await
            .map_err(|_| AIError::timeout(self.settings.ai_timeout))??;

        if completion.finish_reason == FinishReason::ContentFilter {
            return Err(AIError::Refused("reply withheld by provider filter".to_string()));
        }
        let content = completion.content.trim();
        if content.is_empty() {
            return Err(AIError::MalformedReply("empty reply".to_string()));
        }

        tracing::debug!(model = %completion.model, tokens = completion.tokens_used, "Reply generated");
        Ok(session
            .memory()
            .get_personalized_response(content, &context.base, pack))
    }

    async fn persist_message(&self, session: &ConversationSession, message: &ConversationMessage) {
        if let Err(err) = self.repository.save_message(session.id(), message).await {
            tracing::warn!(session_id = %session.id(), error = %err, "Failed to save message");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{InMemoryConversationRepository, KeywordBlocklist, MockAIProvider};

    struct Fixture {
        ai: MockAIProvider,
        repo: Arc<InMemoryConversationRepository>,
        orchestrator: ConversationOrchestrator,
    }

    fn fixture(ai: MockAIProvider) -> Fixture {
        let repo = Arc::new(InMemoryConversationRepository::new());
        let orchestrator = ConversationOrchestrator::new(
            Arc::new(ai.clone()),
            Arc::new(KeywordBlocklist::new(["forbidden"])),
            repo.clone(),
            LanguagePacks::builtin().unwrap(),
        );
        Fixture { ai, repo, orchestrator }
    }

    mod happy_path {
        use super::*;

        #[tokio::test]
        async fn reply_comes_from_provider_and_is_stored() {
            let f = fixture(MockAIProvider::new().with_response("Great, tell me more about the website."));
            let mut session = f.orchestrator.start_session(Language::English);

            let outcome = f
                .orchestrator
                .process_message(&mut session, "I need help with a website")
                .await
                .unwrap();

            assert!(outcome.response.starts_with("Great, tell me more"));
            assert!(!outcome.blocked);
            assert!(!outcome.degraded);
            assert!(outcome.intent.is_some());
            assert!(!outcome.suggestions.is_empty());
            assert!(outcome.suggestions.len() <= MAX_SUGGESTIONS);
            assert_eq!(f.ai.call_count(), 1);

            let stored = f.repo.messages(session.id()).await;
            assert!(stored.len() >= 2);
            assert_eq!(stored[0].content(), "I need help with a website");
            assert!(f.repo.memory_snapshot(session.id()).await.is_some());
        }

        #[tokio::test]
        async fn prompt_carries_phase_directive() {
            let f = fixture(MockAIProvider::new());
            let mut session = f.orchestrator.start_session(Language::English);

            f.orchestrator
                .process_message(&mut session, "hello there")
                .await
                .unwrap();

            let prompt = f.ai.last_system_prompt().unwrap();
            assert!(prompt.contains(ConversationPhase::Discovery.directive()));
        }

        #[tokio::test]
        async fn budget_is_patched_into_brief_store() {
            let f = fixture(MockAIProvider::new());
            let mut session = f.orchestrator.start_session(Language::English);

            f.orchestrator
                .process_message(&mut session, "My budget is $2,000 for a logo")
                .await
                .unwrap();

            let brief = f.repo.brief_fields(session.id()).await;
            assert_eq!(
                brief.get(&crate::domain::brief::BriefField::Budget).map(String::as_str),
                Some("$2,000")
            );
        }
    }

    mod degraded {
        use super::*;

        #[tokio::test]
        async fn provider_error_yields_fallback() {
            let f = fixture(MockAIProvider::new().with_error(AIError::Unavailable("down".to_string())));
            let mut session = f.orchestrator.start_session(Language::English);

            let outcome = f
                .orchestrator
                .process_message(&mut session, "How much is a logo?")
                .await
                .unwrap();

            let pack = LanguagePacks::builtin().unwrap();
            let style = session.memory().user_preferences().communication_style;
            assert!(outcome.degraded);
            assert!(outcome.response.starts_with(pack.pack(Language::English).fallback_message(style)));
            assert!(!outcome.suggestions.is_empty());
            // Memory still learned from the message.
            assert_eq!(session.memory().session_metrics().message_count, 1);
        }

        #[tokio::test]
        async fn slow_provider_times_out() {
            let f = fixture(MockAIProvider::new().with_delay(Duration::from_millis(200)));
            let orchestrator = f.orchestrator.with_settings(OrchestratorSettings {
                ai_timeout: Duration::from_millis(20),
                ..OrchestratorSettings::default()
            });
            let mut session = orchestrator.start_session(Language::English);

            let outcome = orchestrator
                .process_message(&mut session, "hello")
                .await
                .unwrap();

            assert!(outcome.degraded);
        }

        #[tokio::test]
        async fn empty_completion_is_degraded() {
            let f = fixture(MockAIProvider::new().with_response("   "));
            let mut session = f.orchestrator.start_session(Language::English);

            let outcome = f
                .orchestrator
                .process_message(&mut session, "hello")
                .await
                .unwrap();

            assert!(outcome.degraded);
            assert!(!outcome.response.trim().is_empty());
        }

        #[tokio::test]
        async fn storage_failure_does_not_fail_the_turn() {
            let f = fixture(MockAIProvider::new().with_response("Sure!"));
            f.repo.set_fail_writes(true);
            let mut session = f.orchestrator.start_session(Language::English);

            let outcome = f
                .orchestrator
                .process_message(&mut session, "hello")
                .await
                .unwrap();

            assert!(outcome.response.starts_with("Sure!"));
            assert!(!outcome.degraded);
            assert_eq!(session.user_message_count(), 1);
        }
    }

    mod blocked {
        use super::*;

        #[tokio::test]
        async fn blocked_message_short_circuits() {
            let f = fixture(MockAIProvider::new());
            let mut session = f.orchestrator.start_session(Language::English);
            let filter = KeywordBlocklist::new(["forbidden"]);

            let outcome = f
                .orchestrator
                .process_message(&mut session, "something FORBIDDEN here")
                .await
                .unwrap();

            assert!(outcome.blocked);
            assert_eq!(outcome.response, filter.warning(Language::English));
            assert_eq!(outcome.suggestions, filter.suggestions(Language::English));
            assert!(outcome.intent.is_none());
            assert!(session.messages().is_empty());
            assert!(session.intent_history().is_empty());
            assert_eq!(f.ai.call_count(), 0);
            assert!(f.repo.messages(session.id()).await.is_empty());
        }
    }

    #[tokio::test]
    async fn blank_message_is_rejected() {
        let f = fixture(MockAIProvider::new());
        let mut session = f.orchestrator.start_session(Language::English);

        assert!(f.orchestrator.process_message(&mut session, "  \n").await.is_err());
        assert!(session.messages().is_empty());
    }

    #[tokio::test]
    async fn digits_only_keep_session_language() {
        let f = fixture(MockAIProvider::new());
        let mut session = f.orchestrator.start_session(Language::English);

        f.orchestrator
            .process_message(&mut session, "مرحبا، أريد شعار")
            .await
            .unwrap();
        f.orchestrator
            .process_message(&mut session, "500")
            .await
            .unwrap();

        assert_eq!(session.language(), Language::Arabic);
    }
}

//! Conversation session aggregate.
//!
//! A session owns every piece of per-visitor state the pipeline reads and
//! mutates: the message log, the rolling intent history, the funnel phase,
//! memory, guidance and the suggestion log. Components receive that state
//! by reference; nothing is shared between sessions.
//!
//! # Concurrency
//!
//! One turn runs to completion before the next starts. Hosts that accept
//! concurrent messages for the same session must serialize them.

use serde::{Deserialize, Serialize};

use crate::domain::brief::{BriefDraft, BriefField, BriefStatus};
use crate::domain::conversation::{
    ConversationMessage, ConversationPhase, EnhancedIntentContext, Intent, IntentClassifier,
    IntentContext, Role, INTENT_HISTORY_CAPACITY,
};
use crate::domain::foundation::{BoundedHistory, DomainError, Language, SessionId, Timestamp};
use crate::domain::guidance::{GuidanceAction, GuidanceConfig, ProactiveGuidance};
use crate::domain::lexicon::LanguagePack;
use crate::domain::memory::ConversationMemory;
use crate::domain::suggestion::{AdvancedSuggestion, SuggestionEngine, SuggestionLog};

/// Session aggregate for one visitor conversation.
///
/// # Invariants
///
/// - `messages` is append-only
/// - `intent_history` holds at most [`INTENT_HISTORY_CAPACITY`] contexts
/// - `phase` never regresses except through [`ConversationSession::reset_flow`]
/// - `project_description` is set at most once
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationSession {
    id: SessionId,
    language: Language,
    messages: Vec<ConversationMessage>,
    intent_history: BoundedHistory<IntentContext>,
    phase: ConversationPhase,
    memory: ConversationMemory,
    guidance: ProactiveGuidance,
    suggestion_log: SuggestionLog,

    /// First visitor message that described the project.
    project_description: Option<String>,

    /// Brief as last reported to persistence.
    recorded_brief: BriefDraft,

    created_at: Timestamp,
    updated_at: Timestamp,
}

impl ConversationSession {
    /// Starts a session in `language` with default guidance timing.
    pub fn new(language: Language) -> Self {
        Self::with_guidance(language, GuidanceConfig::default())
    }

    pub fn with_guidance(language: Language, guidance: GuidanceConfig) -> Self {
        let now = Timestamp::now();
        Self {
            id: SessionId::new(),
            language,
            messages: Vec::new(),
            intent_history: BoundedHistory::with_capacity(INTENT_HISTORY_CAPACITY),
            phase: ConversationPhase::Discovery,
            memory: ConversationMemory::new(language),
            guidance: ProactiveGuidance::new(guidance),
            suggestion_log: SuggestionLog::new(),
            project_description: None,
            recorded_brief: BriefDraft {
                language,
                ..BriefDraft::default()
            },
            created_at: now,
            updated_at: now,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// Language of the most recent visitor message.
    pub fn language(&self) -> Language {
        self.language
    }

    pub fn messages(&self) -> &[ConversationMessage] {
        &self.messages
    }

    pub fn intent_history(&self) -> &BoundedHistory<IntentContext> {
        &self.intent_history
    }

    pub fn phase(&self) -> ConversationPhase {
        self.phase
    }

    pub fn memory(&self) -> &ConversationMemory {
        &self.memory
    }

    pub fn guidance(&self) -> &ProactiveGuidance {
        &self.guidance
    }

    pub fn suggestion_log(&self) -> &SuggestionLog {
        &self.suggestion_log
    }

    pub fn project_description(&self) -> Option<&str> {
        self.project_description.as_deref()
    }

    /// The brief as last recorded by [`ConversationSession::refresh_brief`].
    pub fn brief(&self) -> &BriefDraft {
        &self.recorded_brief
    }

    pub fn brief_status(&self) -> BriefStatus {
        BriefStatus::new(self.recorded_brief.clone(), self.phase)
    }

    pub fn user_message_count(&self) -> usize {
        self.messages.iter().filter(|m| m.is_user()).count()
    }

    pub fn created_at(&self) -> &Timestamp {
        &self.created_at
    }

    pub fn updated_at(&self) -> &Timestamp {
        &self.updated_at
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Message log
    // ─────────────────────────────────────────────────────────────────────────

    /// Appends a visitor message and switches the session to `language`.
    ///
    /// # Errors
    ///
    /// - `BlankInput` if the text is blank
    pub fn push_user_message(
        &mut self,
        text: &str,
        language: Language,
        now: Timestamp,
    ) -> Result<&ConversationMessage, DomainError> {
        let message = ConversationMessage::new(Role::User, text, now)?;
        self.language = language;
        Ok(self.append(message, now))
    }

    /// Appends an assistant reply.
    ///
    /// # Errors
    ///
    /// - `BlankInput` if the text is blank
    pub fn push_assistant_message(
        &mut self,
        text: &str,
        now: Timestamp,
    ) -> Result<&ConversationMessage, DomainError> {
        let message = ConversationMessage::new(Role::Assistant, text, now)?;
        Ok(self.append(message, now))
    }

    fn append(&mut self, message: ConversationMessage, now: Timestamp) -> &ConversationMessage {
        self.messages.push(message);
        self.updated_at = now;
        &self.messages[self.messages.len() - 1]
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Turn steps
    // ─────────────────────────────────────────────────────────────────────────

    /// Classifies the latest visitor message and records the result.
    ///
    /// The message must already be in the log.
    pub fn classify_turn(
        &mut self,
        classifier: &IntentClassifier,
        message: &str,
        pack: &LanguagePack,
    ) -> IntentContext {
        let context = classifier.classify(
            message,
            &self.messages,
            pack,
            &self.intent_history,
            self.phase,
        );
        self.record_intent(context.clone(), message);
        context
    }

    /// Pushes `context` into the intent history and adopts its phase.
    ///
    /// Returns the previous phase when the phase moved.
    pub fn record_intent(
        &mut self,
        context: IntentContext,
        message: &str,
    ) -> Option<ConversationPhase> {
        if self.project_description.is_none()
            && matches!(context.intent, Intent::ProjectInquiry | Intent::BriefCreation)
        {
            self.project_description = Some(message.trim().to_string());
        }

        let previous = self.phase;
        self.phase = self.phase.max(context.conversation_phase);
        self.intent_history.push(context);

        (self.phase != previous).then_some(previous)
    }

    /// Folds the turn into memory. The log must end with `message`.
    pub fn update_memory(
        &mut self,
        context: &EnhancedIntentContext,
        message: &str,
        pack: &LanguagePack,
    ) {
        self.memory
            .update_memory(&self.messages, context, message, pack);
    }

    pub fn generate_suggestions(
        &mut self,
        engine: &SuggestionEngine,
        context: &EnhancedIntentContext,
        pack: &LanguagePack,
        now: Timestamp,
    ) -> Vec<AdvancedSuggestion> {
        engine.generate(
            context,
            &self.memory,
            &self.messages,
            pack,
            &mut self.suggestion_log,
            now,
        )
    }

    /// Runs the guidance checks and activates what fired.
    ///
    /// Returns how many actions became active.
    pub fn analyze_guidance(
        &mut self,
        context: &EnhancedIntentContext,
        pack: &LanguagePack,
        now: Timestamp,
    ) -> usize {
        let candidates = self.guidance.analyze_conversation_flow(
            &self.messages,
            context,
            &self.intent_history,
            &self.memory,
            pack,
            now,
        );
        self.guidance.activate_guidance(candidates)
    }

    /// The next guidance action if the gate allows showing one now.
    pub fn take_due_guidance(&mut self, now: Timestamp) -> Option<GuidanceAction> {
        self.guidance.take_due(&self.messages, now)
    }

    /// Records a click on a suggestion.
    pub fn record_suggestion_usage(&mut self, suggestion_id: &str, now: Timestamp) {
        self.suggestion_log.record_usage(suggestion_id, now);
    }

    /// Re-assembles the brief and returns the fields that changed since the
    /// previous call.
    pub fn refresh_brief(&mut self) -> Vec<(BriefField, String)> {
        let mut draft = BriefDraft::from_memory(&self.memory, self.project_description.as_deref());
        draft.language = self.language;
        let changed = draft.changed_since(&self.recorded_brief);
        self.recorded_brief = draft;
        changed
    }

    /// Starts a new service flow: phase back to discovery, intent history
    /// and active guidance cleared. Memory and the message log are kept.
    pub fn reset_flow(&mut self) {
        self.phase = ConversationPhase::Discovery;
        self.intent_history.clear();
        self.guidance.clear_active();
        self.updated_at = Timestamp::now();
    }
}

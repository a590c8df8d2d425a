//! System prompt composition.
//!
//! The LLM only phrases the reply; everything it needs to stay on track
//! (phase directive, visitor signals, known project facts, open brief
//! fields) is spelled out here.

use std::fmt::Write;

use crate::domain::brief::BriefDraft;
use crate::domain::conversation::EnhancedIntentContext;
use crate::domain::foundation::Language;
use crate::domain::memory::ConversationMemory;
use crate::domain::suggestion::AdvancedSuggestion;

const SUGGESTIONS_IN_PROMPT: usize = 3;

/// Builds the system prompt for one turn.
pub fn build_system_prompt(
    language: Language,
    context: &EnhancedIntentContext,
    memory: &ConversationMemory,
    brief: &BriefDraft,
    suggestions: &[AdvancedSuggestion],
) -> String {
    let mut prompt = String::from(
        "You are a friendly assistant for a creative-services studio. \
         You help visitors describe their project so it can become a structured brief.\n",
    );

    let reply_language = match language {
        Language::English => "English",
        Language::Arabic => "Arabic",
    };
    let phase = context.base.conversation_phase;
    let prefs = memory.user_preferences();
    let project = memory.project_context();

    // Writing to a String cannot fail.
    let _ = writeln!(prompt, "Reply in {}.", reply_language);
    let _ = writeln!(prompt, "Conversation phase: {}. {}", phase.label(), phase.directive());
    let _ = writeln!(
        prompt,
        "Visitor intent: {} ({:.0}% confidence). Emotional state: {}. Urgency: {}.",
        context.base.intent,
        context.base.confidence,
        context.emotional_state,
        context.urgency_level
    );
    let _ = writeln!(
        prompt,
        "Preferred tone: {}. Preferred length: {:?}.",
        prefs.communication_style, prefs.response_length
    );

    if !project.mentioned_services.is_empty() {
        let _ = writeln!(prompt, "Services discussed: {}.", project.mentioned_services.join(", "));
    }
    if let Some(budget) = &project.budget_range {
        let _ = writeln!(prompt, "Budget: {}.", budget);
    }
    if let Some(timeline) = &project.timeline {
        let _ = writeln!(prompt, "Timeline: {}.", timeline);
    }
    if let Some(industry) = &project.industry_focus {
        let _ = writeln!(prompt, "Industry: {}.", industry);
    }

    let missing: Vec<&str> = brief
        .missing_fields()
        .into_iter()
        .map(|f| f.key())
        .collect();
    if !missing.is_empty() {
        let _ = writeln!(prompt, "Still unknown for the brief: {}.", missing.join(", "));
    }

    if !suggestions.is_empty() {
        let next: Vec<&str> = suggestions
            .iter()
            .take(SUGGESTIONS_IN_PROMPT)
            .map(|s| s.text.as_str())
            .collect();
        let _ = writeln!(prompt, "Good next steps: {}.", next.join(" | "));
    }

    prompt.push_str("Ask at most one question. Keep it concise.");
    prompt
}

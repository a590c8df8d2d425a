//! Terminal front end for the brief assistant.
//!
//! Reads visitor messages from stdin, one per line. An empty line checks for
//! a pending guidance hint, a number picks one of the last suggestions,
//! `/brief` prints the current draft, `/reset` starts a new service flow and
//! `/quit` exits.

use std::error::Error;
use std::sync::Arc;

use secrecy::ExposeSecret;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use brief_assistant::adapters::{
    InMemoryConversationRepository, KeywordBlocklist, MockAIProvider, OpenAIConfig, OpenAIProvider,
};
use brief_assistant::application::{ConversationOrchestrator, TurnOutcome};
use brief_assistant::config::{AiConfig, AiProvider, AppConfig};
use brief_assistant::domain::foundation::Timestamp;
use brief_assistant::domain::suggestion::AdvancedSuggestion;
use brief_assistant::ports::{AIError, AIProvider};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = AppConfig::load()?;
    config.logging.init()?;
    config.validate()?;

    let packs = config.language_packs()?;
    let ai = build_provider(&config.ai)?;
    tracing::info!(
        provider = %ai.provider_info().name,
        model = %ai.provider_info().model,
        "Starting brief assistant"
    );

    let orchestrator = ConversationOrchestrator::new(
        ai,
        Arc::new(KeywordBlocklist::default()),
        Arc::new(InMemoryConversationRepository::new()),
        packs,
    )
    .configured(&config);
    let mut session = orchestrator.start_session(config.conversation.default_language);
    let mut last_suggestions: Vec<AdvancedSuggestion> = Vec::new();

    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let input = line.trim();
        let text = match input {
            "/quit" => break,
            "/reset" => {
                session.reset_flow();
                stdout.write_all(b"(new service flow)\n").await?;
                continue;
            }
            "/brief" => {
                let brief = serde_json::to_string_pretty(&session.brief_status())?;
                stdout.write_all(format!("{}\n", brief).as_bytes()).await?;
                continue;
            }
            "" => {
                if let Some(hint) = orchestrator
                    .pending_guidance(&mut session, Timestamp::now())
                    .await
                {
                    stdout.write_all(format!("assistant> {}\n", hint).as_bytes()).await?;
                }
                continue;
            }
            _ => match picked_suggestion(input, &last_suggestions) {
                Some(suggestion) => {
                    session.record_suggestion_usage(&suggestion.id, Timestamp::now());
                    suggestion.text.clone()
                }
                None => input.to_string(),
            },
        };

        let outcome = orchestrator.process_message(&mut session, &text).await?;
        stdout.write_all(render(&outcome).as_bytes()).await?;
        stdout.flush().await?;
        last_suggestions = outcome.ranked_suggestions;
    }

    tracing::info!(
        session_id = %session.id(),
        messages = session.messages().len(),
        phase = %session.phase(),
        "Session ended"
    );
    Ok(())
}

fn build_provider(config: &AiConfig) -> Result<Arc<dyn AIProvider>, AIError> {
    match (&config.provider, &config.openai_api_key) {
        (AiProvider::OpenAI, Some(key)) => {
            let openai = OpenAIConfig::new(key.expose_secret().clone())
                .with_model(config.model.clone())
                .with_base_url(config.base_url.clone())
                .with_timeout(config.timeout())
                .with_max_retries(config.max_retries);
            Ok(Arc::new(OpenAIProvider::new(openai)?))
        }
        (AiProvider::OpenAI, None) => Err(AIError::AuthenticationFailed),
        (AiProvider::Mock, _) => Ok(Arc::new(MockAIProvider::new())),
    }
}

fn picked_suggestion<'a>(
    input: &str,
    suggestions: &'a [AdvancedSuggestion],
) -> Option<&'a AdvancedSuggestion> {
    let index: usize = input.parse().ok()?;
    suggestions.get(index.checked_sub(1)?)
}

fn render(outcome: &TurnOutcome) -> String {
    let mut out = format!("assistant> {}\n", outcome.response);
    for (i, suggestion) in outcome.suggestions.iter().enumerate() {
        out.push_str(&format!("  [{}] {}\n", i + 1, suggestion));
    }
    if let Some(status) = &outcome.brief {
        if let Ok(brief) = serde_json::to_string_pretty(status) {
            out.push_str(&format!("brief ready:\n{}\n", brief));
        }
    }
    out
}

//! AI provider adapters.
//!
//! - `MockAIProvider` - scripted replies for tests and offline runs
//! - `OpenAIProvider` - OpenAI-compatible chat completions

mod mock_provider;
mod openai_provider;

pub use mock_provider::{MockAIProvider, DEFAULT_REPLY};
pub use openai_provider::{OpenAIConfig, OpenAIProvider};

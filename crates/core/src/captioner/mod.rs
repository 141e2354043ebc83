//! AI caption generation.

mod generator;
mod llm;

use std::sync::Arc;

pub use generator::{CaptionGenerator, CaptionRequest, CaptionerConfig, GeneratedCaption};
pub use llm::{
    CompletionRequest, CompletionResponse, GeminiClient, LlmClient, LlmError, LlmUsage,
    OllamaClient,
};

use crate::settings::AiProvider;

/// Builds an LLM client for a provider key. Only Google has a live keyed
/// integration; other providers report `NotConfigured`. Local Ollama
/// inference takes no key, so callers construct [`OllamaClient`] directly.
pub fn build_client(
    provider: AiProvider,
    api_key: &str,
    model: &str,
) -> Result<Arc<dyn LlmClient>, LlmError> {
    match provider {
        AiProvider::Google => Ok(Arc::new(GeminiClient::new(api_key, model))),
        AiProvider::Openai
        | AiProvider::Anthropic
        | AiProvider::Grok
        | AiProvider::Deepseek
        | AiProvider::Openart => Err(LlmError::NotConfigured),
    }
}

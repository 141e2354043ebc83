//! Caption generation on top of an LLM client.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::llm::{CompletionRequest, LlmClient, LlmError, LlmUsage};
use crate::channel::Platform;

const SYSTEM_PROMPT: &str = "You are a social media copywriter. You write captions that \
perform well on short-form video platforms. Respond with the caption text only, \
no markdown, no quotes, no preamble.";

/// Configuration for the caption generator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptionerConfig {
    /// Attempts per request, counting the first.
    pub max_attempts: u32,
    /// Base delay between retries, doubled each attempt.
    pub retry_backoff_ms: u64,
    /// Per-attempt timeout in seconds.
    pub timeout_secs: u64,
    /// Maximum tokens for the generated caption.
    pub max_tokens: u32,
}

impl Default for CaptionerConfig {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            retry_backoff_ms: 500,
            timeout_secs: 30,
            max_tokens: 512,
        }
    }
}

/// A request for one caption.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaptionRequest {
    /// What the post is about, e.g. "5 morning habits that changed my life".
    pub topic: String,
    /// Platform the caption is written for.
    pub platform: Platform,
    /// Optional tone hint, e.g. "playful" or "authoritative".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tone: Option<String>,
}

/// A generated caption.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedCaption {
    pub text: String,
    pub provider: String,
    pub model: String,
    pub usage: LlmUsage,
}

/// Generates platform-tuned captions through a pluggable LLM client.
pub struct CaptionGenerator {
    client: Arc<dyn LlmClient>,
    config: CaptionerConfig,
}

impl CaptionGenerator {
    pub fn new(client: Arc<dyn LlmClient>, config: CaptionerConfig) -> Self {
        Self { client, config }
    }

    pub fn provider(&self) -> &str {
        self.client.provider()
    }

    pub fn model(&self) -> &str {
        self.client.model()
    }

    /// Generates a caption, retrying transient failures up to the configured
    /// attempt budget.
    pub async fn generate(&self, request: &CaptionRequest) -> Result<GeneratedCaption, LlmError> {
        let prompt = Self::build_prompt(request);
        let timeout = Duration::from_secs(self.config.timeout_secs);

        let mut last_error = LlmError::NotConfigured;
        for attempt in 1..=self.config.max_attempts {
            let completion = CompletionRequest::new(prompt.clone())
                .with_system(SYSTEM_PROMPT)
                .with_max_tokens(self.config.max_tokens);

            let result = tokio::time::timeout(timeout, self.client.complete(completion))
                .await
                .map_err(|_| LlmError::Timeout(timeout))
                .and_then(|r| r);

            match result {
                Ok(response) => {
                    let text = Self::strip_fences(&response.text);
                    if text.is_empty() {
                        last_error = LlmError::EmptyResponse;
                    } else {
                        return Ok(GeneratedCaption {
                            text,
                            provider: self.client.provider().to_string(),
                            model: response.model,
                            usage: response.usage,
                        });
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        provider = self.client.provider(),
                        attempt,
                        error = %e,
                        "caption generation attempt failed"
                    );
                    if !e.is_transient() {
                        return Err(e);
                    }
                    last_error = e;
                }
            }

            if attempt < self.config.max_attempts {
                let backoff = Duration::from_millis(
                    self.config.retry_backoff_ms.saturating_mul(1 << (attempt - 1)),
                );
                tokio::time::sleep(backoff).await;
            }
        }

        Err(last_error)
    }

    fn build_prompt(request: &CaptionRequest) -> String {
        let mut prompt = format!(
            "Write a caption for a {} post about: {}\n\n\
             Requirements:\n\
             - Start with an attention-grabbing hook line\n\
             - 2-3 short sentences of body text\n\
             - End with a call to action\n\
             - Finish with 5-8 relevant hashtags\n\
             - Plain text only",
            request.platform.label(),
            request.topic
        );
        if let Some(ref tone) = request.tone {
            prompt.push_str(&format!("\n- Tone: {}", tone));
        }
        prompt
    }

    /// Strips markdown code fences some models wrap their output in.
    fn strip_fences(text: &str) -> String {
        let trimmed = text.trim();
        let without_open = trimmed
            .strip_prefix("```")
            .map(|rest| {
                // Drop an optional language tag on the fence line
                match rest.split_once('\n') {
                    Some((_, body)) => body,
                    None => rest,
                }
            })
            .unwrap_or(trimmed);
        let without_close = without_open.strip_suffix("```").unwrap_or(without_open);
        without_close.trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::captioner::llm::CompletionResponse;
    use async_trait::async_trait;

    /// Mock LLM client with scripted responses.
    struct MockLlm {
        responses: Mutex<Vec<Result<String, LlmError>>>,
        calls: Mutex<u32>,
    }

    impl MockLlm {
        fn new(responses: Vec<Result<String, LlmError>>) -> Self {
            Self {
                responses: Mutex::new(responses),
                calls: Mutex::new(0),
            }
        }

        fn call_count(&self) -> u32 {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl LlmClient for MockLlm {
        fn provider(&self) -> &str {
            "mock"
        }

        fn model(&self) -> &str {
            "mock-model"
        }

        async fn complete(
            &self,
            _request: CompletionRequest,
        ) -> Result<CompletionResponse, LlmError> {
            *self.calls.lock().unwrap() += 1;
            let mut responses = self.responses.lock().unwrap();
            if responses.is_empty() {
                return Err(LlmError::EmptyResponse);
            }
            responses.remove(0).map(|text| CompletionResponse {
                text,
                usage: LlmUsage {
                    input_tokens: 10,
                    output_tokens: 20,
                },
                model: "mock-model".to_string(),
            })
        }
    }

    fn caption_request() -> CaptionRequest {
        CaptionRequest {
            topic: "5 morning habits that changed my life".to_string(),
            platform: Platform::Tiktok,
            tone: None,
        }
    }

    #[tokio::test]
    async fn test_generate_returns_caption() {
        let client = Arc::new(MockLlm::new(vec![Ok(
            "Wake up earlier!\n\nTry these habits. They work.\n\nFollow for more!\n\n#morning #habits #growth #routine #selfimprovement".to_string(),
        )]));
        let generator = CaptionGenerator::new(client.clone(), CaptionerConfig::default());

        let caption = generator.generate(&caption_request()).await.unwrap();
        assert!(caption.text.starts_with("Wake up earlier!"));
        assert_eq!(caption.provider, "mock");
        assert_eq!(caption.model, "mock-model");
        assert_eq!(client.call_count(), 1);
    }

    #[tokio::test]
    async fn test_generate_strips_markdown_fences() {
        let client = Arc::new(MockLlm::new(vec![Ok(
            "```\nThe caption body\n#one #two\n```".to_string()
        )]));
        let generator = CaptionGenerator::new(client, CaptionerConfig::default());

        let caption = generator.generate(&caption_request()).await.unwrap();
        assert_eq!(caption.text, "The caption body\n#one #two");
    }

    #[tokio::test(start_paused = true)]
    async fn test_generate_retries_transient_failure() {
        let client = Arc::new(MockLlm::new(vec![
            Err(LlmError::Http("connection reset".to_string())),
            Ok("Second try worked #win".to_string()),
        ]));
        let generator = CaptionGenerator::new(client.clone(), CaptionerConfig::default());

        let caption = generator.generate(&caption_request()).await.unwrap();
        assert_eq!(caption.text, "Second try worked #win");
        assert_eq!(client.call_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_backs_off_between_attempts() {
        let client = Arc::new(MockLlm::new(vec![
            Err(LlmError::Http("down".to_string())),
            Err(LlmError::Http("still down".to_string())),
            Ok("Recovered #ok".to_string()),
        ]));
        let generator = CaptionGenerator::new(
            client.clone(),
            CaptionerConfig {
                max_attempts: 3,
                retry_backoff_ms: 200,
                ..Default::default()
            },
        );

        let start = tokio::time::Instant::now();
        let caption = generator.generate(&caption_request()).await.unwrap();
        assert_eq!(caption.text, "Recovered #ok");
        assert_eq!(client.call_count(), 3);
        // 200ms after the first failure, 400ms after the second
        assert!(start.elapsed() >= Duration::from_millis(600));
    }

    #[tokio::test]
    async fn test_generate_does_not_retry_permanent_failure() {
        let client = Arc::new(MockLlm::new(vec![
            Err(LlmError::Api {
                status: 401,
                message: "invalid key".to_string(),
            }),
            Ok("should never be used".to_string()),
        ]));
        let generator = CaptionGenerator::new(client.clone(), CaptionerConfig::default());

        let result = generator.generate(&caption_request()).await;
        assert!(matches!(result, Err(LlmError::Api { status: 401, .. })));
        assert_eq!(client.call_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_generate_gives_up_after_max_attempts() {
        let client = Arc::new(MockLlm::new(vec![
            Err(LlmError::Http("down".to_string())),
            Err(LlmError::Http("still down".to_string())),
            Ok("too late".to_string()),
        ]));
        let generator = CaptionGenerator::new(
            client.clone(),
            CaptionerConfig {
                max_attempts: 2,
                ..Default::default()
            },
        );

        let result = generator.generate(&caption_request()).await;
        assert!(result.is_err());
        assert_eq!(client.call_count(), 2);
    }

    #[test]
    fn test_strip_fences_with_language_tag() {
        let stripped = CaptionGenerator::strip_fences("```text\nhello world\n```");
        assert_eq!(stripped, "hello world");
    }

    #[test]
    fn test_strip_fences_plain_text_untouched() {
        let stripped = CaptionGenerator::strip_fences("just a caption #tag");
        assert_eq!(stripped, "just a caption #tag");
    }

    #[test]
    fn test_prompt_includes_platform_and_tone() {
        let request = CaptionRequest {
            topic: "passive income ideas".to_string(),
            platform: Platform::Youtube,
            tone: Some("playful".to_string()),
        };
        let prompt = CaptionGenerator::build_prompt(&request);
        assert!(prompt.contains("YouTube"));
        assert!(prompt.contains("passive income ideas"));
        assert!(prompt.contains("Tone: playful"));
        assert!(prompt.contains("5-8 relevant hashtags"));
    }
}

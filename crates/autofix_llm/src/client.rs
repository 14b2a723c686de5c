//! LLM adapter for single-prompt completions.
//!
//! Supports OpenAI and Anthropic APIs, selected via environment variables.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{LlmError, LlmResult};

/// Sampling temperature for fix requests.
pub const TEMPERATURE: f32 = 0.2;

/// Completion token ceiling.
pub const MAX_TOKENS: u32 = 4096;

/// Total attempts per completion: the first try plus three retries.
const MAX_RETRIES: u32 = 4;

const OPENAI_URL: &str = "https://api.openai.com/v1/chat/completions";
const ANTHROPIC_URL: &str = "https://api.anthropic.com/v1/messages";

/// Sends a prompt to a model and returns its reply text.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> LlmResult<String>;
}

/// LLM provider type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProvider {
    OpenAI,
    Anthropic,
}

impl LlmProvider {
    pub fn name(&self) -> &'static str {
        match self {
            Self::OpenAI => "OpenAI",
            Self::Anthropic => "Anthropic",
        }
    }

    pub fn default_model(&self) -> &'static str {
        match self {
            Self::OpenAI => "gpt-4o-mini",
            Self::Anthropic => "claude-3-5-sonnet-latest",
        }
    }
}

/// LLM adapter that handles API calls
pub struct LlmAdapter {
    provider: LlmProvider,
    api_key: String,
    model: String,
    client: reqwest::Client,
}

impl LlmAdapter {
    /// Create a new LLM adapter with explicit configuration
    pub fn new(provider: LlmProvider, api_key: impl Into<String>, model: Option<String>) -> Self {
        Self {
            provider,
            api_key: api_key.into(),
            model: model.unwrap_or_else(|| provider.default_model().to_string()),
            client: reqwest::Client::new(),
        }
    }

    /// Create an LLM adapter from environment variables
    ///
    /// Checks in order:
    /// 1. OPENAI_API_KEY
    /// 2. ANTHROPIC_API_KEY
    ///
    /// `AUTOFIX_LLM_MODEL` overrides the provider's default model.
    pub fn from_env() -> LlmResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`LlmAdapter::from_env`] with a custom variable source.
    pub fn from_lookup<F>(lookup: F) -> LlmResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let model = lookup("AUTOFIX_LLM_MODEL").filter(|m| !m.is_empty());

        for (var, provider) in [
            ("OPENAI_API_KEY", LlmProvider::OpenAI),
            ("ANTHROPIC_API_KEY", LlmProvider::Anthropic),
        ] {
            if let Some(api_key) = lookup(var).filter(|k| !k.is_empty()) {
                return Ok(Self::new(provider, api_key, model));
            }
        }

        Err(LlmError::NotConfigured)
    }

    pub fn provider(&self) -> LlmProvider {
        self.provider
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn request_builder(&self, prompt: &str) -> reqwest::RequestBuilder {
        match self.provider {
            LlmProvider::OpenAI => self
                .client
                .post(OPENAI_URL)
                .header("Authorization", format!("Bearer {}", self.api_key))
                .json(&OpenAIRequest {
                    model: &self.model,
                    messages: vec![ChatMessage {
                        role: "user",
                        content: prompt,
                    }],
                    temperature: TEMPERATURE,
                    max_tokens: MAX_TOKENS,
                }),
            LlmProvider::Anthropic => self
                .client
                .post(ANTHROPIC_URL)
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", "2023-06-01")
                .json(&AnthropicRequest {
                    model: &self.model,
                    max_tokens: MAX_TOKENS,
                    temperature: TEMPERATURE,
                    messages: vec![ChatMessage {
                        role: "user",
                        content: prompt,
                    }],
                }),
        }
    }

    async fn send_once(&self, prompt: &str) -> LlmResult<String> {
        let response = self
            .request_builder(prompt)
            .header("Content-Type", "application/json")
            .send()
            .await
            .map_err(|e| LlmError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::Api {
                provider: self.provider.name().to_string(),
                status: status.as_u16(),
                body,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| LlmError::Network(e.to_string()))?;
        parse_reply(self.provider, &body)
    }
}

#[async_trait]
impl CompletionClient for LlmAdapter {
    async fn complete(&self, prompt: &str) -> LlmResult<String> {
        debug!(
            "Requesting completion from {} ({}), prompt {} bytes",
            self.provider.name(),
            self.model,
            prompt.len()
        );

        let mut last_error = None;
        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                tokio::time::sleep(backoff(attempt)).await;
            }

            match self.send_once(prompt).await {
                Ok(reply) => return Ok(reply),
                Err(e) if e.is_transient() => {
                    warn!(
                        "{} request failed (attempt {}/{}): {}",
                        self.provider.name(),
                        attempt + 1,
                        MAX_RETRIES,
                        e
                    );
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or(LlmError::RetriesExhausted))
    }
}

/// Delay before retry `attempt` (1-based): 1s, 2s, 4s.
fn backoff(attempt: u32) -> Duration {
    Duration::from_secs(1 << (attempt - 1))
}

/// Pull the reply text out of a provider response body.
fn parse_reply(provider: LlmProvider, body: &str) -> LlmResult<String> {
    match provider {
        LlmProvider::OpenAI => {
            let response: OpenAIResponse = serde_json::from_str(body)?;
            response
                .choices
                .into_iter()
                .next()
                .map(|c| c.message.content.unwrap_or_default())
                .ok_or_else(|| LlmError::InvalidResponse("No response from OpenAI".to_string()))
        }
        LlmProvider::Anthropic => {
            let response: AnthropicResponse = serde_json::from_str(body)?;
            let text: String = response
                .content
                .into_iter()
                .filter_map(|block| block.text)
                .collect();
            if text.is_empty() {
                return Err(LlmError::InvalidResponse(
                    "No text content from Anthropic".to_string(),
                ));
            }
            Ok(text)
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct OpenAIRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContent>,
}

#[derive(Debug, Deserialize)]
struct AnthropicContent {
    text: Option<String>,
}

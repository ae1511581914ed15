use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_API_ENDPOINT: &str = "https://api.openai.com/v1";
const DEFAULT_TIMEOUT_MS: u64 = 60_000;

const JSON_TEMPERATURE: f32 = 0.3;
const CHAT_TEMPERATURE: f32 = 0.7;
const TOP_P: f32 = 0.95;
const JSON_MAX_TOKENS: u32 = 8192;
const CHAT_MAX_TOKENS: u32 = 2048;

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub api_endpoint: String,
    pub timeout: Duration,
}

impl LlmConfig {
    /// Fills in the defaults and normalizes the endpoint so `/v1` appears
    /// exactly once. A blank API key counts as unset.
    pub fn new(
        api_key: Option<String>,
        model: Option<String>,
        api_endpoint: Option<String>,
        timeout_ms: Option<u64>,
    ) -> Self {
        Self {
            api_key: api_key.filter(|v| !v.trim().is_empty()),
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            api_endpoint: normalize_endpoint(
                api_endpoint.unwrap_or_else(|| DEFAULT_API_ENDPOINT.to_string()),
            ),
            timeout: Duration::from_millis(timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: String,
    pub content: String,
}

impl ChatTurn {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: "system".into(), content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: "user".into(), content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: "assistant".into(), content: content.into() }
    }
}

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("LLM not configured: {0}")]
    NotConfigured(&'static str),
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("HTTP {status}: {body}")]
    HttpStatus { status: reqwest::StatusCode, body: String },
    #[error("JSON decode failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("empty response")]
    EmptyChoices,
}

/// Remote text-completion boundary. Two modes: JSON-constrained completion
/// for question/analysis generation, free-form chat for the chatbot.
#[async_trait]
pub trait TextGeneration: Send + Sync {
    /// Whether the backing endpoint is configured at all. When false the
    /// engine skips the network entirely and uses fallback data.
    fn is_available(&self) -> bool;

    /// Single-prompt completion constrained to a JSON object response.
    async fn generate_json(&self, prompt: &str) -> Result<String, LlmError>;

    /// Free-form chat completion over a full message history.
    async fn chat(&self, messages: &[ChatTurn]) -> Result<String, LlmError>;
}

#[derive(Debug, Clone, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Clone, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Clone, Deserialize)]
struct CompletionMessage {
    content: String,
}

/// OpenAI-compatible chat-completion client. Works against any endpoint that
/// speaks `/chat/completions` (OpenAI, Gemini's OpenAI surface, etc).
#[derive(Clone)]
pub struct OpenAiChatClient {
    config: LlmConfig,
    client: reqwest::Client,
}

impl OpenAiChatClient {
    pub fn new(config: LlmConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self { config, client }
    }

    async fn complete(&self, payload: &serde_json::Value) -> Result<String, LlmError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .filter(|v| !v.trim().is_empty())
            .ok_or(LlmError::NotConfigured("LLM_API_KEY"))?;

        let url = format!(
            "{}/chat/completions",
            self.config.api_endpoint.trim_end_matches('/')
        );

        let resp = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(payload)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(LlmError::HttpStatus { status, body });
        }

        let bytes = resp.bytes().await?;
        let parsed: CompletionResponse = serde_json::from_slice(&bytes).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %String::from_utf8_lossy(&bytes),
                "failed to parse completion response"
            );
            LlmError::Json(e)
        })?;

        parsed
            .choices
            .first()
            .map(|c| c.message.content.clone())
            .filter(|content| !content.trim().is_empty())
            .ok_or(LlmError::EmptyChoices)
    }
}

#[async_trait]
impl TextGeneration for OpenAiChatClient {
    fn is_available(&self) -> bool {
        self.config.api_key.as_deref().is_some_and(|v| !v.trim().is_empty())
            && !self.config.model.trim().is_empty()
            && !self.config.api_endpoint.trim().is_empty()
    }

    async fn generate_json(&self, prompt: &str) -> Result<String, LlmError> {
        let payload = serde_json::json!({
            "model": self.config.model,
            "messages": [{"role": "user", "content": prompt}],
            "temperature": JSON_TEMPERATURE,
            "top_p": TOP_P,
            "max_tokens": JSON_MAX_TOKENS,
            "response_format": {"type": "json_object"},
        });
        self.complete(&payload).await
    }

    async fn chat(&self, messages: &[ChatTurn]) -> Result<String, LlmError> {
        let payload = serde_json::json!({
            "model": self.config.model,
            "messages": messages,
            "temperature": CHAT_TEMPERATURE,
            "top_p": TOP_P,
            "max_tokens": CHAT_MAX_TOKENS,
        });
        self.complete(&payload).await
    }
}

/// Strips markdown code fences some models wrap around JSON output.
pub fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    trimmed
        .strip_prefix("```json")
        .and_then(|s| s.strip_suffix("```"))
        .or_else(|| trimmed.strip_prefix("```").and_then(|s| s.strip_suffix("```")))
        .map(str::trim)
        .unwrap_or(trimmed)
}

fn normalize_endpoint(endpoint: String) -> String {
    let trimmed = endpoint.trim().trim_end_matches('/');
    if trimmed.ends_with("/v1") || trimmed.contains("/v1/") {
        trimmed.to_string()
    } else {
        format!("{trimmed}/v1")
    }
}

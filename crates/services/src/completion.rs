use std::env;
use std::time::Instant;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::CompletionError;
use crate::prompts::Prompt;

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_MAX_TOKENS: u32 = 1000;

/// Black-box text generation: a prompt (system instructions plus one user
/// message, tagged with its contract) in, generated text out.
#[async_trait]
pub trait CompletionService: Send + Sync {
    /// # Errors
    ///
    /// Returns `CompletionError` when the request cannot be completed.
    async fn complete(&self, prompt: &Prompt) -> Result<String, CompletionError>;
}

/// Issue one request and log its contract and latency.
///
/// Blank replies are reported as `CompletionError::EmptyResponse` whatever the
/// backing service.
pub(crate) async fn request(
    service: &dyn CompletionService,
    prompt: &Prompt,
) -> Result<String, CompletionError> {
    let contract = prompt.contract.as_str();
    let started = Instant::now();
    let result = service.complete(prompt).await;
    let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    match &result {
        Ok(_) => tracing::debug!(contract, elapsed_ms, "completion succeeded"),
        Err(err) => tracing::debug!(contract, elapsed_ms, error = %err, "completion failed"),
    }
    let text = result?;
    if text.trim().is_empty() {
        return Err(CompletionError::EmptyResponse);
    }
    Ok(text)
}

//
// ─── CHAT COMPLETIONS CLIENT ──────────────────────────────────────────────────
//

#[derive(Clone, Debug)]
pub struct CompletionConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub max_tokens: u32,
}

impl CompletionConfig {
    /// Read `GYM_AI_*` variables; `None` when no API key is set.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let api_key = env::var("GYM_AI_API_KEY").ok()?;
        if api_key.trim().is_empty() {
            return None;
        }
        let base_url = env::var("GYM_AI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.into());
        let model = env::var("GYM_AI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.into());
        let max_tokens = env::var("GYM_AI_MAX_TOKENS")
            .ok()
            .and_then(|raw| raw.trim().parse().ok())
            .unwrap_or(DEFAULT_MAX_TOKENS);
        Some(Self {
            base_url,
            api_key,
            model,
            max_tokens,
        })
    }
}

/// `CompletionService` over an OpenAI-compatible `/chat/completions` endpoint.
#[derive(Clone)]
pub struct ChatCompletionClient {
    client: Client,
    config: Option<CompletionConfig>,
}

impl ChatCompletionClient {
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(CompletionConfig::from_env())
    }

    #[must_use]
    pub fn new(config: Option<CompletionConfig>) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    #[must_use]
    pub fn enabled(&self) -> bool {
        self.config.is_some()
    }
}

#[async_trait]
impl CompletionService for ChatCompletionClient {
    async fn complete(&self, prompt: &Prompt) -> Result<String, CompletionError> {
        let config = self
            .config
            .as_ref()
            .ok_or(CompletionError::Disabled)?;

        let url = format!(
            "{}/chat/completions",
            config.base_url.trim_end_matches('/')
        );
        let payload = ChatRequest {
            model: config.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: prompt.system.clone(),
                },
                ChatMessage {
                    role: "user",
                    content: prompt.user.clone(),
                },
            ],
            max_tokens: config.max_tokens,
        };

        let response = self
            .client
            .post(url)
            .bearer_auth(&config.api_key)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(CompletionError::HttpStatus(response.status()));
        }

        let body: ChatResponse = response.json().await?;
        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(CompletionError::EmptyResponse)?;

        Ok(content.trim().to_string())
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Debug, Deserialize)]
struct ChatMessageResponse {
    content: Option<String>,
}

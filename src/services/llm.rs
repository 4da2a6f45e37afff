//! Chat-completion client for the LLM API (OpenAI-compatible, Groq by default).
//!
//! Provides:
//! - Single-message prompts
//! - System + user structured prompts
//! - Declaration of Division extraction (see [`super::extraction`])

use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, instrument};

use crate::config::LlmSettings;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Failed to process AI prompt")]
    Request(#[source] reqwest::Error),

    #[error("Failed to process AI prompt: LLM API returned {0}")]
    Status(reqwest::StatusCode),

    #[error("Failed to extract property information from document")]
    Extraction(String),
}

/// Per-call overrides; unset fields fall back to the configured defaults
#[derive(Debug, Clone, Default)]
pub struct PromptOptions {
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<ChatChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// Client for the LLM API.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    base_url: String,
    api_key: String,
    default_model: String,
    default_temperature: f32,
    default_max_tokens: u32,
}

impl LlmClient {
    /// Create a new LLM API client.
    pub fn new(settings: &LlmSettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_seconds))
            .build()
            .context("Failed to create HTTP client")?;

        tracing::info!(base_url = %settings.api_url, model = %settings.model, "LLM client initialized");

        Ok(Self {
            client,
            base_url: settings.api_url.trim_end_matches('/').to_string(),
            api_key: settings.api_key.clone(),
            default_model: settings.model.clone(),
            default_temperature: settings.temperature,
            default_max_tokens: settings.max_tokens,
        })
    }

    /// Send a single user prompt and return the first choice's text.
    #[instrument(skip(self, prompt))]
    pub async fn send_prompt(&self, prompt: &str, options: &PromptOptions) -> Result<String, LlmError> {
        self.complete(
            vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            options,
        )
        .await
    }

    /// Send a system instruction plus a user prompt.
    #[instrument(skip(self, system_message, user_prompt))]
    pub async fn send_structured_prompt(
        &self,
        system_message: &str,
        user_prompt: &str,
        options: &PromptOptions,
    ) -> Result<String, LlmError> {
        self.complete(
            vec![
                ChatMessage {
                    role: "system",
                    content: system_message,
                },
                ChatMessage {
                    role: "user",
                    content: user_prompt,
                },
            ],
            options,
        )
        .await
    }

    async fn complete(
        &self,
        messages: Vec<ChatMessage<'_>>,
        options: &PromptOptions,
    ) -> Result<String, LlmError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = ChatCompletionRequest {
            model: options.model.as_deref().unwrap_or(&self.default_model),
            messages,
            temperature: options.temperature.unwrap_or(self.default_temperature),
            max_tokens: options.max_tokens.unwrap_or(self.default_max_tokens),
        };

        debug!(url = %url, model = body.model, "LLM API request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "LLM API request failed");
                LlmError::Request(e)
            })?;

        let status = response.status();
        if !status.is_success() {
            error!(status = %status, "LLM API error");
            return Err(LlmError::Status(status));
        }

        let completion: ChatCompletionResponse = response.json().await.map_err(|e| {
            error!(error = %e, "Failed to parse LLM API response");
            LlmError::Request(e)
        })?;

        Ok(completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message)
            .and_then(|message| message.content)
            .unwrap_or_default())
    }
}

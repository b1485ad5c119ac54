//! Language-model completion clients.
//!
//! - **[`GeminiModel`]**: Google Generative Language API,
//!   `POST {base}/models/{model}:generateContent`.
//! - **[`OpenAiModel`]**: any OpenAI-compatible `POST {base}/chat/completions`.
//!
//! Selected by `llm.provider` through [`create_model`]. The API key is read
//! from the environment variable named by `llm.api_key_env` when the client
//! is built. One request per call; no retries.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

use crate::config::LlmConfig;
use crate::traits::CompletionModel;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("{0} environment variable not set")]
    MissingApiKey(String),
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },
    #[error("response contained no text")]
    EmptyResponse,
    #[error("unknown llm provider: {0}")]
    UnknownProvider(String),
}

pub fn create_model(config: &LlmConfig) -> Result<Box<dyn CompletionModel>, LlmError> {
    match config.provider.as_str() {
        "gemini" => Ok(Box::new(GeminiModel::new(config)?)),
        "openai" => Ok(Box::new(OpenAiModel::new(config)?)),
        other => Err(LlmError::UnknownProvider(other.to_string())),
    }
}

fn http_client(config: &LlmConfig) -> Result<reqwest::Client, LlmError> {
    Ok(reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?)
}

fn require_key(key: &Option<String>, var: &str) -> Result<String, LlmError> {
    key.clone()
        .ok_or_else(|| LlmError::MissingApiKey(var.to_string()))
}

async fn api_error(response: reqwest::Response) -> LlmError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    LlmError::Api { status, body }
}

// ============ Gemini ============

pub struct GeminiModel {
    client: reqwest::Client,
    model: String,
    endpoint: String,
    api_key_env: String,
    api_key: Option<String>,
}

#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

#[derive(Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: Option<String>,
}

impl GeminiModel {
    pub fn new(config: &LlmConfig) -> Result<Self, LlmError> {
        let model = config.model_name().to_string();
        Ok(Self {
            client: http_client(config)?,
            endpoint: format!("{}/models/{}:generateContent", config.endpoint(), model),
            model,
            api_key_env: config.api_key_var().to_string(),
            api_key: std::env::var(config.api_key_var()).ok(),
        })
    }
}

#[async_trait]
impl CompletionModel for GeminiModel {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        let api_key = require_key(&self.api_key, &self.api_key_env)?;
        let body = serde_json::json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
        });

        let response = self
            .client
            .post(&self.endpoint)
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let parsed: GeminiResponse = response.json().await?;
        gemini_text(parsed)
    }
}

fn gemini_text(response: GeminiResponse) -> Result<String, LlmError> {
    let content = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .ok_or(LlmError::EmptyResponse)?;

    let text: String = content.parts.into_iter().filter_map(|p| p.text).collect();
    if text.is_empty() {
        return Err(LlmError::EmptyResponse);
    }
    Ok(text)
}

// ============ OpenAI-compatible ============

pub struct OpenAiModel {
    client: reqwest::Client,
    model: String,
    endpoint: String,
    api_key_env: String,
    api_key: Option<String>,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiModel {
    pub fn new(config: &LlmConfig) -> Result<Self, LlmError> {
        Ok(Self {
            client: http_client(config)?,
            model: config.model_name().to_string(),
            endpoint: format!("{}/chat/completions", config.endpoint()),
            api_key_env: config.api_key_var().to_string(),
            api_key: std::env::var(config.api_key_var()).ok(),
        })
    }
}

#[async_trait]
impl CompletionModel for OpenAiModel {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        let api_key = require_key(&self.api_key, &self.api_key_env)?;
        let body = serde_json::json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": prompt }],
        });

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let parsed: ChatResponse = response.json().await?;
        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or(LlmError::EmptyResponse)
    }
}

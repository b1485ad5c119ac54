//! Speech-to-text clients.
//!
//! [`HttpSpeechRecognizer`] talks to an OpenAI-compatible
//! `POST /audio/transcriptions` endpoint. Every failure is folded into a
//! [`Transcript`] variant; nothing here returns an error to the pipeline.
//! There are no retries: a failed transcription is re-done by uploading
//! the file again.

use anyhow::{bail, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::config::SpeechConfig;
use crate::traits::{SpeechRecognizer, Transcript};

/// Creates the recognizer selected by `speech.provider`.
pub fn create_recognizer(config: &SpeechConfig) -> Result<Arc<dyn SpeechRecognizer>> {
    if !config.is_enabled() {
        return Ok(Arc::new(DisabledRecognizer));
    }
    match config.provider.as_str() {
        "openai" => Ok(Arc::new(HttpSpeechRecognizer::new(config)?)),
        other => bail!("Unknown speech provider: {}", other),
    }
}

/// Always reports the service as unavailable.
pub struct DisabledRecognizer;

#[async_trait]
impl SpeechRecognizer for DisabledRecognizer {
    async fn transcribe(&self, _wav: &Path) -> Transcript {
        Transcript::Unavailable("speech recognition is disabled".to_string())
    }
}

pub struct HttpSpeechRecognizer {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    language: Option<String>,
    api_key_env: String,
    /// Read once at construction; a missing key surfaces per request as
    /// [`Transcript::Unavailable`].
    api_key: Option<String>,
}

#[derive(Deserialize)]
struct TranscriptionResponse {
    #[serde(default)]
    text: String,
}

impl HttpSpeechRecognizer {
    pub fn new(config: &SpeechConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            endpoint: format!(
                "{}/audio/transcriptions",
                config.base_url.trim_end_matches('/')
            ),
            model: config.model.clone(),
            language: config.language.clone(),
            api_key_env: config.api_key_env.clone(),
            api_key: std::env::var(&config.api_key_env).ok(),
        })
    }

    async fn request(&self, wav: &Path) -> Result<String> {
        let api_key = match &self.api_key {
            Some(key) => key,
            None => bail!("{} environment variable not set", self.api_key_env),
        };

        let audio = tokio::fs::read(wav).await?;
        let part = reqwest::multipart::Part::bytes(audio)
            .file_name("audio.wav")
            .mime_str("audio/wav")?;
        let mut form = reqwest::multipart::Form::new()
            .text("model", self.model.clone())
            .part("file", part);
        if let Some(language) = &self.language {
            form = form.text("language", language.clone());
        }

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("speech API error {}: {}", status, body);
        }

        let parsed: TranscriptionResponse = response.json().await?;
        Ok(parsed.text)
    }
}

#[async_trait]
impl SpeechRecognizer for HttpSpeechRecognizer {
    async fn transcribe(&self, wav: &Path) -> Transcript {
        match self.request(wav).await {
            Ok(text) => classify(text),
            Err(e) => {
                tracing::warn!(error = %e, "speech recognition unavailable");
                Transcript::Unavailable(e.to_string())
            }
        }
    }
}

fn classify(text: String) -> Transcript {
    if text.trim().is_empty() {
        Transcript::Unintelligible
    } else {
        Transcript::Text(text)
    }
}

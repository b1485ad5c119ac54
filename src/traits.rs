//! Seams to the external engines.
//!
//! Extraction and answering call out to programs and services this crate
//! does not own: an OCR engine, an audio transcoder, a speech-recognition
//! service, and a language model. Each sits behind a trait so the
//! pipeline can be driven with fakes in tests and the concrete engine is
//! picked once, from [`Config`](crate::config::Config), at construction.
//!
//! ```text
//!   image ──▶ OcrEngine ─────────────────────────────▶ text
//!   audio ──▶ AudioTranscoder ──▶ SpeechRecognizer ──▶ text
//!   video ──▶ AudioTranscoder ──▶ SpeechRecognizer ──▶ text
//!   prompt ─▶ CompletionModel ───────────────────────▶ answer
//! ```

use async_trait::async_trait;
use std::path::Path;

use crate::extract::ExtractError;
use crate::llm::LlmError;

/// Optical character recognition over an image file.
#[async_trait]
pub trait OcrEngine: Send + Sync {
    /// Returns whatever text the engine finds, possibly empty.
    async fn recognize(&self, image: &Path) -> Result<String, ExtractError>;
}

/// Converts any audio or video container into the WAV layout expected by
/// [`SpeechRecognizer`].
#[async_trait]
pub trait AudioTranscoder: Send + Sync {
    /// Decodes the audio track of `input` and writes it to `output`.
    async fn to_wav(&self, input: &Path, output: &Path) -> Result<(), ExtractError>;
}

/// Result of a transcription request.
///
/// Neither failure variant is an error for the pipeline: both produce empty
/// text plus a warning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transcript {
    Text(String),
    /// The service answered but found no recognizable speech.
    Unintelligible,
    /// The service could not be reached or refused the request.
    Unavailable(String),
}

#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    async fn transcribe(&self, wav: &Path) -> Transcript;
}

/// A text-completion endpoint of a large language model.
#[async_trait]
pub trait CompletionModel: Send + Sync {
    /// Model identifier, for logs.
    fn model_name(&self) -> &str;

    async fn complete(&self, prompt: &str) -> Result<String, LlmError>;
}

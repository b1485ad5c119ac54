//! Audio and video transcription.
//!
//! Both paths go through scoped temp files: the uploaded bytes, then the
//! normalized WAV. Each is a [`tempfile::NamedTempFile`] guard, so the
//! files disappear on success, on a recognized transcription failure, and
//! on any early `?` return alike.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tokio::process::Command;

use super::{suffix_of, ExtractError};
use crate::config::MediaConfig;
use crate::traits::{AudioTranscoder, SpeechRecognizer, Transcript};

/// Transcodes with the `ffmpeg` command-line program into mono 16-bit PCM WAV.
pub struct FfmpegTranscoder {
    command: PathBuf,
    sample_rate: u32,
}

impl FfmpegTranscoder {
    pub fn new(config: &MediaConfig) -> Self {
        Self {
            command: config.ffmpeg_cmd.clone(),
            sample_rate: config.sample_rate,
        }
    }
}

#[async_trait]
impl AudioTranscoder for FfmpegTranscoder {
    async fn to_wav(&self, input: &Path, output: &Path) -> Result<(), ExtractError> {
        let result = Command::new(&self.command)
            .args(["-nostdin", "-y", "-loglevel", "error", "-i"])
            .arg(input)
            .args(["-vn", "-ac", "1", "-acodec", "pcm_s16le", "-ar"])
            .arg(self.sample_rate.to_string())
            .args(["-f", "wav"])
            .arg(output)
            .output()
            .await
            .map_err(|e| {
                ExtractError::Media(format!(
                    "failed to run {}: {}",
                    self.command.display(),
                    e
                ))
            })?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(ExtractError::Media(stderr.trim().to_string()));
        }
        Ok(())
    }
}

/// Transcodes an audio upload and transcribes it.
///
/// Returns the transcript and, when speech recognition came back empty or
/// unavailable, a warning alongside empty text.
pub(crate) async fn extract_audio(
    bytes: &[u8],
    file_name: &str,
    transcoder: &dyn AudioTranscoder,
    recognizer: &dyn SpeechRecognizer,
) -> Result<(String, Option<String>), ExtractError> {
    let source = spill("docqa-audio-", file_name, bytes).await?;
    transcribe_track(source.path(), transcoder, recognizer).await
}

/// Pulls the audio track out of a video upload and transcribes it.
pub(crate) async fn extract_video(
    bytes: &[u8],
    file_name: &str,
    transcoder: &dyn AudioTranscoder,
    recognizer: &dyn SpeechRecognizer,
) -> Result<(String, Option<String>), ExtractError> {
    let video = spill("docqa-video-", file_name, bytes).await?;
    transcribe_track(video.path(), transcoder, recognizer).await
}

async fn spill(prefix: &str, file_name: &str, bytes: &[u8]) -> Result<NamedTempFile, ExtractError> {
    let file = tempfile::Builder::new()
        .prefix(prefix)
        .suffix(suffix_of(file_name))
        .tempfile()?;
    tokio::fs::write(file.path(), bytes).await?;
    Ok(file)
}

async fn transcribe_track(
    source: &Path,
    transcoder: &dyn AudioTranscoder,
    recognizer: &dyn SpeechRecognizer,
) -> Result<(String, Option<String>), ExtractError> {
    let wav = tempfile::Builder::new()
        .prefix("docqa-wav-")
        .suffix(".wav")
        .tempfile()?;
    transcoder.to_wav(source, wav.path()).await?;

    Ok(match recognizer.transcribe(wav.path()).await {
        Transcript::Text(text) => (text, None),
        Transcript::Unintelligible => (
            String::new(),
            Some("Audio transcription failed: speech could not be understood".to_string()),
        ),
        Transcript::Unavailable(reason) => (
            String::new(),
            Some(format!(
                "Audio transcription failed: service unavailable: {}",
                reason
            )),
        ),
    })
}

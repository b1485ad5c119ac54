//! Multi-format text extraction.
//!
//! Callers hand over raw file bytes and the original file name; this module
//! picks the extractor from the name's suffix and returns plain UTF-8 text.
//! Content is never sniffed.
//!
//! | Suffixes | [`FileKind`] | Backend |
//! |----------|--------------|---------|
//! | `.pdf` | `Pdf` | `pdf-extract`, page by page |
//! | `.docx` | `Docx` | `zip` + `quick-xml`, paragraph by paragraph |
//! | `.png` `.jpg` `.jpeg` | `Image` | [`OcrEngine`] (tesseract) |
//! | `.mp3` `.wav` `.flac` `.m4a` | `Audio` | [`AudioTranscoder`] (ffmpeg) + [`SpeechRecognizer`] |
//! | `.mp4` `.mov` `.avi` `.mkv` | `Video` | same as audio, on the extracted track |
//! | `.xls` `.xlsx` | `Spreadsheet` | `calamine` |
//!
//! Matching is case-sensitive: `REPORT.PDF` is not a PDF here.
//!
//! Every extractor is isolated: a failure is returned as an
//! [`ExtractError`] for that file only, and the ingestion pipeline moves on
//! to the next file.

mod docx;
mod image;
mod media;
mod pdf;
mod spreadsheet;

pub use image::TesseractOcr;
pub use media::FfmpegTranscoder;
pub use spreadsheet::render_sheet;

use std::sync::Arc;
use thiserror::Error;

use crate::config::Config;
use crate::speech;
use crate::traits::{AudioTranscoder, OcrEngine, SpeechRecognizer};

/// Extraction failure for a single file.
///
/// [`UnsupportedFileType`](ExtractError::UnsupportedFileType) means the file
/// was never handed to an extractor; every other variant is an extraction
/// failure of a recognized type.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("unsupported file type: {0}")]
    UnsupportedFileType(String),
    #[error("PDF extraction failed: {0}")]
    Pdf(String),
    #[error("DOCX extraction failed: {0}")]
    Docx(String),
    #[error("Error reading Excel file: {0}")]
    Spreadsheet(String),
    #[error("OCR failed: {0}")]
    Ocr(String),
    #[error("media processing failed: {0}")]
    Media(String),
    #[error("temporary file error: {0}")]
    Io(#[from] std::io::Error),
}

/// Media categories recognized by suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    Pdf,
    Docx,
    Image,
    Audio,
    Video,
    Spreadsheet,
}

const SUFFIXES: &[(&str, FileKind)] = &[
    (".pdf", FileKind::Pdf),
    (".docx", FileKind::Docx),
    (".png", FileKind::Image),
    (".jpg", FileKind::Image),
    (".jpeg", FileKind::Image),
    (".mp3", FileKind::Audio),
    (".wav", FileKind::Audio),
    (".flac", FileKind::Audio),
    (".m4a", FileKind::Audio),
    (".mp4", FileKind::Video),
    (".mov", FileKind::Video),
    (".avi", FileKind::Video),
    (".mkv", FileKind::Video),
    (".xls", FileKind::Spreadsheet),
    (".xlsx", FileKind::Spreadsheet),
];

impl FileKind {
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        SUFFIXES
            .iter()
            .find(|(suffix, _)| file_name.ends_with(suffix))
            .map(|(_, kind)| *kind)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FileKind::Pdf => "pdf",
            FileKind::Docx => "docx",
            FileKind::Image => "image",
            FileKind::Audio => "audio",
            FileKind::Video => "video",
            FileKind::Spreadsheet => "spreadsheet",
        }
    }

    /// Suffixes accepted for this kind, leading dot included.
    pub fn suffixes(&self) -> Vec<&'static str> {
        SUFFIXES
            .iter()
            .filter(|(_, kind)| kind == self)
            .map(|(suffix, _)| *suffix)
            .collect()
    }
}

/// Text pulled out of one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub kind: FileKind,
    pub text: String,
    /// Set when a non-fatal problem left the text empty or partial.
    pub warning: Option<String>,
}

impl Extraction {
    fn text(kind: FileKind, text: String) -> Self {
        Self {
            kind,
            text,
            warning: None,
        }
    }
}

/// Dispatches files to the per-format extractors.
///
/// Holds the external engines used by the image, audio, and video paths;
/// PDF, DOCX, and spreadsheets are parsed in-process.
pub struct Extractor {
    ocr: Arc<dyn OcrEngine>,
    transcoder: Arc<dyn AudioTranscoder>,
    recognizer: Arc<dyn SpeechRecognizer>,
}

impl Extractor {
    pub fn new(
        ocr: Arc<dyn OcrEngine>,
        transcoder: Arc<dyn AudioTranscoder>,
        recognizer: Arc<dyn SpeechRecognizer>,
    ) -> Self {
        Self {
            ocr,
            transcoder,
            recognizer,
        }
    }

    /// Builds tesseract, ffmpeg, and the configured speech service.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        Ok(Self::new(
            Arc::new(TesseractOcr::new(&config.ocr)),
            Arc::new(FfmpegTranscoder::new(&config.media)),
            speech::create_recognizer(&config.speech)?,
        ))
    }

    pub async fn extract(&self, bytes: &[u8], file_name: &str) -> Result<Extraction, ExtractError> {
        let kind = FileKind::from_file_name(file_name)
            .ok_or_else(|| ExtractError::UnsupportedFileType(file_name.to_string()))?;

        tracing::debug!(file_name, kind = kind.as_str(), bytes = bytes.len(), "extracting");

        match kind {
            FileKind::Pdf => pdf::extract_pdf(bytes).map(|t| Extraction::text(kind, t)),
            FileKind::Docx => docx::extract_docx(bytes).map(|t| Extraction::text(kind, t)),
            FileKind::Spreadsheet => {
                spreadsheet::extract_spreadsheet(bytes).map(|t| Extraction::text(kind, t))
            }
            FileKind::Image => image::extract_image(bytes, file_name, self.ocr.as_ref())
                .await
                .map(|t| Extraction::text(kind, t)),
            FileKind::Audio => {
                let (text, warning) = media::extract_audio(
                    bytes,
                    file_name,
                    self.transcoder.as_ref(),
                    self.recognizer.as_ref(),
                )
                .await?;
                Ok(Extraction {
                    kind,
                    text,
                    warning,
                })
            }
            FileKind::Video => {
                let (text, warning) = media::extract_video(
                    bytes,
                    file_name,
                    self.transcoder.as_ref(),
                    self.recognizer.as_ref(),
                )
                .await?;
                Ok(Extraction {
                    kind,
                    text,
                    warning,
                })
            }
        }
    }
}

/// Suffix of `file_name` including the dot, for naming temp files.
fn suffix_of(file_name: &str) -> &str {
    file_name
        .rfind('.')
        .map(|idx| &file_name[idx..])
        .unwrap_or("")
}

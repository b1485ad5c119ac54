use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;

use super::{suffix_of, ExtractError};
use crate::config::OcrConfig;
use crate::traits::OcrEngine;

/// OCR through the `tesseract` command-line program.
pub struct TesseractOcr {
    command: PathBuf,
    language: String,
}

impl TesseractOcr {
    pub fn new(config: &OcrConfig) -> Self {
        Self {
            command: config.tesseract_cmd.clone(),
            language: config.language.clone(),
        }
    }
}

#[async_trait]
impl OcrEngine for TesseractOcr {
    async fn recognize(&self, image: &Path) -> Result<String, ExtractError> {
        let output = Command::new(&self.command)
            .arg(image)
            .arg("stdout")
            .args(["-l", self.language.as_str()])
            .output()
            .await
            .map_err(|e| {
                ExtractError::Ocr(format!(
                    "failed to run {}: {}",
                    self.command.display(),
                    e
                ))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ExtractError::Ocr(stderr.trim().to_string()));
        }

        let text = String::from_utf8_lossy(&output.stdout).to_string();
        tracing::debug!(chars = text.len(), "tesseract finished");
        Ok(text)
    }
}

/// Writes the image to a scoped temp file and runs OCR on it. The file is
/// removed when the guard drops, whichever way this returns.
pub(crate) async fn extract_image(
    bytes: &[u8],
    file_name: &str,
    ocr: &dyn OcrEngine,
) -> Result<String, ExtractError> {
    let image = tempfile::Builder::new()
        .prefix("docqa-image-")
        .suffix(suffix_of(file_name))
        .tempfile()?;
    tokio::fs::write(image.path(), bytes).await?;

    ocr.recognize(image.path()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::fakes::FakeOcr;

    #[tokio::test]
    async fn temp_image_is_removed_after_ocr() {
        let ocr = FakeOcr {
            text: "hello".to_string(),
            ..Default::default()
        };

        let text = extract_image(b"jpeg bytes", "photo.jpeg", &ocr).await.unwrap();
        assert_eq!(text, "hello");

        let seen = ocr.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].extension().unwrap(), "jpeg");
        assert!(!seen[0].exists());
    }

    #[tokio::test]
    async fn missing_tesseract_binary_is_an_ocr_error() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        let ocr = TesseractOcr::new(&OcrConfig {
            tesseract_cmd: PathBuf::from("/nonexistent/tesseract-binary"),
            language: "eng".to_string(),
        });

        let err = ocr.recognize(tmp.path()).await.unwrap_err();
        assert!(matches!(err, ExtractError::Ocr(ref m) if m.contains("failed to run")));
    }
}

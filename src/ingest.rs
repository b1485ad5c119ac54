//! Batch upload pipeline.
//!
//! Files are processed one at a time, each fully (extract, then store)
//! before the next begins. Per-file problems never stop the batch:
//!
//! | Situation | Outcome | Store touched |
//! |-----------|---------|---------------|
//! | text extracted | [`FileOutcome::Stored`] | insert |
//! | suffix not in the dispatch table | [`FileOutcome::SkippedUnsupported`] | no |
//! | extraction failed or found only whitespace | [`FileOutcome::Empty`] | no |
//! | file on disk could not be read | [`FileOutcome::Unreadable`] | no |
//!
//! A [`StorageError`] is different: it ends the batch and is returned to the
//! caller, since the store may no longer hold what the user thinks it does.
//! Files stored before the failure stay stored.

use anyhow::{bail, Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::Serialize;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::Config;
use crate::extract::{ExtractError, Extractor};
use crate::store::{DocumentStore, StorageError};

/// An uploaded file together with its declared MIME type.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub file_type: String,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    /// `file_type` is guessed from the name when the caller has none.
    pub fn new(file_name: impl Into<String>, file_type: Option<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let file_type = file_type.unwrap_or_else(|| guess_file_type(&file_name));
        Self {
            file_name,
            file_type,
            bytes,
        }
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes =
            std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
        Ok(Self::new(name_of(path), None, bytes))
    }
}

fn name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

pub fn guess_file_type(file_name: &str) -> String {
    mime_guess::from_path(file_name)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileOutcome {
    Stored { id: i64 },
    SkippedUnsupported,
    /// Extraction failed, or produced nothing but whitespace. Whitespace-only
    /// text (a blank scan's OCR output, say) is not stored.
    Empty { warning: Option<String> },
    Unreadable { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileReport {
    pub file_name: String,
    #[serde(flatten)]
    pub outcome: FileOutcome,
}

/// Extracts one file and stores its text when there is any.
pub async fn ingest_file(
    store: &DocumentStore,
    extractor: &Extractor,
    file: &UploadedFile,
) -> Result<FileReport, StorageError> {
    let outcome = match extractor.extract(&file.bytes, &file.file_name).await {
        Ok(extraction) if !extraction.text.trim().is_empty() => {
            let id = store
                .insert(&file.file_name, &file.file_type, &extraction.text)
                .await?;
            tracing::debug!(file_name = %file.file_name, id, "stored");
            FileOutcome::Stored { id }
        }
        Ok(extraction) => {
            if let Some(warning) = &extraction.warning {
                tracing::warn!(file_name = %file.file_name, "{}", warning);
            }
            FileOutcome::Empty {
                warning: extraction.warning,
            }
        }
        Err(ExtractError::UnsupportedFileType(_)) => {
            tracing::warn!(file_name = %file.file_name, "Unsupported file type");
            FileOutcome::SkippedUnsupported
        }
        Err(e) => {
            tracing::warn!(file_name = %file.file_name, error = %e, "extraction failed");
            FileOutcome::Empty {
                warning: Some(e.to_string()),
            }
        }
    };

    Ok(FileReport {
        file_name: file.file_name.clone(),
        outcome,
    })
}

/// Reads `path` and ingests it. A file that cannot be read is reported as
/// [`FileOutcome::Unreadable`] rather than failing the caller.
pub async fn ingest_path(
    store: &DocumentStore,
    extractor: &Extractor,
    path: &Path,
) -> Result<FileReport, StorageError> {
    match UploadedFile::from_path(path) {
        Ok(file) => ingest_file(store, extractor, &file).await,
        Err(e) => {
            let error = format!("{:#}", e);
            tracing::warn!(path = %path.display(), %error, "unreadable file");
            Ok(FileReport {
                file_name: name_of(path),
                outcome: FileOutcome::Unreadable { error },
            })
        }
    }
}

/// Runs [`ingest_file`] over every file in order.
pub async fn ingest_batch(
    store: &DocumentStore,
    extractor: &Extractor,
    files: &[UploadedFile],
) -> Result<Vec<FileReport>, StorageError> {
    let mut reports = Vec::with_capacity(files.len());
    for file in files {
        reports.push(ingest_file(store, extractor, file).await?);
    }
    Ok(reports)
}

/// Expands the CLI arguments into a sorted list of files. Directories are
/// walked recursively; `include` globs, when given, filter what is found
/// inside directories (paths relative to that directory).
pub fn collect_paths(paths: &[PathBuf], include: &[String]) -> Result<Vec<PathBuf>> {
    let include_set = if include.is_empty() {
        None
    } else {
        Some(build_globset(include)?)
    };

    let mut files = Vec::new();
    for path in paths {
        if path.is_file() {
            files.push(path.clone());
            continue;
        }
        if !path.is_dir() {
            bail!("No such file or directory: {}", path.display());
        }

        let mut found = Vec::new();
        for entry in WalkDir::new(path) {
            // Entries that cannot be visited are passed on so the upload
            // reports them as unreadable.
            let candidate = match entry {
                Ok(entry) if entry.file_type().is_file() => entry.into_path(),
                Ok(_) => continue,
                Err(err) => {
                    tracing::warn!(error = %err, "cannot walk entry");
                    match err.path() {
                        Some(p) if p != path.as_path() => p.to_path_buf(),
                        _ => continue,
                    }
                }
            };
            let relative = candidate.strip_prefix(path).unwrap_or(candidate.as_path());
            if let Some(set) = &include_set {
                if !set.is_match(relative) {
                    continue;
                }
            }
            found.push(candidate);
        }
        found.sort();
        files.extend(found);
    }
    Ok(files)
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}

/// CLI entry point for `docqa upload`.
pub async fn run_upload(config: &Config, paths: &[PathBuf], include: &[String]) -> Result<()> {
    let files = collect_paths(paths, include)?;
    let store = DocumentStore::open(config).await?;
    let extractor = Extractor::from_config(config)?;

    let mut stored = 0u64;
    let mut skipped = 0u64;
    let mut empty = 0u64;
    let mut unreadable = 0u64;

    println!("upload");
    for path in &files {
        let report = ingest_path(&store, &extractor, path)
            .await
            .with_context(|| format!("Failed to store {}", path.display()))?;

        match &report.outcome {
            FileOutcome::Stored { id } => {
                stored += 1;
                println!("  stored:  {} (id {})", report.file_name, id);
            }
            FileOutcome::SkippedUnsupported => {
                skipped += 1;
                println!("  skipped: {} (unsupported file type)", report.file_name);
            }
            FileOutcome::Empty { warning } => {
                empty += 1;
                match warning {
                    Some(w) => println!("  empty:   {} ({})", report.file_name, w),
                    None => println!("  empty:   {} (no text found)", report.file_name),
                }
            }
            FileOutcome::Unreadable { error } => {
                unreadable += 1;
                println!("  unreadable: {} ({})", report.file_name, error);
            }
        }
    }

    println!("  processed: {} files", files.len());
    println!("  stored: {}", stored);
    println!("  skipped: {}", skipped);
    println!("  empty: {}", empty);
    println!("  unreadable: {}", unreadable);
    println!("ok");

    store.close().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::fakes::{FakeOcr, FakeRecognizer, FakeTranscoder};
    use crate::traits::Transcript;
    use std::fs;
    use std::sync::Arc;
    use tempfile::TempDir;

    #[test]
    fn file_type_is_guessed_from_name() {
        assert_eq!(guess_file_type("report.pdf"), "application/pdf");
        assert_eq!(guess_file_type("photo.png"), "image/png");
        assert_eq!(guess_file_type("mystery"), "application/octet-stream");
    }

    #[test]
    fn declared_file_type_wins() {
        let file = UploadedFile::new("a.pdf", Some("text/x-custom".to_string()), vec![]);
        assert_eq!(file.file_type, "text/x-custom");
    }

    #[test]
    fn outcome_serializes_with_status_tag() {
        let report = FileReport {
            file_name: "a.pdf".to_string(),
            outcome: FileOutcome::Stored { id: 7 },
        };
        assert_eq!(
            serde_json::to_value(&report).unwrap(),
            serde_json::json!({ "file_name": "a.pdf", "status": "stored", "id": 7 })
        );
    }

    #[test]
    fn directories_are_walked_and_filtered() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("inbox");
        fs::create_dir_all(dir.join("nested")).unwrap();
        fs::write(dir.join("b.pdf"), b"x").unwrap();
        fs::write(dir.join("a.txt"), b"x").unwrap();
        fs::write(dir.join("nested").join("c.pdf"), b"x").unwrap();
        let single = tmp.path().join("single.docx");
        fs::write(&single, b"x").unwrap();

        let all = collect_paths(&[dir.clone(), single.clone()], &[]).unwrap();
        assert_eq!(all.len(), 4);
        assert_eq!(all.last().unwrap(), &single);

        let pdfs = collect_paths(&[dir.clone()], &["**/*.pdf".to_string()]).unwrap();
        assert_eq!(pdfs, vec![dir.join("b.pdf"), dir.join("nested").join("c.pdf")]);
    }

    #[test]
    fn unreadable_outcome_carries_the_error() {
        let report = FileReport {
            file_name: "locked.pdf".to_string(),
            outcome: FileOutcome::Unreadable {
                error: "Failed to read locked.pdf".to_string(),
            },
        };
        assert_eq!(
            serde_json::to_value(&report).unwrap(),
            serde_json::json!({
                "file_name": "locked.pdf",
                "status": "unreadable",
                "error": "Failed to read locked.pdf"
            })
        );
    }

    #[tokio::test]
    async fn unreadable_file_does_not_stop_later_files() {
        let tmp = TempDir::new().unwrap();
        let config = Config::minimal(tmp.path().join("data").join("kb.sqlite"));
        let store = DocumentStore::open(&config).await.unwrap();
        let extractor = Extractor::new(
            Arc::new(FakeOcr::default()),
            Arc::new(FakeTranscoder::default()),
            Arc::new(FakeRecognizer::new(Transcript::Unintelligible)),
        );

        // A directory cannot be read as a file.
        let locked = tmp.path().join("locked.pdf");
        fs::create_dir(&locked).unwrap();
        let later = tmp.path().join("later.xyz");
        fs::write(&later, b"???").unwrap();

        let mut outcomes = Vec::new();
        for path in [&locked, &later] {
            let report = ingest_path(&store, &extractor, path).await.unwrap();
            outcomes.push((report.file_name, report.outcome));
        }

        assert_eq!(outcomes[0].0, "locked.pdf");
        match &outcomes[0].1 {
            FileOutcome::Unreadable { error } => assert!(error.contains("Failed to read")),
            other => panic!("expected unreadable, got {:?}", other),
        }
        assert_eq!(outcomes[1], ("later.xyz".to_string(), FileOutcome::SkippedUnsupported));
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn run_upload_continues_past_unreadable_files() {
        use std::io::Write;

        let tmp = TempDir::new().unwrap();
        let config = Config::minimal(tmp.path().join("data").join("kb.sqlite"));

        let later = tmp.path().join("later.docx");
        let mut buf = Vec::new();
        {
            let mut zip = zip::ZipWriter::new(std::io::Cursor::new(&mut buf));
            zip.start_file("word/document.xml", zip::write::SimpleFileOptions::default())
                .unwrap();
            let xml = concat!(
                "<w:document xmlns:w=\"urn:w\"><w:body>",
                "<w:p><w:r><w:t>Later</w:t></w:r></w:p>",
                "</w:body></w:document>",
            );
            zip.write_all(xml.as_bytes()).unwrap();
            zip.finish().unwrap();
        }
        fs::write(&later, buf).unwrap();

        // Reading /proc/self/mem from offset zero fails with EIO.
        let unreadable = PathBuf::from("/proc/self/mem");
        run_upload(&config, &[unreadable, later], &[]).await.unwrap();

        let store = DocumentStore::open(&config).await.unwrap();
        let docs = store.list_all().await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].file_name, "later.docx");
        assert_eq!(docs[0].text, "Later");
    }

    #[test]
    fn missing_path_is_an_error() {
        let err = collect_paths(&[PathBuf::from("/nonexistent/inbox")], &[]).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/inbox"));
    }
}

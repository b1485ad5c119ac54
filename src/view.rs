//! Read-side CLI commands: `list`, `files`, `show`, `delete`.
//!
//! Every command opens the store, does one thing, and closes it again.

use anyhow::{bail, Result};

use crate::config::Config;
use crate::models::StoredDocument;
use crate::store::DocumentStore;

const PREVIEW_CHARS: usize = 100;

/// First 100 characters of `text`, with `...` appended when cut.
pub fn preview(text: &str) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{}...", head)
    } else {
        head
    }
}

/// Distinct file names in first-upload order.
pub fn distinct_file_names(documents: &[StoredDocument]) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for doc in documents {
        if !names.contains(&doc.file_name) {
            names.push(doc.file_name.clone());
        }
    }
    names
}

pub async fn run_list(config: &Config) -> Result<()> {
    let store = DocumentStore::open(config).await?;
    let documents = store.list_all_raw().await?;
    store.close().await;

    if documents.is_empty() {
        println!("No data found in the database.");
        return Ok(());
    }

    for doc in &documents {
        println!(
            "{:>4}  {}  {}  {}",
            doc.id, doc.upload_time, doc.file_type, doc.file_name
        );
        println!("      {}", preview(&doc.text).replace('\n', " "));
    }
    println!();
    println!("{} documents", documents.len());

    Ok(())
}

pub async fn run_files(config: &Config) -> Result<()> {
    let store = DocumentStore::open(config).await?;
    let documents = store.list_all_raw().await?;
    store.close().await;

    let names = distinct_file_names(&documents);
    if names.is_empty() {
        println!("No files in the knowledge base.");
        return Ok(());
    }

    println!("Files in Knowledge Base:");
    for name in names {
        println!("  {}", name);
    }
    Ok(())
}

pub async fn run_show(config: &Config, id: i64) -> Result<()> {
    let store = DocumentStore::open(config).await?;
    let document = store.get(id).await?;
    store.close().await;

    let Some(doc) = document else {
        bail!("document not found: {}", id);
    };

    println!("--- Document ---");
    println!("id:          {}", doc.id);
    println!("file_name:   {}", doc.file_name);
    println!("file_type:   {}", doc.file_type);
    println!("upload_time: {}", doc.upload_time);
    println!();
    println!("--- Text ---");
    println!("{}", doc.text);

    Ok(())
}

pub async fn run_delete(config: &Config, id: i64) -> Result<()> {
    let store = DocumentStore::open(config).await?;
    let existing = store.get(id).await?;
    let deleted = store.delete_by_id(id).await?;
    store.close().await;

    match existing {
        Some(doc) if deleted => println!("Deleted '{}' (id {}).", doc.file_name, id),
        _ => println!("No document with id {}; nothing deleted.", id),
    }
    Ok(())
}

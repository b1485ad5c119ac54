//! SQLite-backed document store.
//!
//! One flat table (`extracted_text`), one statement per operation with
//! implicit commit. Every failure is surfaced as a [`StorageError`]; nothing
//! is retried or swallowed here.
//!
//! Listing order is ascending `id`, i.e. insertion order.

use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use thiserror::Error;

use crate::config::Config;
use crate::db;
use crate::models::{DocumentContent, StoredDocument, UPLOAD_TIME_FORMAT};
use crate::schema;

/// Failure talking to the backing database.
///
/// Fatal for the operation that hit it; the persisted knowledge base may no
/// longer match what the caller believes was saved.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("cannot prepare database location: {0}")]
    Io(#[from] std::io::Error),
}

pub struct DocumentStore {
    pool: SqlitePool,
}

impl DocumentStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connects to the database named in `config` and ensures the table exists.
    pub async fn open(config: &Config) -> Result<Self, StorageError> {
        let store = Self::new(db::connect(config).await?);
        store.initialize().await?;
        Ok(store)
    }

    /// Idempotently creates the document table.
    pub async fn initialize(&self) -> Result<(), StorageError> {
        schema::ensure_schema(&self.pool).await
    }

    /// Appends a record and returns its newly assigned id.
    pub async fn insert(
        &self,
        file_name: &str,
        file_type: &str,
        text: &str,
    ) -> Result<i64, StorageError> {
        let upload_time = chrono::Local::now().format(UPLOAD_TIME_FORMAT).to_string();

        let result = sqlx::query(
            r#"
            INSERT INTO extracted_text (file_name, file_type, extracted_text, upload_time)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(file_name)
        .bind(file_type)
        .bind(text)
        .bind(&upload_time)
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    pub async fn list_all(&self) -> Result<Vec<DocumentContent>, StorageError> {
        let rows = sqlx::query(
            "SELECT file_name, file_type, extracted_text FROM extracted_text ORDER BY id ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(DocumentContent {
                    file_name: text_column(row, "file_name")?,
                    file_type: text_column(row, "file_type")?,
                    text: text_column(row, "extracted_text")?,
                })
            })
            .collect()
    }

    pub async fn list_all_raw(&self) -> Result<Vec<StoredDocument>, StorageError> {
        let rows = sqlx::query(
            "SELECT id, file_name, file_type, extracted_text, upload_time FROM extracted_text ORDER BY id ASC",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(stored_document).collect()
    }

    pub async fn get(&self, id: i64) -> Result<Option<StoredDocument>, StorageError> {
        let row = sqlx::query(
            "SELECT id, file_name, file_type, extracted_text, upload_time FROM extracted_text WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(stored_document).transpose()
    }

    /// Removes the record with `id`. Returns whether a row was removed;
    /// a missing id is not an error.
    pub async fn delete_by_id(&self, id: i64) -> Result<bool, StorageError> {
        let result = sqlx::query("DELETE FROM extracted_text WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn count(&self) -> Result<i64, StorageError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM extracted_text")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn close(self) {
        self.pool.close().await;
    }
}

fn stored_document(row: &SqliteRow) -> Result<StoredDocument, StorageError> {
    Ok(StoredDocument {
        id: row.try_get("id")?,
        file_name: text_column(row, "file_name")?,
        file_type: text_column(row, "file_type")?,
        text: text_column(row, "extracted_text")?,
        upload_time: text_column(row, "upload_time")?,
    })
}

// Columns are nullable in the schema; NULL reads back as empty text.
fn text_column(row: &SqliteRow, name: &str) -> Result<String, StorageError> {
    let value: Option<String> = row.try_get(name)?;
    Ok(value.unwrap_or_default())
}

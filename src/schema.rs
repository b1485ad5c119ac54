use sqlx::SqlitePool;

use crate::store::StorageError;

/// Creates the `extracted_text` table if it does not exist yet.
///
/// `AUTOINCREMENT` keeps SQLite from handing out the id of a deleted row
/// again.
pub async fn ensure_schema(pool: &SqlitePool) -> Result<(), StorageError> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS extracted_text (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            file_name TEXT,
            file_type TEXT,
            extracted_text TEXT,
            upload_time TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

//! Data types for stored documents.
//!
//! A [`StoredDocument`] is one row of the `extracted_text` table. The
//! narrower [`DocumentContent`] carries only what context assembly needs.

use serde::Serialize;

/// Timestamp layout of `upload_time`, in local time.
pub const UPLOAD_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Full document record as persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredDocument {
    pub id: i64,
    pub file_name: String,
    pub file_type: String,
    pub text: String,
    pub upload_time: String,
}

/// Name, type, and text of a document; the input to context assembly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentContent {
    pub file_name: String,
    pub file_type: String,
    pub text: String,
}

impl From<StoredDocument> for DocumentContent {
    fn from(doc: StoredDocument) -> Self {
        Self {
            file_name: doc.file_name,
            file_type: doc.file_type,
            text: doc.text,
        }
    }
}

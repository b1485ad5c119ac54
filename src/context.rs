//! Context block assembly for question answering.
//!
//! Documents are framed, in caller order, as:
//!
//! ```text
//! DOCUMENT START
//! FILE_NAME: report.pdf
//! FILE_TYPE: application/pdf
//! CONTENT:
//! Revenue grew 10%.
//! DOCUMENT END
//!
//! ```
//!
//! Content is neither escaped nor truncated. A document whose own text
//! contains `DOCUMENT END` on a line of its own makes the boundaries
//! ambiguous; [`split_documents`] still parses such a block, taking the
//! first matching end marker.

use crate::models::DocumentContent;

pub const DOCUMENT_START: &str = "DOCUMENT START";
pub const DOCUMENT_END: &str = "DOCUMENT END";

/// Concatenates all documents into one block. No documents, no markers.
pub fn assemble(documents: &[DocumentContent]) -> String {
    let mut block = String::new();
    for doc in documents {
        block.push_str(DOCUMENT_START);
        block.push('\n');
        block.push_str(&format!("FILE_NAME: {}\n", doc.file_name));
        block.push_str(&format!("FILE_TYPE: {}\n", doc.file_type));
        block.push_str("CONTENT:\n");
        block.push_str(&doc.text);
        block.push('\n');
        block.push_str(DOCUMENT_END);
        block.push_str("\n\n");
    }
    block
}

/// Locates document records in a block produced by [`assemble`].
pub fn split_documents(block: &str) -> Vec<DocumentContent> {
    let start_marker = format!("{}\n", DOCUMENT_START);
    let end_marker = format!("\n{}\n", DOCUMENT_END);

    let mut documents = Vec::new();
    let mut rest = block;
    while let Some(start) = rest.find(&start_marker) {
        let body = &rest[start + start_marker.len()..];
        let Some(end) = body.find(&end_marker) else {
            break;
        };
        if let Some(doc) = parse_record(&body[..end]) {
            documents.push(doc);
        }
        rest = &body[end + end_marker.len()..];
    }
    documents
}

fn parse_record(record: &str) -> Option<DocumentContent> {
    let record = record.strip_prefix("FILE_NAME: ")?;
    let (file_name, record) = record.split_once('\n')?;
    let record = record.strip_prefix("FILE_TYPE: ")?;
    let (file_type, record) = record.split_once('\n')?;
    let text = record.strip_prefix("CONTENT:\n")?;
    Some(DocumentContent {
        file_name: file_name.to_string(),
        file_type: file_type.to_string(),
        text: text.to_string(),
    })
}

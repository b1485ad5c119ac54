//! Question answering over the stored documents.
//!
//! [`AnswerService::answer`] never fails: transport and API errors come
//! back as answer text starting with [`ANSWER_ERROR_PREFIX`], so callers
//! can render the result without a separate error path.
//!
//! [`ask`] is the full flow behind `docqa ask` and `POST /ask`: read every
//! document from the store, assemble the context block, and answer.

use thiserror::Error;

use crate::config::Config;
use crate::context;
use crate::llm;
use crate::store::{DocumentStore, StorageError};
use crate::traits::CompletionModel;

pub const ANSWER_ERROR_PREFIX: &str = "An error occurred while contacting the AI model: ";

/// Fixed prompt: answer-only-from-context instruction, context, question.
pub fn build_prompt(context: &str, question: &str) -> String {
    format!(
        "You are a helpful Q&A assistant. Answer the user's question based *only* on the provided context below. \
         If the answer is not found, say that clearly.\n\n\
         --- CONTEXT ---\n\
         {context}\n\
         --- QUESTION ---\n\
         {question}",
        context = context,
        question = question
    )
}

pub struct AnswerService {
    model: Box<dyn CompletionModel>,
}

impl AnswerService {
    pub fn new(model: Box<dyn CompletionModel>) -> Self {
        Self { model }
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        Ok(Self::new(llm::create_model(&config.llm)?))
    }

    /// Returns the model's text verbatim, or the error sentinel.
    pub async fn answer(&self, context: &str, question: &str) -> String {
        let prompt = build_prompt(context, question);
        tracing::debug!(
            model = self.model.model_name(),
            prompt_chars = prompt.len(),
            "sending question"
        );

        match self.model.complete(&prompt).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(error = %e, "answer request failed");
                format!("{}{}", ANSWER_ERROR_PREFIX, e)
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum AskError {
    #[error("question must not be empty")]
    EmptyQuestion,
    #[error("No files found. Please upload at least one document.")]
    NoDocuments,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Validates `question` and assembles the context block it will be
/// answered from.
pub async fn prepare_context(store: &DocumentStore, question: &str) -> Result<String, AskError> {
    if question.trim().is_empty() {
        return Err(AskError::EmptyQuestion);
    }

    let documents = store.list_all().await?;
    if documents.is_empty() {
        return Err(AskError::NoDocuments);
    }

    Ok(context::assemble(&documents))
}

/// Answers `question` from every document currently in the store.
pub async fn ask(
    store: &DocumentStore,
    service: &AnswerService,
    question: &str,
) -> Result<String, AskError> {
    let block = prepare_context(store, question).await?;
    Ok(service.answer(&block, question).await)
}

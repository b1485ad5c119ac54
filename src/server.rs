//! JSON HTTP API.
//!
//! Exposes the knowledge base over HTTP for browser and script clients.
//! Handlers hold no decision logic of their own; they call the same
//! pipeline, store, and answering functions as the CLI.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`    | `/health` | Health check (returns version) |
//! | `GET`    | `/documents` | Every stored record, ascending id |
//! | `GET`    | `/documents/{id}` | One record |
//! | `DELETE` | `/documents/{id}` | Remove a record (idempotent) |
//! | `POST`   | `/upload` | Batch upload of base64-encoded files |
//! | `POST`   | `/ask` | Answer a question from all stored documents |
//!
//! # Error Contract
//!
//! ```json
//! { "error": { "code": "bad_request", "message": "question must not be empty" } }
//! ```
//!
//! Error codes: `bad_request` (400), `not_found` (404), `storage_error` (500).
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted.

use axum::{
    extract::{DefaultBodyLimit, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};

use crate::answer::{self, AnswerService, AskError};
use crate::config::Config;
use crate::extract::Extractor;
use crate::ingest::{self, FileReport, UploadedFile};
use crate::models::StoredDocument;
use crate::store::{DocumentStore, StorageError};

/// Upload bodies carry whole files as base64.
const MAX_BODY_BYTES: usize = 512 * 1024 * 1024;

/// Shared application state passed to all route handlers via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    store: Arc<DocumentStore>,
    extractor: Arc<Extractor>,
    answers: Arc<AnswerService>,
    /// Uploads run one at a time across requests, like a single batch.
    upload_lock: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(store: DocumentStore, extractor: Extractor, answers: AnswerService) -> Self {
        Self {
            store: Arc::new(store),
            extractor: Arc::new(extractor),
            answers: Arc::new(answers),
            upload_lock: Arc::new(Mutex::new(())),
        }
    }
}

/// Builds the router with every route and the CORS layer.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/documents", get(handle_list))
        .route("/documents/{id}", get(handle_get).delete(handle_delete))
        .route("/upload", post(handle_upload))
        .route("/ask", post(handle_ask))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(cors)
        .with_state(state)
}

/// Starts the HTTP server on `[server].bind` and runs until the process is
/// terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let store = DocumentStore::open(config).await?;
    let extractor = Extractor::from_config(config)?;
    let answers = AnswerService::from_config(config)?;
    let app = router(AppState::new(store, extractor, answers));

    let bind_addr = config.server.bind.clone();
    println!("docqa server listening on http://{}", bind_addr);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    /// Machine-readable error code (e.g., `"bad_request"`, `"not_found"`).
    code: String,
    message: String,
}

struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request".to_string(),
        message: message.into(),
    }
}

fn not_found(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::NOT_FOUND,
        code: "not_found".to_string(),
        message: message.into(),
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        tracing::error!(error = %err, "storage failure");
        AppError {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            code: "storage_error".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<AskError> for AppError {
    fn from(err: AskError) -> Self {
        match err {
            AskError::EmptyQuestion | AskError::NoDocuments => bad_request(err.to_string()),
            AskError::Storage(e) => e.into(),
        }
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    version: String,
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ /documents ============

#[derive(Serialize)]
struct DocumentListResponse {
    documents: Vec<StoredDocument>,
}

async fn handle_list(
    State(state): State<AppState>,
) -> Result<Json<DocumentListResponse>, AppError> {
    let documents = state.store.list_all_raw().await?;
    Ok(Json(DocumentListResponse { documents }))
}

async fn handle_get(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<StoredDocument>, AppError> {
    state
        .store
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| not_found(format!("document not found: {}", id)))
}

#[derive(Serialize)]
struct DeleteResponse {
    deleted: bool,
}

async fn handle_delete(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<DeleteResponse>, AppError> {
    let deleted = state.store.delete_by_id(id).await?;
    Ok(Json(DeleteResponse { deleted }))
}

// ============ POST /upload ============

#[derive(Deserialize)]
struct UploadRequest {
    files: Vec<UploadPayload>,
}

#[derive(Deserialize)]
struct UploadPayload {
    file_name: String,
    #[serde(default)]
    content_type: Option<String>,
    content_base64: String,
}

#[derive(Serialize)]
struct UploadResponse {
    files: Vec<FileReport>,
}

/// Decodes every payload before touching the store, so a malformed request
/// stores nothing.
async fn handle_upload(
    State(state): State<AppState>,
    Json(request): Json<UploadRequest>,
) -> Result<Json<UploadResponse>, AppError> {
    let mut files = Vec::with_capacity(request.files.len());
    for payload in request.files {
        if payload.file_name.trim().is_empty() {
            return Err(bad_request("file_name must not be empty"));
        }
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(payload.content_base64.as_bytes())
            .map_err(|e| bad_request(format!("{}: invalid base64: {}", payload.file_name, e)))?;
        files.push(UploadedFile::new(payload.file_name, payload.content_type, bytes));
    }

    let _guard = state.upload_lock.lock().await;
    let reports = ingest::ingest_batch(&state.store, &state.extractor, &files).await?;
    Ok(Json(UploadResponse { files: reports }))
}

// ============ POST /ask ============

#[derive(Deserialize)]
struct AskRequest {
    question: String,
}

#[derive(Serialize)]
struct AskResponse {
    answer: String,
}

async fn handle_ask(
    State(state): State<AppState>,
    Json(request): Json<AskRequest>,
) -> Result<Json<AskResponse>, AppError> {
    let answer = answer::ask(&state.store, &state.answers, &request.question).await?;
    Ok(Json(AskResponse { answer }))
}

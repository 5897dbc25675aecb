//! HTTP API for the studydesk service.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/upload?format=pdf|image` | Replace the document context from raw body bytes |
//! | `POST` | `/ask` | Answer a question (`{question, subject?}`) |
//! | `GET`  | `/download/{name}` | Download a library file (traversal-safe) |
//! | `GET`  | `/files` | Fresh library listing |
//! | `GET`  | `/books` | Per-subject textbook status |
//! | `POST` | `/refresh-files` | Rescan the library |
//! | `GET`  | `/health` | Health check (returns version) |
//!
//! # Error Contract
//!
//! Error responses use `{ "error": { "code": "...", "message": "..." } }`.
//! The one exception is `/ask`: collaborator failures there return the
//! uniform `{ "answer": "Server error. Please try again." }` body with a 500
//! status, never partial or internal detail.
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted so browser frontends can
//! call the API directly.

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};

use crate::extract::DocumentFormat;
use crate::grounding::GroundingStrategy as _;
use crate::library;
use crate::models::AskRequest;
use crate::pipeline::{self, DeskState};

/// Start the HTTP server. Runs until the process is terminated.
pub async fn run_server(state: DeskState) -> anyhow::Result<()> {
    let bind_addr = state.config.server.bind.clone();
    println!("grounding strategy: {}", state.verifier.name());

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/upload", post(handle_upload))
        .route("/ask", post(handle_ask))
        .route("/download/{name}", get(handle_download))
        .route("/files", get(handle_files))
        .route("/books", get(handle_books))
        .route("/refresh-files", post(handle_refresh_files))
        .route("/health", get(handle_health))
        .layer(cors)
        .with_state(state);

    println!("studydesk listening on http://{}", bind_addr);

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
    code: String,
    message: String,
}

/// Internal error type that converts into an HTTP response.
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

fn access_denied(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::FORBIDDEN,
        code: "access_denied".to_string(),
        message: message.into(),
    }
}

fn internal(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "internal".to_string(),
        message: message.into(),
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

// ============ POST /upload ============

#[derive(Deserialize)]
struct UploadParams {
    /// Format tag for the uploaded bytes: `pdf`, `image`, or anything else
    /// (stored as the unsupported sentinel).
    #[serde(default)]
    format: Option<String>,
}

#[derive(Serialize)]
struct UploadResponse {
    message: String,
}

async fn handle_upload(
    State(state): State<DeskState>,
    Query(params): Query<UploadParams>,
    body: Bytes,
) -> Result<Json<UploadResponse>, AppError> {
    if body.is_empty() {
        return Err(bad_request("upload body must not be empty"));
    }

    let format = params
        .format
        .as_deref()
        .map(DocumentFormat::from_tag)
        .unwrap_or(DocumentFormat::Unsupported);

    pipeline::ingest_document(&state, &body, format)
        .await
        .map_err(|e| {
            eprintln!("upload error: {}", e);
            internal("Error processing file.")
        })?;

    Ok(Json(UploadResponse {
        message: "File processed successfully!".to_string(),
    }))
}

// ============ POST /ask ============

async fn handle_ask(
    State(state): State<DeskState>,
    Json(request): Json<AskRequest>,
) -> Response {
    if request.question.trim().is_empty() {
        return bad_request("question must not be empty").into_response();
    }

    match pipeline::handle_question(&state, &request).await {
        Ok(answer) => Json(answer).into_response(),
        Err(e) => {
            // Collaborator failure: uniform answer, never internal detail.
            eprintln!("ask error: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "answer": "Server error. Please try again." })),
            )
                .into_response()
        }
    }
}

// ============ GET /download/{name} ============

async fn handle_download(
    State(state): State<DeskState>,
    Path(name): Path<String>,
) -> Result<Response, AppError> {
    let resolved = library::resolve_file(&state.config, &name).map_err(|e| {
        let msg = e.to_string();
        if msg.contains("access denied") {
            access_denied(msg)
        } else {
            let available = library::scan_library(&state.config)
                .map(|files| {
                    files
                        .iter()
                        .map(|f| f.name.clone())
                        .collect::<Vec<_>>()
                        .join(", ")
                })
                .unwrap_or_default();
            not_found(format!(
                "File not found. Available files: {}",
                if available.is_empty() {
                    "none"
                } else {
                    available.as_str()
                }
            ))
        }
    })?;

    let bytes = std::fs::read(&resolved).map_err(|e| internal(e.to_string()))?;

    let headers = [
        (header::CONTENT_TYPE, "application/octet-stream".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", name),
        ),
    ];
    Ok((headers, bytes).into_response())
}

// ============ GET /files ============

#[derive(Serialize)]
struct FilesResponse {
    files: Vec<FileInfo>,
    count: usize,
    #[serde(rename = "downloadBaseUrl")]
    download_base_url: String,
}

#[derive(Serialize)]
struct FileInfo {
    name: String,
    size: u64,
    extension: String,
}

async fn handle_files(State(state): State<DeskState>) -> Result<Json<FilesResponse>, AppError> {
    let files = library::scan_library(&state.config).map_err(|e| internal(e.to_string()))?;
    let infos: Vec<FileInfo> = files
        .iter()
        .map(|f| FileInfo {
            name: f.name.clone(),
            size: f.size_bytes,
            extension: f.extension.clone(),
        })
        .collect();
    let count = infos.len();
    Ok(Json(FilesResponse {
        files: infos,
        count,
        download_base_url: format!(
            "{}/",
            state.config.server.download_base_url.trim_end_matches('/')
        ),
    }))
}

// ============ GET /books ============

#[derive(Serialize)]
struct BookStatus {
    loaded: bool,
    length: usize,
}

async fn handle_books(State(state): State<DeskState>) -> Json<serde_json::Value> {
    let mut status = serde_json::Map::new();
    for (subject, loaded, length) in state.textbooks.status() {
        status.insert(
            subject,
            serde_json::to_value(BookStatus { loaded, length }).unwrap_or_default(),
        );
    }
    Json(serde_json::Value::Object(status))
}

// ============ POST /refresh-files ============

#[derive(Serialize)]
struct RefreshResponse {
    message: String,
    files: Vec<String>,
    count: usize,
}

async fn handle_refresh_files(
    State(state): State<DeskState>,
) -> Result<Json<RefreshResponse>, AppError> {
    let files = library::scan_library(&state.config).map_err(|e| internal(e.to_string()))?;
    let names: Vec<String> = files.iter().map(|f| f.name.clone()).collect();
    let count = names.len();
    Ok(Json(RefreshResponse {
        message: "File list refreshed".to_string(),
        files: names,
        count,
    }))
}

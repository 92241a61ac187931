//! HTTP server.
//!
//! Exposes the [`Library`] as a JSON HTTP API. Every JSON body carries an
//! `ok` flag; failures use the error envelope below.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`    | `/health` | Health check (returns version and index state) |
//! | `GET`    | `/documents` | List documents in the store |
//! | `GET`    | `/documents/{name}` | Document metadata |
//! | `PUT`    | `/documents/{name}` | Upload raw PDF bytes |
//! | `DELETE` | `/documents/{name}` | Remove a document |
//! | `GET`    | `/documents/{name}/summary` | Extractive summary (`?sentences=N`) |
//! | `POST`   | `/documents/{name}/extract` | Copy a page range into a new document |
//! | `GET`    | `/documents/{name}/epub` | Download as EPUB |
//! | `GET`    | `/search` | Ranked search (`?q=...&limit=N`) |
//! | `GET`    | `/index` | Index lifecycle status |
//! | `POST`   | `/index/rebuild` | Rebuild and wait for the report |
//!
//! Store mutations answer `202 Accepted` once the file is written; the
//! index catches up in the background.
//!
//! # Error Contract
//!
//! ```json
//! { "ok": false, "error": { "code": "invalid_query", "message": "invalid query: query must not be empty" } }
//! ```
//!
//! Error codes: `invalid_query`, `invalid_name`, `invalid_document`,
//! `invalid_page_range`, `invalid_request` (400), `not_found` (404),
//! `index_not_ready` (503), `store_unavailable`, `extraction_failed`,
//! `conversion_failed`, `internal` (500).

use axum::{
    body::Bytes,
    extract::{
        rejection::{JsonRejection, QueryRejection},
        DefaultBodyLimit, Path, Query, State,
    },
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::documents::{DocumentInfoResponse, DocumentListResponse};
use crate::error::LibraryError;
use crate::library::{Library, StoreChange};
use crate::lifecycle::{IndexState, IndexStatus, RebuildReport};
use crate::pages::PageExtraction;
use crate::search::SearchResponse;
use crate::summary::Summary;

/// Largest accepted upload.
const MAX_UPLOAD_BYTES: usize = 256 * 1024 * 1024;

/// Shared application state passed to all route handlers.
#[derive(Clone)]
struct AppState {
    library: Arc<Library>,
}

/// Opens the library described by `config` and serves it on `[server].bind`
/// until the process receives Ctrl-C.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let library = Arc::new(Library::open(config.clone()));
    let listener = tokio::net::TcpListener::bind(&config.server.bind).await?;
    tracing::info!(
        addr = %config.server.bind,
        root = %config.store.root.display(),
        "server listening"
    );

    axum::serve(listener, router(Arc::clone(&library)))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    library.shutdown().await;
    Ok(())
}

/// Builds the API router around an existing library.
pub fn router(library: Arc<Library>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handle_health))
        .route("/documents", get(handle_list))
        .route(
            "/documents/{name}",
            get(handle_info)
                .put(handle_upload)
                .delete(handle_remove)
                .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route("/documents/{name}/summary", get(handle_summary))
        .route("/documents/{name}/extract", post(handle_extract))
        .route("/documents/{name}/epub", get(handle_epub))
        .route("/search", get(handle_search))
        .route("/index", get(handle_index_status))
        .route("/index/rebuild", post(handle_rebuild))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(AppState { library })
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    ok: bool,
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: String,
    message: String,
}

/// Internal error type that converts into an Axum HTTP response.
#[derive(Debug)]
struct AppError {
    status: StatusCode,
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            ok: false,
            error: ErrorDetail {
                code: self.code,
                message: self.message,
            },
        };
        (self.status, Json(body)).into_response()
    }
}

impl From<LibraryError> for AppError {
    fn from(err: LibraryError) -> Self {
        let code = err.code();
        let status = status_for(code);
        if status.is_server_error() && status != StatusCode::SERVICE_UNAVAILABLE {
            tracing::error!(code, error = %err, "request failed");
        }
        AppError {
            status,
            code: code.to_string(),
            message: err.to_string(),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        bad_request(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        bad_request(rejection.body_text())
    }
}

fn status_for(code: &str) -> StatusCode {
    match code {
        "invalid_query" | "invalid_name" | "invalid_document" | "invalid_page_range" => {
            StatusCode::BAD_REQUEST
        }
        "not_found" => StatusCode::NOT_FOUND,
        "index_not_ready" => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Constructs a 400 for malformed request bodies and query strings.
fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "invalid_request".to_string(),
        message: message.into(),
    }
}

// ============ GET /health ============

#[derive(Serialize)]
struct HealthResponse {
    ok: bool,
    status: String,
    version: String,
    index: IndexState,
}

async fn handle_health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        ok: true,
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        index: state.library.index_status().state,
    })
}

// ============ Documents ============

async fn handle_list(
    State(state): State<AppState>,
) -> Result<Json<DocumentListResponse>, AppError> {
    let documents = state.library.list_documents().await?;
    Ok(Json(DocumentListResponse {
        ok: true,
        documents,
    }))
}

async fn handle_info(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<DocumentInfoResponse>, AppError> {
    let document = state.library.document_info(&name).await?;
    Ok(Json(DocumentInfoResponse { ok: true, document }))
}

#[derive(Serialize)]
struct StoreChangeResponse {
    ok: bool,
    #[serde(flatten)]
    change: StoreChange,
}

async fn handle_upload(
    State(state): State<AppState>,
    Path(name): Path<String>,
    body: Bytes,
) -> Result<(StatusCode, Json<StoreChangeResponse>), AppError> {
    let library = Arc::clone(&state.library);
    let change = tokio::task::spawn_blocking(move || library.add_document(&name, &body))
        .await
        .map_err(|e| LibraryError::Internal(e.to_string()))??;
    Ok((
        StatusCode::ACCEPTED,
        Json(StoreChangeResponse { ok: true, change }),
    ))
}

async fn handle_remove(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<(StatusCode, Json<StoreChangeResponse>), AppError> {
    let change = state.library.remove_document(&name).await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(StoreChangeResponse { ok: true, change }),
    ))
}

#[derive(Deserialize)]
struct SummaryParams {
    sentences: Option<usize>,
}

#[derive(Serialize)]
struct SummaryResponse {
    ok: bool,
    #[serde(flatten)]
    summary: Summary,
}

async fn handle_summary(
    State(state): State<AppState>,
    Path(name): Path<String>,
    params: Result<Query<SummaryParams>, QueryRejection>,
) -> Result<Json<SummaryResponse>, AppError> {
    let Query(params) = params?;
    let summary = state.library.summarize(&name, params.sentences).await?;
    Ok(Json(SummaryResponse { ok: true, summary }))
}

#[derive(Deserialize)]
struct ExtractRequest {
    from: u32,
    to: u32,
    output: Option<String>,
}

#[derive(Serialize)]
struct ExtractResponse {
    ok: bool,
    extraction: PageExtraction,
}

async fn handle_extract(
    State(state): State<AppState>,
    Path(name): Path<String>,
    request: Result<Json<ExtractRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ExtractResponse>), AppError> {
    let Json(request) = request?;
    let extraction = state
        .library
        .extract_pages(&name, request.from, request.to, request.output)
        .await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(ExtractResponse {
            ok: true,
            extraction,
        }),
    ))
}

async fn handle_epub(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Response, AppError> {
    let epub = state.library.convert_to_epub(&name).await?;
    let disposition = format!("attachment; filename=\"{}\"", epub.name.replace('"', ""));
    Ok((
        [
            (header::CONTENT_TYPE, "application/epub+zip".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        epub.bytes,
    )
        .into_response())
}

// ============ GET /search ============

#[derive(Deserialize)]
struct SearchParams {
    #[serde(default)]
    q: String,
    limit: Option<usize>,
}

async fn handle_search(
    State(state): State<AppState>,
    params: Result<Query<SearchParams>, QueryRejection>,
) -> Result<Json<SearchResponse>, AppError> {
    let Query(params) = params?;
    let mut results = state.library.search(&params.q)?;
    if let Some(limit) = params.limit {
        results.truncate(limit);
    }
    Ok(Json(SearchResponse { ok: true, results }))
}

// ============ Index ============

#[derive(Serialize)]
struct IndexStatusResponse {
    ok: bool,
    index: IndexStatus,
}

async fn handle_index_status(State(state): State<AppState>) -> Json<IndexStatusResponse> {
    Json(IndexStatusResponse {
        ok: true,
        index: state.library.index_status(),
    })
}

#[derive(Serialize)]
struct RebuildResponse {
    ok: bool,
    report: RebuildReport,
}

async fn handle_rebuild(State(state): State<AppState>) -> Result<Json<RebuildResponse>, AppError> {
    let report = state.library.rebuild_index().await?;
    Ok(Json(RebuildResponse { ok: true, report }))
}

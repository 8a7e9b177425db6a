//! Blob HTTP Routes
//!
//! Thin mapping from HTTP to the backend. Request and response bodies are
//! streamed; no handler buffers a whole blob.

use std::io;
use std::sync::Arc;

use axum::{
    body::{Body, Bytes},
    extract::{DefaultBodyLimit, Path, Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use futures_util::{stream, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio_util::io::{StreamReader, SyncIoBridge};

use crate::blob_store::{http_date, BlobError, BlobReader, BlobResult, SharedBackend, CHUNK_SIZE};

/// Chunks buffered between the file pump and the client
const STREAM_CHANNEL_DEPTH: usize = 4;

/// Page size used when a client pages without giving a limit
const DEFAULT_PAGE_LIMIT: usize = 1000;

/// Header carrying the cursor for the next listing page
pub const NEXT_CURSOR_HEADER: &str = "x-next-cursor";

// ==================
// Shared State
// ==================

/// State shared across blob handlers
pub struct BlobState {
    pub backend: SharedBackend,
}

impl BlobState {
    pub fn new(backend: SharedBackend) -> Self {
        Self { backend }
    }
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub after: Option<String>,
    #[serde(default)]
    pub limit: Option<usize>,
}

type HandlerError = (StatusCode, String);

// ==================
// Blob Routes
// ==================

/// Create blob routes
pub fn blob_routes(state: Arc<BlobState>) -> Router {
    Router::new()
        .route("/blobs", get(list_blobs_handler))
        .route(
            "/blobs/:blob",
            get(get_blob_handler)
                .head(head_blob_handler)
                .post(write_blob_handler)
                .put(write_blob_handler)
                .delete(delete_blob_handler),
        )
        .layer(DefaultBodyLimit::disable())
        .with_state(state)
}

// ==================
// Helper Functions
// ==================

fn error_response(err: &BlobError) -> HandlerError {
    let status =
        StatusCode::from_u16(err.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, format!("{}\n", err))
}

/// Run a backend call on the blocking pool
async fn run_blocking<T, F>(f: F) -> Result<T, HandlerError>
where
    F: FnOnce() -> BlobResult<T> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(f).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(error_response(&err)),
        Err(join_err) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Internal error: {}\n", join_err),
        )),
    }
}

/// Feed chunks from `reader` into `tx` until EOF, error, or the client
/// goes away. The reader is dropped, and its handle released, on return.
fn pump_chunks(reader: BlobReader, tx: mpsc::Sender<io::Result<Bytes>>) {
    for chunk in reader.chunks(CHUNK_SIZE) {
        let item = chunk
            .map(Bytes::from)
            .map_err(|e| io::Error::other(e.to_string()));
        let failed = item.is_err();

        if tx.blocking_send(item).is_err() || failed {
            break;
        }
    }
}

// ==================
// Blob Handlers
// ==================

async fn list_blobs_handler(
    State(state): State<Arc<BlobState>>,
    Query(query): Query<ListQuery>,
) -> Result<Response, HandlerError> {
    let backend = Arc::clone(&state.backend);

    if query.after.is_none() && query.limit.is_none() {
        let listed = run_blocking(move || backend.list()).await?;
        return Ok(Json(listed).into_response());
    }

    let limit = query.limit.unwrap_or(DEFAULT_PAGE_LIMIT);
    let after = query.after;
    let page = run_blocking(move || backend.list_page(after.as_deref(), limit)).await?;

    let mut headers = HeaderMap::new();
    if let Some(cursor) = page.next_cursor.as_deref() {
        if let Ok(value) = HeaderValue::from_str(cursor) {
            headers.insert(NEXT_CURSOR_HEADER, value);
        }
    }

    Ok((headers, Json(page.items)).into_response())
}

async fn get_blob_handler(
    State(state): State<Arc<BlobState>>,
    Path(key): Path<String>,
) -> Result<Response, HandlerError> {
    let backend = Arc::clone(&state.backend);
    let reader = run_blocking(move || backend.read(&key)).await?;
    let size = reader.size();

    let (tx, rx) = mpsc::channel(STREAM_CHANNEL_DEPTH);
    tokio::task::spawn_blocking(move || pump_chunks(reader, tx));

    let chunks = stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|item| (item, rx))
    });

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/octet-stream")
        .header(header::CONTENT_LENGTH, size)
        .body(Body::from_stream(chunks))
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("{}\n", e)))
}

async fn head_blob_handler(
    State(state): State<Arc<BlobState>>,
    Path(key): Path<String>,
) -> Result<Response, HandlerError> {
    let backend = Arc::clone(&state.backend);
    let info = run_blocking(move || backend.stat(&key)).await?;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_LENGTH, info.size)
        .header(header::LAST_MODIFIED, info.last_modified_http())
        .header(header::DATE, http_date(&chrono::Utc::now()))
        .body(Body::empty())
        .map_err(|e| (StatusCode::INTERNAL_SERVER_ERROR, format!("{}\n", e)))
}

async fn write_blob_handler(
    State(state): State<Arc<BlobState>>,
    Path(key): Path<String>,
    body: Body,
) -> Result<String, HandlerError> {
    let data = body.into_data_stream().map(|chunk| chunk.map_err(io::Error::other));
    let mut source = SyncIoBridge::new(StreamReader::new(data));

    let backend = Arc::clone(&state.backend);
    let target = key.clone();
    run_blocking(move || backend.write(&target, &mut source)).await?;

    Ok(format!("'{}' created!\n", key))
}

async fn delete_blob_handler(
    State(state): State<Arc<BlobState>>,
    Path(key): Path<String>,
) -> Result<String, HandlerError> {
    let backend = Arc::clone(&state.backend);
    let target = key.clone();
    run_blocking(move || backend.remove(&target)).await?;

    Ok(format!("'{}' destroyed!\n", key))
}

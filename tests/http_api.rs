//! HTTP API Tests
//!
//! Drives the full router in-process with `tower::ServiceExt::oneshot`.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use tower::ServiceExt;

use hoarder::blob_store::{FilesystemBackend, FsOptions, MemoryBackend, SharedBackend};
use hoarder::http_server::{HttpServer, HttpServerConfig, NEXT_CURSOR_HEADER};
use hoarder::observability::MetricsRegistry;
use tempfile::TempDir;

// -- Helpers --------------------------------------------------------------

fn build_app(backend: SharedBackend) -> (Router, Arc<MetricsRegistry>) {
    let metrics = Arc::new(MetricsRegistry::new());
    let server = HttpServer::with_metrics(HttpServerConfig::default(), backend, Arc::clone(&metrics));
    (server.router(), metrics)
}

fn memory_app() -> Router {
    build_app(Arc::new(MemoryBackend::new())).0
}

fn request(method: Method, uri: &str, body: impl Into<Body>) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(body.into())
        .unwrap()
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, axum::http::HeaderMap, Vec<u8>) {
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let headers = resp.headers().clone();
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, headers, body.to_vec())
}

async fn put(app: &Router, key: &str, data: &[u8]) -> (StatusCode, String) {
    let (status, _, body) = send(
        app,
        request(Method::PUT, &format!("/blobs/{}", key), data.to_vec()),
    )
    .await;
    (status, String::from_utf8(body).unwrap())
}

// -- Liveness -------------------------------------------------------------

#[tokio::test]
async fn ping_returns_pong() {
    let app = memory_app();
    let (status, _, body) = send(&app, request(Method::GET, "/ping", Body::empty())).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"pong\n");
}

#[tokio::test]
async fn health_reports_driver() {
    let app = memory_app();
    let (status, _, body) = send(&app, request(Method::GET, "/health", Body::empty())).await;

    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["backend"], "memory");
}

// -- Blob lifecycle -------------------------------------------------------

#[tokio::test(flavor = "multi_thread")]
async fn put_then_get_streams_content() {
    let app = memory_app();
    let payload: Vec<u8> = (0..200_000u32).map(|i| (i % 256) as u8).collect();

    let (status, body) = put(&app, "archive.bin", &payload).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "'archive.bin' created!\n");

    let (status, headers, body) =
        send(&app, request(Method::GET, "/blobs/archive.bin", Body::empty())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_LENGTH], payload.len().to_string().as_str());
    assert_eq!(headers[header::CONTENT_TYPE], "application/octet-stream");
    assert_eq!(body, payload);
}

#[tokio::test(flavor = "multi_thread")]
async fn post_overwrites_previous_version() {
    let app = memory_app();
    put(&app, "k", b"first version").await;

    let (status, _, _) = send(&app, request(Method::POST, "/blobs/k", "second")).await;
    assert_eq!(status, StatusCode::OK);

    let (_, _, body) = send(&app, request(Method::GET, "/blobs/k", Body::empty())).await;
    assert_eq!(body, b"second");
}

#[tokio::test(flavor = "multi_thread")]
async fn head_returns_metadata_headers() {
    let app = memory_app();
    put(&app, "doc", b"12345").await;

    let (status, headers, body) =
        send(&app, request(Method::HEAD, "/blobs/doc", Body::empty())).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(headers[header::CONTENT_LENGTH], "5");
    assert!(headers[header::LAST_MODIFIED].to_str().unwrap().ends_with(" GMT"));
    assert!(headers.contains_key(header::DATE));
    assert!(body.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn delete_then_delete_again_is_not_found() {
    let app = memory_app();
    put(&app, "gone", b"x").await;

    let (status, _, body) = send(&app, request(Method::DELETE, "/blobs/gone", Body::empty())).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"'gone' destroyed!\n");

    let (status, _, _) = send(&app, request(Method::DELETE, "/blobs/gone", Body::empty())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _, _) = send(&app, request(Method::GET, "/blobs/gone", Body::empty())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn missing_blob_is_404_for_get_and_head() {
    let app = memory_app();

    let (status, _, body) = send(&app, request(Method::GET, "/blobs/nope", Body::empty())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(String::from_utf8(body).unwrap().ends_with('\n'));

    let (status, _, _) = send(&app, request(Method::HEAD, "/blobs/nope", Body::empty())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test(flavor = "multi_thread")]
async fn invalid_key_is_400_and_writes_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let backend = FilesystemBackend::open_with(temp_dir.path(), FsOptions { fsync: false, ..FsOptions::default() }).unwrap();
    let (app, metrics) = build_app(Arc::new(backend));

    let (status, body) = put(&app, "a%2Fb", b"x").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("a/b"));

    let (status, _) = put(&app, "nul%00byte", b"x").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert!(!temp_dir.path().join("a").exists());
    assert_eq!(metrics.snapshot().errors.invalid_key, 2);
}

// -- Listing --------------------------------------------------------------

#[tokio::test(flavor = "multi_thread")]
async fn list_returns_sorted_metadata() {
    let app = memory_app();
    for (key, data) in [("c", "ccc"), ("a", "a"), ("b", "bb")] {
        put(&app, key, data.as_bytes()).await;
    }
    send(&app, request(Method::DELETE, "/blobs/b", Body::empty())).await;

    let (status, headers, body) = send(&app, request(Method::GET, "/blobs", Body::empty())).await;
    assert_eq!(status, StatusCode::OK);
    assert!(!headers.contains_key(NEXT_CURSOR_HEADER));

    let listed: Vec<serde_json::Value> = serde_json::from_slice(&body).unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0]["key"], "a");
    assert_eq!(listed[0]["size"], 1);
    assert_eq!(listed[1]["key"], "c");
    assert_eq!(listed[1]["size"], 3);
    assert!(listed[0]["modTime"].is_string());
}

#[tokio::test(flavor = "multi_thread")]
async fn list_pages_with_cursor_header() {
    let app = memory_app();
    for key in ["a", "b", "c"] {
        put(&app, key, b"x").await;
    }

    let (_, headers, body) = send(&app, request(Method::GET, "/blobs?limit=2", Body::empty())).await;
    let page: Vec<serde_json::Value> = serde_json::from_slice(&body).unwrap();
    assert_eq!(page.len(), 2);
    assert_eq!(headers[NEXT_CURSOR_HEADER], "b");

    let (_, headers, body) =
        send(&app, request(Method::GET, "/blobs?after=b&limit=2", Body::empty())).await;
    let page: Vec<serde_json::Value> = serde_json::from_slice(&body).unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0]["key"], "c");
    assert!(!headers.contains_key(NEXT_CURSOR_HEADER));
}

// -- Metrics --------------------------------------------------------------

#[tokio::test(flavor = "multi_thread")]
async fn metrics_count_operations() {
    let app = memory_app();
    put(&app, "m", b"hello").await;
    send(&app, request(Method::GET, "/blobs/m", Body::empty())).await;
    send(&app, request(Method::GET, "/blobs/absent", Body::empty())).await;

    let (status, _, body) = send(&app, request(Method::GET, "/metrics", Body::empty())).await;
    assert_eq!(status, StatusCode::OK);

    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["writes"], 1);
    assert_eq!(json["bytes_written"], 5);
    assert_eq!(json["reads_opened"], 1);
    assert_eq!(json["errors"]["not_found"], 1);
}

//! Observability HTTP Routes
//!
//! Liveness, health, and metrics endpoints.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde::Serialize;

use crate::observability::MetricsRegistry;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub backend: String,
}

/// State for the observability endpoints
pub struct ObservabilityState {
    pub metrics: Arc<MetricsRegistry>,
    pub backend_name: &'static str,
}

/// Create observability routes
pub fn observability_routes(state: Arc<ObservabilityState>) -> Router {
    Router::new()
        .route("/ping", get(ping_handler))
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .with_state(state)
}

async fn ping_handler() -> &'static str {
    "pong\n"
}

async fn health_handler(State(state): State<Arc<ObservabilityState>>) -> impl IntoResponse {
    let response = HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        backend: state.backend_name.to_string(),
    };

    (StatusCode::OK, Json(response))
}

async fn metrics_handler(State(state): State<Arc<ObservabilityState>>) -> impl IntoResponse {
    (StatusCode::OK, Json(state.metrics.snapshot()))
}

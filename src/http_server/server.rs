//! # HTTP Server
//!
//! Combines the blob and observability routers on one axum server. The
//! backend is handed in by the caller; the server never chooses a driver.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use super::blob_routes::{blob_routes, BlobState};
use super::config::HttpServerConfig;
use super::observability_routes::{observability_routes, ObservabilityState};
use crate::blob_store::{ObservedBackend, SharedBackend};
use crate::observability::{log_event_with_fields, Event, MetricsRegistry};

/// HTTP server for the blob store
pub struct HttpServer {
    config: HttpServerConfig,
    router: Router,
}

impl HttpServer {
    /// Create a server over `backend`, reporting into a fresh metrics registry
    pub fn new(config: HttpServerConfig, backend: SharedBackend) -> Self {
        Self::with_metrics(config, backend, Arc::new(MetricsRegistry::new()))
    }

    /// Create a server over `backend`, reporting into `metrics`
    pub fn with_metrics(
        config: HttpServerConfig,
        backend: SharedBackend,
        metrics: Arc<MetricsRegistry>,
    ) -> Self {
        let router = Self::build_router(&config, backend, metrics);
        Self { config, router }
    }

    fn build_router(
        config: &HttpServerConfig,
        backend: SharedBackend,
        metrics: Arc<MetricsRegistry>,
    ) -> Router {
        let backend_name = backend.name();
        let observed = ObservedBackend::shared(backend, Arc::clone(&metrics));

        let blob_state = Arc::new(BlobState::new(observed));
        let observability_state = Arc::new(ObservabilityState {
            metrics,
            backend_name,
        });

        Router::new()
            .merge(observability_routes(observability_state))
            .merge(blob_routes(blob_state))
            .layer(Self::cors_layer(config))
    }

    fn cors_layer(config: &HttpServerConfig) -> CorsLayer {
        if config.cors_origins.is_empty() {
            return CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any);
        }

        let origins: Vec<_> = config
            .cors_origins
            .iter()
            .filter_map(|s| s.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    }

    /// Get the socket address
    pub fn socket_addr(&self) -> String {
        self.config.socket_addr()
    }

    /// Get the router (for testing)
    pub fn router(self) -> Router {
        self.router
    }

    /// Serve until Ctrl-C
    pub async fn start(self) -> Result<(), std::io::Error> {
        let addr: SocketAddr = self.config.socket_addr().parse().map_err(|e| {
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("Invalid socket address '{}': {}", self.config.socket_addr(), e),
            )
        })?;

        let listener = TcpListener::bind(addr).await?;
        log_event_with_fields(Event::Serving, &[("addr", addr.to_string().as_str())]);

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async {
                let _ = tokio::signal::ctrl_c().await;
            })
            .await
    }
}

//! # HTTP Server Module
//!
//! HTTP API over a [`crate::blob_store::BlobBackend`].
//!
//! # Endpoints
//!
//! - `GET /blobs` - List blobs (`?after=&limit=` to page)
//! - `GET /blobs/:blob` - Stream a blob
//! - `HEAD /blobs/:blob` - Blob size and modification time
//! - `POST|PUT /blobs/:blob` - Create or replace a blob
//! - `DELETE /blobs/:blob` - Remove a blob
//! - `/ping`, `/health`, `/metrics` - Observability

pub mod blob_routes;
pub mod config;
pub mod observability_routes;
pub mod server;

pub use blob_routes::NEXT_CURSOR_HEADER;
pub use config::HttpServerConfig;
pub use server::HttpServer;

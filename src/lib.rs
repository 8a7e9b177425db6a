//! hoarder - A small, durable blob store
//!
//! Blobs are opaque byte sequences addressed by flat string keys. Every
//! consumer talks to storage through [`blob_store::BlobBackend`]; the HTTP
//! API and the CLI are thin layers over it.

pub mod blob_store;
pub mod cli;
pub mod http_server;
pub mod observability;

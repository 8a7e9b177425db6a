//! # Blob Store Module
//!
//! Key-addressed blob storage behind one capability trait.
//!
//! - [`BlobBackend`]: write, read, stat, remove, list
//! - [`FilesystemBackend`]: one file per key, atomic publish by rename
//! - [`MemoryBackend`]: process-local store for tests and ephemeral use
//! - [`ObservedBackend`]: metrics and logging around any backend

pub mod backend;
pub mod config;
pub mod errors;
pub mod filesystem;
pub mod info;
pub mod key;
pub mod memory;
pub mod observed;

pub use backend::{BlobBackend, BlobChunks, BlobReader, SharedBackend, CHUNK_SIZE};
pub use config::{open_backend, BackendConfig, BackendUrlError};
pub use errors::{BlobError, BlobErrorKind, BlobResult};
pub use filesystem::{FilesystemBackend, FsOptions, DEFAULT_STAGING_GRACE, STAGING_DIR};
pub use info::{http_date, BlobInfo, ListPage};
pub use key::{BlobKey, MAX_KEY_LEN};
pub use memory::MemoryBackend;
pub use observed::ObservedBackend;

//! # Backend Selection
//!
//! The active driver is chosen once at startup from a URL-like string and
//! the resulting [`SharedBackend`] is passed to every consumer.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use super::backend::SharedBackend;
use super::errors::BlobResult;
use super::filesystem::{FilesystemBackend, FsOptions};
use super::memory::MemoryBackend;

/// Which driver to construct
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendConfig {
    /// `file://<root>`
    Filesystem { root: PathBuf },
    /// `memory://`
    Memory,
}

/// Error parsing a backend URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendUrlError(pub String);

impl fmt::Display for BackendUrlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid backend URL: {}", self.0)
    }
}

impl std::error::Error for BackendUrlError {}

impl FromStr for BackendConfig {
    type Err = BackendUrlError;

    fn from_str(url: &str) -> Result<Self, Self::Err> {
        if let Some(root) = url.strip_prefix("file://") {
            if root.is_empty() {
                return Err(BackendUrlError(format!("'{}' has no root directory", url)));
            }
            return Ok(BackendConfig::Filesystem {
                root: PathBuf::from(root),
            });
        }

        match url {
            "memory://" | "memory" => Ok(BackendConfig::Memory),
            other => Err(BackendUrlError(format!(
                "'{}' (expected file://<path> or memory://)",
                other
            ))),
        }
    }
}

impl fmt::Display for BackendConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendConfig::Filesystem { root } => write!(f, "file://{}", root.display()),
            BackendConfig::Memory => f.write_str("memory://"),
        }
    }
}

/// Construct the configured backend
pub fn open_backend(config: &BackendConfig, fsync: bool) -> BlobResult<SharedBackend> {
    let backend: SharedBackend = match config {
        BackendConfig::Filesystem { root } => {
            let options = FsOptions {
                fsync,
                ..FsOptions::default()
            };
            Arc::new(FilesystemBackend::open_with(root.clone(), options)?)
        }
        BackendConfig::Memory => Arc::new(MemoryBackend::new()),
    };
    Ok(backend)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_file_url() {
        let config: BackendConfig = "file:///var/db/hoarder".parse().unwrap();
        assert_eq!(
            config,
            BackendConfig::Filesystem {
                root: PathBuf::from("/var/db/hoarder")
            }
        );
        assert_eq!(config.to_string(), "file:///var/db/hoarder");
    }

    #[test]
    fn test_parse_relative_file_url() {
        let config: BackendConfig = "file://data/blobs".parse().unwrap();
        assert_eq!(
            config,
            BackendConfig::Filesystem {
                root: PathBuf::from("data/blobs")
            }
        );
    }

    #[test]
    fn test_parse_memory_url() {
        assert_eq!("memory://".parse::<BackendConfig>().unwrap(), BackendConfig::Memory);
    }

    #[test]
    fn test_rejects_unknown_scheme() {
        assert!("s3://bucket".parse::<BackendConfig>().is_err());
        assert!("file://".parse::<BackendConfig>().is_err());
        assert!("".parse::<BackendConfig>().is_err());
    }

    #[test]
    fn test_open_backend() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("blobs");
        let config = BackendConfig::Filesystem { root: root.clone() };

        let backend = open_backend(&config, false).unwrap();
        assert_eq!(backend.name(), "filesystem");
        assert!(root.is_dir());

        let backend = open_backend(&BackendConfig::Memory, true).unwrap();
        assert_eq!(backend.name(), "memory");
    }
}

//! # Blob Store Errors

use std::fmt;
use std::io;

use thiserror::Error;

/// Result type for blob store operations
pub type BlobResult<T> = Result<T, BlobError>;

/// Blob store errors
///
/// Every backend reports exactly one of these kinds so the calling layer can
/// pick a response without inspecting messages.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlobError {
    /// No blob is stored under the key
    #[error("Blob not found: {0}")]
    NotFound(String),

    /// The key fails the naming rules of the driver
    #[error("Invalid key {key:?}: {reason}")]
    InvalidKey { key: String, reason: String },

    /// The storage medium failed (permissions, disk full, corruption)
    #[error("Storage medium failure: {0}")]
    Medium(String),

    /// The caller-side stream failed while being consumed or fed
    #[error("Stream failure: {0}")]
    Stream(String),
}

/// Stable, distinguishable error kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlobErrorKind {
    NotFound,
    InvalidKey,
    MediumFailure,
    StreamFailure,
}

impl BlobErrorKind {
    /// Returns the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            BlobErrorKind::NotFound => "NOT_FOUND",
            BlobErrorKind::InvalidKey => "INVALID_KEY",
            BlobErrorKind::MediumFailure => "MEDIUM_FAILURE",
            BlobErrorKind::StreamFailure => "STREAM_FAILURE",
        }
    }
}

impl fmt::Display for BlobErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl BlobError {
    /// Create an invalid key error
    pub fn invalid_key(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidKey {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Create a medium failure with context
    pub fn medium(context: impl fmt::Display, err: io::Error) -> Self {
        Self::Medium(format!("{}: {}", context, err))
    }

    /// Create a stream failure with context
    pub fn stream(context: impl fmt::Display, err: io::Error) -> Self {
        Self::Stream(format!("{}: {}", context, err))
    }

    /// Map an I/O error raised while touching the blob stored under `key`.
    ///
    /// Absence becomes `NotFound`; everything else is a medium failure.
    pub fn from_io(key: &str, err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::NotFound {
            Self::NotFound(key.to_string())
        } else {
            Self::medium(format_args!("blob {:?}", key), err)
        }
    }

    /// Get the error kind
    pub fn kind(&self) -> BlobErrorKind {
        match self {
            BlobError::NotFound(_) => BlobErrorKind::NotFound,
            BlobError::InvalidKey { .. } => BlobErrorKind::InvalidKey,
            BlobError::Medium(_) => BlobErrorKind::MediumFailure,
            BlobError::Stream(_) => BlobErrorKind::StreamFailure,
        }
    }

    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            BlobError::NotFound(_) => 404,
            BlobError::InvalidKey { .. } => 400,
            BlobError::Medium(_) => 500,
            BlobError::Stream(_) => 400,
        }
    }

    /// Returns true if the error is `NotFound`
    ///
    /// Callers that want idempotent removal ignore exactly this case.
    pub fn is_not_found(&self) -> bool {
        matches!(self, BlobError::NotFound(_))
    }
}

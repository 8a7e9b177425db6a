//! CLI-specific error types
//!
//! Every CLI error ends the process with a non-zero exit code.

use std::fmt;
use std::io;

use crate::blob_store::{BlobError, BlobErrorKind};

/// CLI error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Configuration file error
    ConfigError,
    /// I/O error (stdin/stdout, local files)
    IoError,
    /// Server failed to start
    ServeFailed,
    /// Blob does not exist
    NotFound,
    /// Key rejected
    InvalidKey,
    /// Storage medium failed
    MediumFailure,
    /// Data source or sink failed mid-transfer
    StreamFailure,
}

impl CliErrorCode {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "HOARD_CLI_CONFIG_ERROR",
            Self::IoError => "HOARD_CLI_IO_ERROR",
            Self::ServeFailed => "HOARD_CLI_SERVE_FAILED",
            Self::NotFound => "HOARD_CLI_NOT_FOUND",
            Self::InvalidKey => "HOARD_CLI_INVALID_KEY",
            Self::MediumFailure => "HOARD_CLI_MEDIUM_FAILURE",
            Self::StreamFailure => "HOARD_CLI_STREAM_FAILURE",
        }
    }
}

impl From<BlobErrorKind> for CliErrorCode {
    fn from(kind: BlobErrorKind) -> Self {
        match kind {
            BlobErrorKind::NotFound => Self::NotFound,
            BlobErrorKind::InvalidKey => Self::InvalidKey,
            BlobErrorKind::MediumFailure => Self::MediumFailure,
            BlobErrorKind::StreamFailure => Self::StreamFailure,
        }
    }
}

/// CLI error
#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    /// Create a new CLI error
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Config error
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConfigError, msg)
    }

    /// I/O error
    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    /// Serve failed
    pub fn serve_failed(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ServeFailed, msg)
    }

    /// Get the error code
    pub fn code(&self) -> &CliErrorCode {
        &self.code
    }

    /// Get the error code string
    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CliError {}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::io_error(format!("JSON error: {}", e))
    }
}

impl From<BlobError> for CliError {
    fn from(e: BlobError) -> Self {
        Self::new(e.kind().into(), e.to_string())
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;

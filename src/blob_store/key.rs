//! # Blob Keys
//!
//! Keys are opaque, client-supplied strings in a flat namespace. The rules
//! here hold for every driver; drivers may add their own on top.

use std::fmt;

use super::errors::{BlobError, BlobResult};

/// Longest key accepted, in bytes
pub const MAX_KEY_LEN: usize = 255;

/// A validated blob key
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlobKey(String);

impl BlobKey {
    /// Validate a raw key against the driver-independent rules
    pub fn parse(raw: &str) -> BlobResult<Self> {
        if raw.is_empty() {
            return Err(BlobError::invalid_key(raw, "key must not be empty"));
        }

        if raw.len() > MAX_KEY_LEN {
            return Err(BlobError::invalid_key(
                raw,
                format!("key is {} bytes (max: {})", raw.len(), MAX_KEY_LEN),
            ));
        }

        if raw.contains('\0') {
            return Err(BlobError::invalid_key(raw, "key contains a NUL byte"));
        }

        if raw.chars().any(|c| c.is_ascii_control()) {
            return Err(BlobError::invalid_key(raw, "key contains a control character"));
        }

        Ok(Self(raw.to_string()))
    }

    /// Get the key as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume into the owned string
    pub fn into_string(self) -> String {
        self.0
    }
}

impl AsRef<str> for BlobKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BlobKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

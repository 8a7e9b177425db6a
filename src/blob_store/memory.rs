//! # In-Memory Backend
//!
//! Keeps blobs in process memory. Useful for tests and ephemeral stores;
//! contents are lost when the process exits.

use std::collections::BTreeMap;
use std::io::{Cursor, Read};
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};

use super::backend::{copy_stream, BlobBackend, BlobReader};
use super::errors::{BlobError, BlobResult};
use super::info::BlobInfo;
use super::key::BlobKey;

#[derive(Debug, Clone)]
struct StoredBlob {
    data: Arc<[u8]>,
    mod_time: DateTime<Utc>,
}

/// In-memory blob backend
#[derive(Debug, Default)]
pub struct MemoryBackend {
    blobs: RwLock<BTreeMap<String, StoredBlob>>,
}

impl MemoryBackend {
    /// Create an empty backend
    pub fn new() -> Self {
        Self::default()
    }

    fn get(&self, key: &BlobKey) -> BlobResult<StoredBlob> {
        let blobs = self
            .blobs
            .read()
            .map_err(|_| BlobError::Medium("Lock poisoned".into()))?;

        blobs
            .get(key.as_str())
            .cloned()
            .ok_or_else(|| BlobError::NotFound(key.to_string()))
    }
}

impl BlobBackend for MemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn write(&self, key: &str, source: &mut dyn Read) -> BlobResult<u64> {
        let key = BlobKey::parse(key)?;

        // The input is fully consumed before the lock is taken, so readers
        // never see a partial blob and slow uploads block nobody.
        let mut data = Vec::new();
        let written = copy_stream(key.as_str(), source, &mut data)?;

        let blob = StoredBlob {
            data: Arc::from(data),
            mod_time: Utc::now(),
        };

        let mut blobs = self
            .blobs
            .write()
            .map_err(|_| BlobError::Medium("Lock poisoned".into()))?;
        blobs.insert(key.into_string(), blob);

        Ok(written)
    }

    fn read(&self, key: &str) -> BlobResult<BlobReader> {
        let key = BlobKey::parse(key)?;
        let blob = self.get(&key)?;

        let size = blob.data.len() as u64;
        Ok(BlobReader::new(key.into_string(), size, Cursor::new(blob.data)))
    }

    fn stat(&self, key: &str) -> BlobResult<BlobInfo> {
        let key = BlobKey::parse(key)?;
        let blob = self.get(&key)?;

        Ok(BlobInfo::new(key.into_string(), blob.data.len() as u64, blob.mod_time))
    }

    fn remove(&self, key: &str) -> BlobResult<()> {
        let key = BlobKey::parse(key)?;

        let mut blobs = self
            .blobs
            .write()
            .map_err(|_| BlobError::Medium("Lock poisoned".into()))?;

        blobs
            .remove(key.as_str())
            .map(|_| ())
            .ok_or_else(|| BlobError::NotFound(key.into_string()))
    }

    fn list(&self) -> BlobResult<Vec<BlobInfo>> {
        let blobs = self
            .blobs
            .read()
            .map_err(|_| BlobError::Medium("Lock poisoned".into()))?;

        Ok(blobs
            .iter()
            .map(|(key, blob)| BlobInfo::new(key.clone(), blob.data.len() as u64, blob.mod_time))
            .collect())
    }
}

//! # Blob Backend Trait
//!
//! The capability every storage driver implements. Callers hold a
//! [`SharedBackend`] and never a concrete driver type.

use std::fmt;
use std::io::{self, Read, Write};
use std::sync::Arc;

use super::errors::{BlobError, BlobResult};
use super::info::{BlobInfo, ListPage};

/// Size of the buffer used for every streaming copy
pub const CHUNK_SIZE: usize = 64 * 1024;

/// Shared handle to the active backend
pub type SharedBackend = Arc<dyn BlobBackend>;

/// Backend trait for blob storage
///
/// All operations are synchronous and safe to call from many threads at
/// once. A write becomes visible only after it has fully completed.
pub trait BlobBackend: Send + Sync + fmt::Debug {
    /// Short driver name, used in logs
    fn name(&self) -> &'static str;

    /// Stream `source` into the blob under `key`, replacing any previous
    /// blob atomically. Returns the number of bytes stored.
    fn write(&self, key: &str, source: &mut dyn Read) -> BlobResult<u64>;

    /// Open the blob under `key` for streaming
    fn read(&self, key: &str) -> BlobResult<BlobReader>;

    /// Get size and modification time without opening the data path
    fn stat(&self, key: &str) -> BlobResult<BlobInfo>;

    /// Delete the blob under `key`; absence is `NotFound`
    fn remove(&self, key: &str) -> BlobResult<()>;

    /// List every stored blob, sorted by key
    fn list(&self) -> BlobResult<Vec<BlobInfo>>;

    /// List at most `limit` blobs whose key sorts strictly after `after`
    fn list_page(&self, after: Option<&str>, limit: usize) -> BlobResult<ListPage> {
        let limit = limit.max(1);
        let mut remaining = self
            .list()?
            .into_iter()
            .filter(|info| after.map_or(true, |cursor| info.key.as_str() > cursor));

        let items: Vec<BlobInfo> = remaining.by_ref().take(limit).collect();
        let next_cursor = match remaining.next() {
            Some(_) => items.last().map(|info| info.key.clone()),
            None => None,
        };

        Ok(ListPage { items, next_cursor })
    }
}

/// A scoped read stream over one stored blob
///
/// The underlying handle is released when the reader is dropped, whichever
/// way consumption ends.
pub struct BlobReader {
    key: String,
    size: u64,
    inner: Box<dyn Read + Send>,
}

impl BlobReader {
    /// Wrap an open handle
    pub fn new(key: impl Into<String>, size: u64, inner: impl Read + Send + 'static) -> Self {
        Self {
            key: key.into(),
            size,
            inner: Box::new(inner),
        }
    }

    /// Key of the blob being read
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Size of the blob as seen by the open handle
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Replace the inner handle, keeping key and size
    pub fn map_inner<F, R>(self, f: F) -> Self
    where
        F: FnOnce(Box<dyn Read + Send>) -> R,
        R: Read + Send + 'static,
    {
        Self {
            key: self.key,
            size: self.size,
            inner: Box::new(f(self.inner)),
        }
    }

    /// Turn the reader into a lazy sequence of bounded chunks
    pub fn chunks(self, chunk_size: usize) -> BlobChunks {
        BlobChunks {
            buf: vec![0u8; chunk_size.max(1)],
            reader: Some(self),
        }
    }

    /// Stream the whole blob into `sink` through a fixed-size buffer
    pub fn copy_to(mut self, sink: &mut dyn Write) -> BlobResult<u64> {
        let mut buffer = vec![0u8; CHUNK_SIZE];
        let mut copied = 0u64;

        loop {
            let n = match self.inner.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(BlobError::from_io(&self.key, e)),
            };

            sink.write_all(&buffer[..n])
                .map_err(|e| BlobError::stream(format_args!("writing blob {:?} to sink", self.key), e))?;
            copied += n as u64;
        }

        sink.flush()
            .map_err(|e| BlobError::stream(format_args!("flushing blob {:?} to sink", self.key), e))?;

        Ok(copied)
    }
}

impl Read for BlobReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl fmt::Debug for BlobReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlobReader")
            .field("key", &self.key)
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

/// Iterator of bounded chunks read from a [`BlobReader`]
///
/// Finite and non-restartable: after EOF or the first error it yields
/// nothing more, and the reader is released at that point.
#[derive(Debug)]
pub struct BlobChunks {
    reader: Option<BlobReader>,
    buf: Vec<u8>,
}

impl Iterator for BlobChunks {
    type Item = BlobResult<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        let reader = self.reader.as_mut()?;

        loop {
            match reader.inner.read(&mut self.buf) {
                Ok(0) => {
                    self.reader = None;
                    return None;
                }
                Ok(n) => return Some(Ok(self.buf[..n].to_vec())),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    let err = BlobError::from_io(&reader.key, e);
                    self.reader = None;
                    return Some(Err(err));
                }
            }
        }
    }
}

/// Copy `source` into `dest` in bounded chunks.
///
/// Failures reading the source are stream failures; failures writing the
/// destination are medium failures.
pub(crate) fn copy_stream(key: &str, source: &mut dyn Read, dest: &mut dyn Write) -> BlobResult<u64> {
    let mut buffer = vec![0u8; CHUNK_SIZE];
    let mut copied = 0u64;

    loop {
        let n = match source.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                return Err(BlobError::stream(format_args!("reading input for blob {:?}", key), e))
            }
        };

        dest.write_all(&buffer[..n])
            .map_err(|e| BlobError::medium(format_args!("writing blob {:?}", key), e))?;
        copied += n as u64;
    }

    Ok(copied)
}

//! # Observed Backend
//!
//! Decorator that records metrics and structured log events around any
//! backend. It implements [`BlobBackend`] itself, so callers cannot tell it
//! apart from the driver it wraps.

use std::io::{self, Read};
use std::sync::Arc;

use super::backend::{BlobBackend, BlobReader, SharedBackend};
use super::errors::BlobResult;
use super::info::{BlobInfo, ListPage};
use crate::observability::{log_event_with_fields, Event, MetricsRegistry};

/// Backend wrapper that observes every operation
#[derive(Debug)]
pub struct ObservedBackend {
    inner: SharedBackend,
    metrics: Arc<MetricsRegistry>,
}

impl ObservedBackend {
    /// Wrap `inner`, reporting into `metrics`
    pub fn new(inner: SharedBackend, metrics: Arc<MetricsRegistry>) -> Self {
        Self { inner, metrics }
    }

    /// Wrap `inner` and return it as a shared backend
    pub fn shared(inner: SharedBackend, metrics: Arc<MetricsRegistry>) -> SharedBackend {
        Arc::new(Self::new(inner, metrics))
    }

    fn observe<T>(&self, op: &str, key: &str, result: BlobResult<T>) -> BlobResult<T> {
        if let Err(ref err) = result {
            self.metrics.record_error(err.kind());
            log_event_with_fields(
                Event::BlobOperationFailed,
                &[
                    ("backend", self.inner.name()),
                    ("key", key),
                    ("kind", err.kind().as_str()),
                    ("op", op),
                    ("reason", err.to_string().as_str()),
                ],
            );
        }
        result
    }
}

impl BlobBackend for ObservedBackend {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    fn write(&self, key: &str, source: &mut dyn Read) -> BlobResult<u64> {
        let bytes = self.observe("write", key, self.inner.write(key, source))?;

        self.metrics.record_write(bytes);
        log_event_with_fields(
            Event::BlobWritten,
            &[("bytes", bytes.to_string().as_str()), ("key", key)],
        );

        Ok(bytes)
    }

    fn read(&self, key: &str) -> BlobResult<BlobReader> {
        let reader = self.observe("read", key, self.inner.read(key))?;

        self.metrics.increment_reads_opened();
        log_event_with_fields(
            Event::BlobReadOpened,
            &[("key", key), ("size", reader.size().to_string().as_str())],
        );

        let metrics = Arc::clone(&self.metrics);
        let key = key.to_string();
        Ok(reader.map_inner(move |inner| CountingReader {
            inner,
            key,
            served: 0,
            metrics,
        }))
    }

    fn stat(&self, key: &str) -> BlobResult<BlobInfo> {
        let info = self.observe("stat", key, self.inner.stat(key))?;

        self.metrics.increment_stats();
        log_event_with_fields(Event::BlobStat, &[("key", key)]);

        Ok(info)
    }

    fn remove(&self, key: &str) -> BlobResult<()> {
        self.observe("remove", key, self.inner.remove(key))?;

        self.metrics.increment_removals();
        log_event_with_fields(Event::BlobRemoved, &[("key", key)]);

        Ok(())
    }

    fn list(&self) -> BlobResult<Vec<BlobInfo>> {
        let listed = self.observe("list", "", self.inner.list())?;

        self.metrics.increment_listings();
        log_event_with_fields(Event::BlobListed, &[("count", listed.len().to_string().as_str())]);

        Ok(listed)
    }

    fn list_page(&self, after: Option<&str>, limit: usize) -> BlobResult<ListPage> {
        let page = self.observe(
            "list",
            after.unwrap_or(""),
            self.inner.list_page(after, limit),
        )?;

        self.metrics.increment_listings();
        log_event_with_fields(
            Event::BlobListed,
            &[("count", page.items.len().to_string().as_str())],
        );

        Ok(page)
    }
}

/// Counts bytes as they are served and reports when the stream is released
struct CountingReader {
    inner: Box<dyn Read + Send>,
    key: String,
    served: u64,
    metrics: Arc<MetricsRegistry>,
}

impl Read for CountingReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.served += n as u64;
        self.metrics.add_bytes_read(n as u64);
        Ok(n)
    }
}

impl Drop for CountingReader {
    fn drop(&mut self) {
        log_event_with_fields(
            Event::BlobReadClosed,
            &[
                ("bytes", self.served.to_string().as_str()),
                ("key", self.key.as_str()),
            ],
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blob_store::memory::MemoryBackend;
    use std::io::Cursor;

    fn observed() -> (ObservedBackend, Arc<MetricsRegistry>) {
        let metrics = Arc::new(MetricsRegistry::new());
        let backend = ObservedBackend::new(Arc::new(MemoryBackend::new()), Arc::clone(&metrics));
        (backend, metrics)
    }

    #[test]
    fn test_counts_successful_operations() {
        let (backend, metrics) = observed();

        backend.write("a", &mut Cursor::new(b"hello")).unwrap();
        backend.stat("a").unwrap();
        backend.list().unwrap();

        let mut data = Vec::new();
        backend.read("a").unwrap().read_to_end(&mut data).unwrap();
        backend.remove("a").unwrap();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.writes, 1);
        assert_eq!(snapshot.bytes_written, 5);
        assert_eq!(snapshot.reads_opened, 1);
        assert_eq!(snapshot.bytes_read, 5);
        assert_eq!(snapshot.stats, 1);
        assert_eq!(snapshot.listings, 1);
        assert_eq!(snapshot.removals, 1);
    }

    #[test]
    fn test_counts_errors_by_kind() {
        let (backend, metrics) = observed();

        assert!(backend.read("missing").is_err());
        assert!(backend.remove("missing").is_err());
        assert!(backend.write("", &mut Cursor::new(b"x")).is_err());

        let errors = metrics.snapshot().errors;
        assert_eq!(errors.not_found, 2);
        assert_eq!(errors.invalid_key, 1);
        assert_eq!(metrics.snapshot().writes, 0);
    }

    #[test]
    fn test_passes_through_results() {
        let (backend, _metrics) = observed();
        backend.write("k", &mut Cursor::new(b"abc")).unwrap();

        let reader = backend.read("k").unwrap();
        assert_eq!(reader.key(), "k");
        assert_eq!(reader.size(), 3);
        assert_eq!(backend.name(), "memory");
    }
}

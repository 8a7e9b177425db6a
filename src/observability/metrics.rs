//! Metrics registry for hoarder
//!
//! - Counters only, monotonic, reset only on process start
//! - Thread-safe, lock-free

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

use crate::blob_store::BlobErrorKind;

/// Metrics registry containing all operational counters
///
/// Relaxed ordering throughout; counters are independent of each other.
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    writes: AtomicU64,
    bytes_written: AtomicU64,
    reads_opened: AtomicU64,
    bytes_read: AtomicU64,
    stats: AtomicU64,
    removals: AtomicU64,
    listings: AtomicU64,
    not_found: AtomicU64,
    invalid_key: AtomicU64,
    medium_failures: AtomicU64,
    stream_failures: AtomicU64,
}

impl MetricsRegistry {
    /// Create a new metrics registry with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a published write of `bytes`
    pub fn record_write(&self, bytes: u64) {
        self.writes.fetch_add(1, Ordering::Relaxed);
        self.bytes_written.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Record an opened read stream
    pub fn increment_reads_opened(&self) {
        self.reads_opened.fetch_add(1, Ordering::Relaxed);
    }

    /// Add bytes served from read streams
    pub fn add_bytes_read(&self, bytes: u64) {
        self.bytes_read.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Record a metadata query
    pub fn increment_stats(&self) {
        self.stats.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a removal
    pub fn increment_removals(&self) {
        self.removals.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a listing
    pub fn increment_listings(&self) {
        self.listings.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a failed operation by kind
    pub fn record_error(&self, kind: BlobErrorKind) {
        let counter = match kind {
            BlobErrorKind::NotFound => &self.not_found,
            BlobErrorKind::InvalidKey => &self.invalid_key,
            BlobErrorKind::MediumFailure => &self.medium_failures,
            BlobErrorKind::StreamFailure => &self.stream_failures,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Get all metrics as a snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            writes: self.writes.load(Ordering::Relaxed),
            bytes_written: self.bytes_written.load(Ordering::Relaxed),
            reads_opened: self.reads_opened.load(Ordering::Relaxed),
            bytes_read: self.bytes_read.load(Ordering::Relaxed),
            stats: self.stats.load(Ordering::Relaxed),
            removals: self.removals.load(Ordering::Relaxed),
            listings: self.listings.load(Ordering::Relaxed),
            errors: ErrorCounts {
                not_found: self.not_found.load(Ordering::Relaxed),
                invalid_key: self.invalid_key.load(Ordering::Relaxed),
                medium_failure: self.medium_failures.load(Ordering::Relaxed),
                stream_failure: self.stream_failures.load(Ordering::Relaxed),
            },
        }
    }
}

/// A point-in-time snapshot of all metrics
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub writes: u64,
    pub bytes_written: u64,
    pub reads_opened: u64,
    pub bytes_read: u64,
    pub stats: u64,
    pub removals: u64,
    pub listings: u64,
    pub errors: ErrorCounts,
}

/// Failed operations, by error kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorCounts {
    pub not_found: u64,
    pub invalid_key: u64,
    pub medium_failure: u64,
    pub stream_failure: u64,
}

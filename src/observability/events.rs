//! Observability events for hoarder
//!
//! Events are explicit and typed; their names are stable.

use std::fmt;

/// Observable events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Lifecycle
    /// Configuration loaded
    ConfigLoaded,
    /// Storage backend constructed
    BackendOpened,
    /// Stale staged writes removed while opening the filesystem backend
    StagingSwept,
    /// HTTP server accepting requests
    Serving,
    /// HTTP server failed to start or crashed
    ServeFailed,

    // Blob operations
    /// A write was published
    BlobWritten,
    /// A read stream was opened
    BlobReadOpened,
    /// A read stream was released
    BlobReadClosed,
    /// Metadata was queried
    BlobStat,
    /// A blob was removed
    BlobRemoved,
    /// The keyspace was listed
    BlobListed,
    /// Any blob operation returned an error
    BlobOperationFailed,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::BackendOpened => "BACKEND_OPENED",
            Event::StagingSwept => "STAGING_SWEPT",
            Event::Serving => "HOARDER_SERVING",
            Event::ServeFailed => "HOARDER_SERVE_FAILED",

            Event::BlobWritten => "BLOB_WRITTEN",
            Event::BlobReadOpened => "BLOB_READ_OPENED",
            Event::BlobReadClosed => "BLOB_READ_CLOSED",
            Event::BlobStat => "BLOB_STAT",
            Event::BlobRemoved => "BLOB_REMOVED",
            Event::BlobListed => "BLOB_LISTED",
            Event::BlobOperationFailed => "BLOB_OPERATION_FAILED",
        }
    }

    /// Returns true if this event indicates a fatal condition
    pub fn is_fatal(&self) -> bool {
        matches!(self, Event::ServeFailed)
    }

    /// Returns true if this event reports a failure
    pub fn is_failure(&self) -> bool {
        matches!(self, Event::BlobOperationFailed | Event::ServeFailed)
    }

    /// Whether the event fires on every request rather than once per process
    pub fn is_per_request(&self) -> bool {
        matches!(
            self,
            Event::BlobReadOpened | Event::BlobReadClosed | Event::BlobStat | Event::BlobListed
        )
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

//! Observability subsystem for hoarder
//!
//! - Structured logging (JSON lines)
//! - Lock-free counters
//! - Typed lifecycle and operation events
//!
//! Observability never changes the outcome of a storage operation: logging
//! failures are swallowed and counters cannot fail.
//!
//! # Usage
//!
//! ```ignore
//! use hoarder::observability::{log_event_with_fields, Event, MetricsRegistry};
//!
//! log_event_with_fields(Event::BlobWritten, &[("key", "a"), ("bytes", "42")]);
//!
//! let metrics = MetricsRegistry::new();
//! metrics.record_write(42);
//! ```

mod events;
mod logger;
mod metrics;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use metrics::{ErrorCounts, MetricsRegistry, MetricsSnapshot};

/// Severity an event is logged at
fn severity_for(event: Event) -> Severity {
    if event.is_fatal() {
        Severity::Fatal
    } else if event.is_failure() {
        Severity::Warn
    } else if event.is_per_request() {
        Severity::Trace
    } else {
        Severity::Info
    }
}

/// Log an event with fields
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    Logger::log(severity_for(event), event.as_str(), fields);
}

//! Observability subsystem for lodedb
//!
//! - Structured logging (JSON lines)
//! - Lifecycle events
//! - Atomic counters
//!
//! Observability is read-only: it never changes what the database does,
//! and the enqueue hot path only ever touches counters.
//!
//! ```ignore
//! use lodedb::observability::{log_event_with_fields, Event, MetricsRegistry};
//!
//! log_event_with_fields(Event::ConfigLoaded, &[("queue_capacity", "1024")]);
//!
//! let metrics = MetricsRegistry::new();
//! metrics.increment_writes_enqueued();
//! ```

mod events;
mod logger;
mod metrics;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use metrics::{MetricsRegistry, MetricsSnapshot};

/// Log a lifecycle event at its own severity
pub fn log_event(event: Event) {
    Logger::log(event.severity(), event.as_str(), &[]);
}

/// Log a lifecycle event with fields
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    Logger::log(event.severity(), event.as_str(), fields);
}

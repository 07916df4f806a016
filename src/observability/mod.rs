//! Observability subsystem for ute
//!
//! This module provides:
//! - Structured logging (JSON lines)
//! - Typed lifecycle events
//! - Codec counters
//!
//! # Principles
//!
//! 1. Observability is read-only
//! 2. No side effects on encoding or decoding results
//! 3. No async or background threads
//! 4. Deterministic output
//!
//! # Usage
//!
//! ```ignore
//! use ute::observability::{Logger, Event, CodecMetrics};
//!
//! Logger::info("SCHEMA_LOADED", &[("versions", "2")]);
//! log_event(Event::SchemaReleased);
//!
//! let metrics = Arc::new(CodecMetrics::new());
//! let encoder = Encoder::new().with_metrics(Arc::clone(&metrics));
//! ```

mod events;
mod logger;
mod metrics;

pub use events::Event;
pub use logger::{Logger, Severity, DEFAULT_MIN_SEVERITY};
pub use metrics::{CodecMetrics, MetricsSnapshot};

/// Log a lifecycle event at its own severity
pub fn log_event(event: Event) {
    Logger::log(event.severity(), event.as_str(), &[]);
}

/// Log a lifecycle event with fields
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    Logger::log(event.severity(), event.as_str(), fields);
}

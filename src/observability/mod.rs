//! Observability for gradeflow
//!
//! - Structured logging (one JSON object per line on stderr)
//! - Counter metrics for promotion cycles
//! - Append-only audit log for cycles and graduation deletions
//!
//! Observability never changes what a cycle does: a failed log or audit
//! write is reported and the cycle carries on.
//!
//! # Usage
//!
//! ```ignore
//! use gradeflow::observability::{Logger, Event, log_event_with_fields};
//!
//! Logger::info("CYCLE_STARTED", &[("max_ordinal", "10")]);
//! log_event_with_fields(Event::StoreOpened, &[("path", "school.json")]);
//! ```

pub mod audit;
mod events;
mod logger;
mod metrics;

pub use audit::{AuditAction, AuditLog, AuditOutcome, AuditRecord, FileAuditLog, MemoryAuditLog};
pub use events::Event;
pub use logger::{Logger, Severity};
pub use metrics::{MetricsRegistry, MetricsSnapshot};

/// Log a process event
pub fn log_event(event: Event) {
    log_event_with_fields(event, &[]);
}

/// Log a process event with fields
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    let severity = if event.is_fatal() {
        Severity::Fatal
    } else {
        Severity::Info
    };
    Logger::log(severity, event.as_str(), fields);
}

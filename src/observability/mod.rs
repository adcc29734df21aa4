//! Observability for motfacet
//!
//! - Structured JSON log lines on stderr
//! - Typed lifecycle events
//! - Scopes that log begin/complete/failed with elapsed time
//!
//! Observability is read-only: logging never fails or alters the operation
//! being observed.
//!
//! ```ignore
//! use motfacet::observability::{log_event_with_fields, Event, ObservationScope};
//!
//! log_event_with_fields(Event::AggregationStart, &[("facets", "2")]);
//!
//! let scope = ObservationScope::with_fields("FACET", &[("facet", "fuel")]);
//! // ... do work ...
//! scope.complete();
//! ```

mod events;
mod logger;
mod scope;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use scope::ObservationScope;

fn severity_of(event: Event) -> Severity {
    if event.is_fatal() {
        Severity::Fatal
    } else if event.is_error() {
        Severity::Error
    } else {
        Severity::Info
    }
}

/// Log a lifecycle event
pub fn log_event(event: Event) {
    Logger::log(severity_of(event), event.as_str(), &[]);
}

/// Log a lifecycle event with fields
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    Logger::log(severity_of(event), event.as_str(), fields);
}

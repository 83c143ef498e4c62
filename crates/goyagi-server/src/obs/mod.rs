//! Observability: statsd metrics, request timing, and error reporting.
//!
//! The metrics client is constructed once and passed explicitly to whatever
//! needs it (application state, middleware); there is no global registry.

pub mod metrics;
pub mod middleware;
pub mod report;
pub mod sink;

pub use metrics::{Metrics, Timer};
pub use middleware::track_requests;
pub use report::{report_errors, ErrorReport, ErrorReporter, LogReporter};
pub use sink::{FailingSink, RecordingSink, StatsdSink, TelemetryError, UdpSink};

//! Error reporting for failed requests.
//!
//! `report_errors` forwards every response whose [`ErrorReport`] marks a server
//! fault to the configured [`ErrorReporter`]. Client errors (4xx) are not
//! reported.

use std::sync::Arc;

use axum::{
    extract::{MatchedPath, Request, State},
    middleware::Next,
    response::Response,
};

/// Error description attached to a response by the error pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorReport {
    pub code: &'static str,
    pub message: String,
    /// The failure is ours, not the caller's (a 5xx).
    pub server_fault: bool,
}

/// A failed request as seen by the reporter.
#[derive(Debug)]
pub struct ErrorEvent<'a> {
    pub method: &'a str,
    pub path: &'a str,
    pub status: u16,
    pub report: &'a ErrorReport,
}

/// Error-tracking collaborator.
pub trait ErrorReporter: Send + Sync {
    fn report(&self, event: &ErrorEvent<'_>);
}

/// Reporter that emits a `tracing` error event per failure.
pub struct LogReporter {
    environment: String,
}

impl LogReporter {
    pub fn new(environment: &str) -> Self {
        Self {
            environment: environment.to_string(),
        }
    }
}

impl ErrorReporter for LogReporter {
    fn report(&self, event: &ErrorEvent<'_>) {
        tracing::error!(
            environment = %self.environment,
            method = %event.method,
            path = %event.path,
            status = event.status,
            code = event.report.code,
            message = %event.report.message,
            "request failed"
        );
    }
}

pub async fn report_errors(
    State(reporter): State<Arc<dyn ErrorReporter>>,
    req: Request,
    next: Next,
) -> Response {
    let method = req.method().to_string();
    let path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());

    let res = next.run(req).await;

    if let Some(report) = res.extensions().get::<ErrorReport>() {
        if report.server_fault {
            reporter.report(&ErrorEvent {
                method: &method,
                path: &path,
                status: res.status().as_u16(),
                report,
            });
        }
    }
    res
}

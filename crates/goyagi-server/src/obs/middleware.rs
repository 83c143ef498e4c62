//! Per-request timing.
//!
//! Every request is bracketed by an `http.request` timer tagged with
//! `method:<VERB>`, `status_code:<CODE>` and `path:<ROUTE>`. The route is the
//! matched template (`/movies/:id`), never the literal URI.
//!
//! The same middleware writes the access log: one `info` event per request with
//! method, route, status and latency.

use std::any::Any;
use std::panic::AssertUnwindSafe;

use axum::{
    extract::{MatchedPath, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use futures_util::FutureExt;

use goyagi_core::GoyagiError;

use crate::error::AppError;
use crate::obs::metrics::Metrics;

pub const REQUEST_TIMER: &str = "http.request";

/// Path tag value for requests that matched no route.
pub const UNMATCHED_PATH: &str = "unmatched";

pub async fn track_requests(State(metrics): State<Metrics>, req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| UNMATCHED_PATH.to_string());
    let method_tag = format!("method:{method}");
    let path_tag = format!("path:{route}");

    let timer = metrics.new_timer(REQUEST_TIMER, &[method_tag.as_str()]);

    // A panicking handler still ends its timer, as a 500.
    let res = match AssertUnwindSafe(next.run(req)).catch_unwind().await {
        Ok(res) => res,
        Err(panic) => {
            let msg = panic_message(panic.as_ref());
            AppError(GoyagiError::Internal(format!("handler panicked: {msg}"))).into_response()
        }
    };

    let status = res.status().as_u16();
    let status_tag = format!("status_code:{status}");
    let latency_ms = timer.end(&[status_tag.as_str(), path_tag.as_str()]);

    tracing::info!(%method, %route, status, latency_ms, "request completed");

    res
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&'static str>() {
        *s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic"
    }
}

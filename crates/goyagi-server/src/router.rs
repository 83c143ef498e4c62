//! Axum router wiring.
//!
//! Every route, including the fallback, runs inside `track_requests`, which in
//! turn runs inside `report_errors`.

use axum::{middleware::from_fn_with_state, Router};

use crate::app_state::AppState;
use crate::obs::{report_errors, track_requests};
use crate::{movies, ops};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(ops::routes())
        .merge(movies::routes())
        .layer(from_fn_with_state(state.metrics().clone(), track_requests))
        .layer(from_fn_with_state(state.reporter(), report_errors))
        .with_state(state)
}

//! Operational HTTP endpoints.
//!
//! - `/health` : liveness

use axum::{http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde_json::json;

use crate::app_state::AppState;

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({ "healthy": true })))
}

pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

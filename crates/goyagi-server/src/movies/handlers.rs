use std::future::Future;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use goyagi_core::error::{GoyagiError, Result};
use goyagi_core::model::{Movie, NewMovie};

use crate::app_state::AppState;
use crate::error::AppError;
use crate::obs::Metrics;

const RESULT_ERROR: &str = "result:error";
const RESULT_SUCCESS: &str = "result:success";

const TIMER_PREFIX: &str = "movies";

pub const DEFAULT_LIMIT: u32 = 20;
pub const MAX_LIMIT: u32 = 100;

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateParams {
    pub title: String,
    pub release_date: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    #[serde(default = "default_limit")]
    pub limit: u32,
    #[serde(default)]
    pub offset: u32,
}

fn default_limit() -> u32 {
    DEFAULT_LIMIT
}

/// Time one store call as `movies.<op>.db`, tagged with its outcome.
async fn timed<T>(metrics: &Metrics, op: &str, call: impl Future<Output = Result<T>>) -> Result<T> {
    let timer = metrics.new_timer(&format!("{TIMER_PREFIX}.{op}.db"), &[]);
    let res = call.await;
    timer.end(&[if res.is_ok() { RESULT_SUCCESS } else { RESULT_ERROR }]);
    res
}

pub async fn create(
    State(app): State<AppState>,
    params: std::result::Result<Json<CreateParams>, JsonRejection>,
) -> std::result::Result<Json<Movie>, AppError> {
    let Json(params) = params.map_err(|e| GoyagiError::BadRequest(e.body_text()))?;

    let title = params.title.trim();
    if title.is_empty() {
        return Err(GoyagiError::BadRequest("title must not be empty".into()).into());
    }

    let movie = NewMovie {
        title: title.to_string(),
        release_date: params.release_date,
    };
    let movie = timed(app.metrics(), "create", app.movies().insert(movie)).await?;

    Ok(Json(movie))
}

pub async fn list(
    State(app): State<AppState>,
    params: std::result::Result<Query<ListParams>, QueryRejection>,
) -> std::result::Result<Json<Vec<Movie>>, AppError> {
    let Query(params) = params.map_err(|e| GoyagiError::BadRequest(e.body_text()))?;

    if !(1..=MAX_LIMIT).contains(&params.limit) {
        return Err(GoyagiError::BadRequest(format!(
            "limit must be between 1 and {MAX_LIMIT}"
        ))
        .into());
    }

    let movies = timed(
        app.metrics(),
        "select",
        app.movies().list(params.limit, params.offset),
    )
    .await?;

    Ok(Json(movies))
}

pub async fn retrieve(
    State(app): State<AppState>,
    id: std::result::Result<Path<i64>, PathRejection>,
) -> std::result::Result<Json<Movie>, AppError> {
    let Path(id) = id.map_err(|e| GoyagiError::BadRequest(e.body_text()))?;

    let movie = timed(app.metrics(), "select", app.movies().find(id))
        .await?
        .ok_or_else(|| GoyagiError::NotFound("movie not found".into()))?;

    Ok(Json(movie))
}

//! Shared fixtures for goyagi-server integration tests.

#![allow(dead_code)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Method, Request},
    response::Response,
    Router,
};

use goyagi_core::error::{GoyagiError, Result};
use goyagi_core::model::{Movie, NewMovie};
use goyagi_server::app_state::AppState;
use goyagi_server::config::{AppConfig, Environment};
use goyagi_server::movies::{MemoryMovieStore, MovieStore};
use goyagi_server::obs::report::{ErrorEvent, ErrorReporter};
use goyagi_server::obs::{Metrics, RecordingSink};
use goyagi_server::router;

/// A reported failure: (method, path, status, code).
pub type Reported = (String, String, u16, String);

#[derive(Default)]
pub struct RecordingReporter {
    events: Mutex<Vec<Reported>>,
}

impl RecordingReporter {
    pub fn events(&self) -> Vec<Reported> {
        self.events.lock().unwrap().clone()
    }
}

impl ErrorReporter for RecordingReporter {
    fn report(&self, event: &ErrorEvent<'_>) {
        self.events.lock().unwrap().push((
            event.method.to_string(),
            event.path.to_string(),
            event.status,
            event.report.code.to_string(),
        ));
    }
}

/// Store whose every call fails.
pub struct BrokenStore;

#[async_trait]
impl MovieStore for BrokenStore {
    async fn insert(&self, _: NewMovie) -> Result<Movie> {
        Err(GoyagiError::Storage("connection refused".into()))
    }
    async fn list(&self, _: u32, _: u32) -> Result<Vec<Movie>> {
        Err(GoyagiError::Storage("connection refused".into()))
    }
    async fn find(&self, _: i64) -> Result<Option<Movie>> {
        Err(GoyagiError::Storage("connection refused".into()))
    }
}

pub struct TestApp {
    pub state: AppState,
    pub router: Router,
    pub sink: Arc<RecordingSink>,
    pub reporter: Arc<RecordingReporter>,
}

pub fn test_app() -> TestApp {
    test_app_with(Arc::new(MemoryMovieStore::new()))
}

pub fn test_app_with(movies: Arc<dyn MovieStore>) -> TestApp {
    let cfg = AppConfig {
        environment: Environment::Test,
        ..AppConfig::default()
    };
    let sink = Arc::new(RecordingSink::new());
    let reporter = Arc::new(RecordingReporter::default());
    let metrics = Metrics::for_environment(sink.clone(), cfg.environment.as_str());

    let state = AppState::new(cfg, metrics, movies, reporter.clone());
    let router = router::build_router(state.clone());

    TestApp {
        state,
        router,
        sink,
        reporter,
    }
}

pub fn request(method: Method, uri: &str, json: Option<&str>) -> Request<Body> {
    let builder = Request::builder().method(method).uri(uri);
    match json {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub async fn body_json(res: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

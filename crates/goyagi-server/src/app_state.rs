//! Shared application state.
//!
//! Built once at startup and cloned into every handler. The metrics client,
//! movie store, and error reporter are passed in explicitly so tests can swap
//! any of them.

use std::sync::Arc;

use goyagi_core::error::{GoyagiError, Result};

use crate::config::AppConfig;
use crate::movies::{self, MovieStore};
use crate::obs::{ErrorReporter, LogReporter, Metrics, UdpSink};

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    cfg: AppConfig,
    metrics: Metrics,
    movies: Arc<dyn MovieStore>,
    reporter: Arc<dyn ErrorReporter>,
}

impl AppState {
    pub fn new(
        cfg: AppConfig,
        metrics: Metrics,
        movies: Arc<dyn MovieStore>,
        reporter: Arc<dyn ErrorReporter>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                cfg,
                metrics,
                movies,
                reporter,
            }),
        }
    }

    /// Build production collaborators from config.
    /// Returns Result so main can handle errors gracefully (no panic).
    pub async fn from_config(cfg: AppConfig) -> Result<Self> {
        let env = cfg.environment.as_str();

        let sink = UdpSink::connect(&cfg.statsd.address()).await.map_err(|e| {
            GoyagiError::Config(format!("statsd {} unreachable: {e}", cfg.statsd.address()))
        })?;
        let metrics = Metrics::for_environment(Arc::new(sink), env);

        let movies = movies::store::open(&cfg).await?;
        let reporter = Arc::new(LogReporter::new(env));

        Ok(Self::new(cfg, metrics, movies, reporter))
    }

    pub fn cfg(&self) -> &AppConfig {
        &self.inner.cfg
    }

    pub fn metrics(&self) -> &Metrics {
        &self.inner.metrics
    }

    pub fn movies(&self) -> &dyn MovieStore {
        self.inner.movies.as_ref()
    }

    pub fn reporter(&self) -> Arc<dyn ErrorReporter> {
        Arc::clone(&self.inner.reporter)
    }
}

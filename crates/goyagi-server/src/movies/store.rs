use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;

use goyagi_core::error::Result;
use goyagi_core::model::{Movie, NewMovie};

use crate::config::{AppConfig, MEMORY_DATABASE_URL};
use crate::movies::sqlite::SqliteMovieStore;

/// Persistence for movies.
#[async_trait]
pub trait MovieStore: Send + Sync {
    async fn insert(&self, movie: NewMovie) -> Result<Movie>;
    /// Newest first.
    async fn list(&self, limit: u32, offset: u32) -> Result<Vec<Movie>>;
    async fn find(&self, id: i64) -> Result<Option<Movie>>;
}

/// Open the store selected by `database.url`.
pub async fn open(cfg: &AppConfig) -> Result<Arc<dyn MovieStore>> {
    let url = cfg.database_url();
    if url == MEMORY_DATABASE_URL {
        tracing::info!("using in-memory movie store");
        return Ok(Arc::new(MemoryMovieStore::new()));
    }
    let store = SqliteMovieStore::connect(url, cfg.database.max_connections).await?;
    Ok(Arc::new(store))
}

/// Process-local store backed by `DashMap`.
pub struct MemoryMovieStore {
    rows: DashMap<i64, Movie>,
    next_id: AtomicI64,
}

impl Default for MemoryMovieStore {
    fn default() -> Self {
        Self {
            rows: DashMap::new(),
            next_id: AtomicI64::new(1),
        }
    }
}

impl MemoryMovieStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MovieStore for MemoryMovieStore {
    async fn insert(&self, movie: NewMovie) -> Result<Movie> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let movie = movie.with_id(id);
        self.rows.insert(id, movie.clone());
        Ok(movie)
    }

    async fn list(&self, limit: u32, offset: u32) -> Result<Vec<Movie>> {
        let mut all: Vec<Movie> = self.rows.iter().map(|r| r.value().clone()).collect();
        all.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(all
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn find(&self, id: i64) -> Result<Option<Movie>> {
        Ok(self.rows.get(&id).map(|r| r.value().clone()))
    }
}

//! SQLite-backed movie store.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

use goyagi_core::error::{GoyagiError, Result};
use goyagi_core::model::{Movie, NewMovie};

use crate::movies::store::MovieStore;

const CREATE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS movies (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    release_date TEXT NOT NULL
)
"#;

type MovieRow = (i64, String, String);

pub struct SqliteMovieStore {
    pool: SqlitePool,
}

impl SqliteMovieStore {
    /// Connect and make sure the `movies` table exists.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        // Every connection to `:memory:` is a separate database.
        let in_memory = url.contains(":memory:");
        let mut options = SqlitePoolOptions::new().max_connections(if in_memory {
            1
        } else {
            max_connections
        });
        if in_memory {
            options = options
                .idle_timeout(None::<Duration>)
                .max_lifetime(None::<Duration>);
        }

        let pool = options.connect(url).await.map_err(storage)?;
        sqlx::query(CREATE_TABLE)
            .execute(&pool)
            .await
            .map_err(storage)?;

        tracing::info!(url, "movie store ready");
        Ok(Self { pool })
    }
}

fn storage(e: sqlx::Error) -> GoyagiError {
    GoyagiError::Storage(e.to_string())
}

fn from_row((id, title, release_date): MovieRow) -> Result<Movie> {
    let release_date = DateTime::parse_from_rfc3339(&release_date)
        .map_err(|e| GoyagiError::Storage(format!("movie {id}: bad release_date: {e}")))?
        .with_timezone(&Utc);
    Ok(Movie {
        id,
        title,
        release_date,
    })
}

#[async_trait]
impl MovieStore for SqliteMovieStore {
    async fn insert(&self, movie: NewMovie) -> Result<Movie> {
        let result = sqlx::query("INSERT INTO movies (title, release_date) VALUES (?, ?)")
            .bind(&movie.title)
            .bind(movie.release_date.to_rfc3339())
            .execute(&self.pool)
            .await
            .map_err(storage)?;
        Ok(movie.with_id(result.last_insert_rowid()))
    }

    async fn list(&self, limit: u32, offset: u32) -> Result<Vec<Movie>> {
        let rows = sqlx::query_as::<_, MovieRow>(
            "SELECT id, title, release_date FROM movies ORDER BY id DESC LIMIT ? OFFSET ?",
        )
        .bind(i64::from(limit))
        .bind(i64::from(offset))
        .fetch_all(&self.pool)
        .await
        .map_err(storage)?;

        rows.into_iter().map(from_row).collect()
    }

    async fn find(&self, id: i64) -> Result<Option<Movie>> {
        let row = sqlx::query_as::<_, MovieRow>(
            "SELECT id, title, release_date FROM movies WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage)?;

        row.map(from_row).transpose()
    }
}

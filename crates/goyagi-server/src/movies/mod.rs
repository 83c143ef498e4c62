//! Movies resource: routes, handlers, and the stores behind them.

pub mod handlers;
pub mod sqlite;
pub mod store;

use axum::{routing::get, Router};

use crate::app_state::AppState;

pub use sqlite::SqliteMovieStore;
pub use store::{MemoryMovieStore, MovieStore};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/movies", get(handlers::list).post(handlers::create))
        .route("/movies/:id", get(handlers::retrieve))
}

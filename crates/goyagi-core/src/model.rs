//! Domain model shared by storage and HTTP layers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A stored movie.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movie {
    pub id: i64,
    pub title: String,
    pub release_date: DateTime<Utc>,
}

/// A movie that has not been assigned an id yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMovie {
    pub title: String,
    pub release_date: DateTime<Utc>,
}

impl NewMovie {
    pub fn with_id(self, id: i64) -> Movie {
        Movie {
            id,
            title: self.title,
            release_date: self.release_date,
        }
    }
}

//! Connection pool bootstrap, grounded in the teacher's
//! `SqliteSessionStore::new` — pool creation plus schema migration up front,
//! a single store backend rather than the teacher's optional postgres twin.

use crate::Result;
use sqlx::SqlitePool;
use sqlx::sqlite::SqliteConnectOptions;
use std::str::FromStr;

#[derive(Clone)]
pub struct Storage {
    pub(crate) pool: SqlitePool,
}

impl Storage {
    pub async fn connect(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePool::connect_with(options).await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    /// Build a store over an existing pool (used by tests with an
    /// in-memory sqlite database).
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

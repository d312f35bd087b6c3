pub mod locks;
pub mod migrate;
pub mod outcome;
pub mod repo;
pub mod seed;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;

pub use outcome::WriteOutcome;

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error(transparent)]
    Document(#[from] anistore_core::DocumentError),
    #[error("password hash error: {0}")]
    Hash(String),
}

pub const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Create a SQLite connection pool with WAL mode enabled.
pub async fn connect(db_path: &str) -> Result<SqlitePool, sqlx::Error> {
    connect_with(db_path, DEFAULT_MAX_CONNECTIONS).await
}

pub async fn connect_with(db_path: &str, max_connections: u32) -> Result<SqlitePool, sqlx::Error> {
    // Ensure parent directory exists
    if let Some(parent) = Path::new(db_path).parent() {
        std::fs::create_dir_all(parent).ok();
    }

    let opts = SqliteConnectOptions::from_str(db_path)?
        .create_if_missing(true)
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal);

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections.max(1))
        .connect_with(opts)
        .await?;

    Ok(pool)
}

/// Record store handle: the shared pool plus the per-user write locks that
/// serialise read-modify-write sequences on embedded user lists.
#[derive(Debug, Clone)]
pub struct Store {
    pool: SqlitePool,
    user_locks: locks::KeyedLocks<i64>,
}

impl Store {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            user_locks: locks::KeyedLocks::new(),
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub(crate) fn user_locks(&self) -> &locks::KeyedLocks<i64> {
        &self.user_locks
    }
}

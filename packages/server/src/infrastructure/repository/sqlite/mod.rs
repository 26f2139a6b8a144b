//! SQLite Repository 実装
//!
//! sqlx の `SqlitePool` を共有し、図形・メンバーシップ・チャットの
//! 3 つのストアを提供します。スキーマは起動時に `CREATE TABLE IF NOT EXISTS`
//! で用意します。

mod chat;
mod membership;
mod shape;

pub use chat::SqliteChatRepository;
pub use membership::SqliteMembershipRepository;
pub use shape::SqliteShapeRepository;

use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use thiserror::Error;
use tracing::info;

use crate::domain::RepositoryError;

static MEMDB_COUNTER: AtomicU64 = AtomicU64::new(0);

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS shapes (
        seq         INTEGER PRIMARY KEY AUTOINCREMENT,
        id          TEXT NOT NULL UNIQUE,
        room_id     TEXT NOT NULL,
        creator_id  TEXT NOT NULL,
        payload     TEXT NOT NULL,
        created_at  INTEGER NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_shapes_room ON shapes (room_id, seq)",
    r#"
    CREATE TABLE IF NOT EXISTS room_members (
        user_id  TEXT NOT NULL,
        room_id  TEXT NOT NULL,
        role     TEXT NOT NULL,
        PRIMARY KEY (user_id, room_id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS chat_messages (
        seq         INTEGER PRIMARY KEY AUTOINCREMENT,
        id          TEXT NOT NULL UNIQUE,
        room_id     TEXT NOT NULL,
        user_id     TEXT NOT NULL,
        body        TEXT NOT NULL,
        created_at  INTEGER NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_chat_messages_room ON chat_messages (room_id, seq)",
];

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("invalid database url '{url}': {source}")]
    InvalidUrl { url: String, source: sqlx::Error },
}

/// Database handle with connection pool.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

    /// Connect to `url` (e.g. `sqlite://kokuban.db`) and prepare the schema.
    pub async fn connect(url: &str) -> Result<Self, DbError> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|source| DbError::InvalidUrl {
                url: url.to_string(),
                source,
            })?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Self::ACQUIRE_TIMEOUT)
            .connect_with(options)
            .await?;

        info!(url = %url, "Database connected");
        Self::with_pool(pool).await
    }

    /// Private in-memory database, unique per call.
    pub async fn in_memory() -> Result<Self, DbError> {
        // Named shared-cache memdb so parallel tests never collide.
        let id = MEMDB_COUNTER.fetch_add(1, Ordering::Relaxed);
        let memdb_uri = format!(
            "file:kokuban-memdb-{}-{}?mode=memory&cache=shared",
            std::process::id(),
            id
        );
        let options = SqliteConnectOptions::new()
            .filename(&memdb_uri)
            .shared_cache(true)
            .create_if_missing(true);

        // A memdb vanishes with its last connection.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .acquire_timeout(Self::ACQUIRE_TIMEOUT)
            .connect_with(options)
            .await?;

        Self::with_pool(pool).await
    }

    async fn with_pool(pool: SqlitePool) -> Result<Self, DbError> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&pool).await?;
        }
        info!("Database schema checked/applied");
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn shapes(&self) -> SqliteShapeRepository {
        SqliteShapeRepository::new(self.pool.clone())
    }

    pub fn memberships(&self) -> SqliteMembershipRepository {
        SqliteMembershipRepository::new(self.pool.clone())
    }

    pub fn chats(&self) -> SqliteChatRepository {
        SqliteChatRepository::new(self.pool.clone())
    }
}

/// Map a sqlx failure on the record `id` to the domain error.
fn map_sqlx_error(err: sqlx::Error, id: impl ToString) -> RepositoryError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            RepositoryError::Conflict(id.to_string())
        }
        sqlx::Error::RowNotFound => RepositoryError::NotFound(id.to_string()),
        _ => RepositoryError::Storage(err.to_string()),
    }
}

/// A stored column that no longer decodes into its domain type.
fn corrupt(column: &str, err: impl std::fmt::Display) -> RepositoryError {
    RepositoryError::Storage(format!("corrupt {column}: {err}"))
}

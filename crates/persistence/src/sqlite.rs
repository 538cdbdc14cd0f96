//! SQLite-backed document store.

use crate::{Collection, DocumentStore, StoreError};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info};

/// Create the directory that will hold the database file named by `url`.
/// In-memory URLs and bare file names need nothing.
pub fn ensure_parent_dir(url: &str) -> std::io::Result<()> {
    let Some(path) = url.strip_prefix("sqlite://").or_else(|| url.strip_prefix("sqlite:")) else {
        return Ok(());
    };
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() || path.starts_with(":memory:") {
        return Ok(());
    }
    match Path::new(path).parent() {
        Some(parent) if !parent.as_os_str().is_empty() => std::fs::create_dir_all(parent),
        _ => Ok(()),
    }
}

/// Open (creating if needed) the database at `url` and ensure the schema exists.
pub async fn init_db(url: &str) -> Result<SqlitePool, StoreError> {
    ensure_parent_dir(url)?;
    let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await?;
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS documents (
            collection TEXT NOT NULL,
            id TEXT NOT NULL,
            body TEXT NOT NULL,
            PRIMARY KEY (collection, id)
        )",
    )
    .execute(&pool)
    .await?;
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS saves (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            note TEXT,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )",
    )
    .execute(&pool)
    .await?;
    info!(url, "database ready");
    Ok(pool)
}

/// Register a named save slot and return its row id.
pub async fn create_save(pool: &SqlitePool, name: &str, note: Option<&str>) -> Result<i64, StoreError> {
    let res = sqlx::query("INSERT INTO saves (name, note) VALUES (?, ?)")
        .bind(name)
        .bind(note)
        .execute(pool)
        .await?;
    Ok(res.last_insert_rowid())
}

#[derive(Clone, Debug)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        Ok(Self {
            pool: init_db(url).await?,
        })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl DocumentStore for SqliteStore {
    async fn upsert_raw(&mut self, collection: Collection, id: &str, body: String) -> Result<(), StoreError> {
        if id.is_empty() {
            return Err(StoreError::EmptyId);
        }
        sqlx::query(
            "INSERT INTO documents (collection, id, body) VALUES (?, ?, ?)
             ON CONFLICT(collection, id) DO UPDATE SET body = excluded.body",
        )
        .bind(collection.name())
        .bind(id)
        .bind(body)
        .execute(&self.pool)
        .await?;
        debug!(collection = collection.name(), id, "document upserted");
        Ok(())
    }

    async fn find_raw(&self, collection: Collection, id: &str) -> Result<Option<String>, StoreError> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT body FROM documents WHERE collection = ? AND id = ?")
                .bind(collection.name())
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(|(body,)| body))
    }
}

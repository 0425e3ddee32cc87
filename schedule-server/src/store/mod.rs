//! Persistence for the transit schedule.
//!
//! Every operation takes the connection it runs on as an explicit argument.
//! Callers acquire one connection per request from [`Database`] and the pool
//! takes it back when the handle is dropped, on success and failure alike.
//! Multi-statement writes open a transaction on that connection; a
//! transaction dropped without commit is rolled back.

pub mod brigades;
pub mod companies;
pub mod departures;
pub mod line_stops;
pub mod lines;
pub mod stops;
pub mod timetable;
pub mod trips;
pub mod types_of_days;

#[cfg(test)]
pub(crate) mod fixtures;

use std::str::FromStr;
use std::time::Duration;

use sqlx::pool::PoolConnection;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use sqlx::Sqlite;
use tracing::info;

use crate::error::StoreError;

/// Schema applied on every start; all statements are idempotent.
const SCHEMA: &str = include_str!("schema.sql");

/// A pooled connection scoped to one request.
pub type Conn = PoolConnection<Sqlite>;

/// Handle to the schedule database.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open the database at `url`, creating the file and schema if needed.
    ///
    /// In-memory databases live inside a single connection, so the pool is
    /// pinned to one connection that is never recycled.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(StoreError::during("parsing database url"))?
            .foreign_keys(true);

        let pool = if url.contains(":memory:") {
            memory_pool(options).await?
        } else {
            SqlitePoolOptions::new()
                .max_connections(max_connections)
                .connect_with(
                    options
                        .create_if_missing(true)
                        .journal_mode(SqliteJournalMode::Wal),
                )
                .await
                .map_err(StoreError::during("opening database"))?
        };

        let db = Self { pool };
        db.migrate().await?;
        info!(url, "schedule database ready");
        Ok(db)
    }

    /// A fresh, empty in-memory database.
    pub async fn in_memory() -> Result<Self, StoreError> {
        Self::connect("sqlite::memory:", 1).await
    }

    /// Acquire a connection for the duration of one request.
    pub async fn acquire(&self) -> Result<Conn, StoreError> {
        self.pool
            .acquire()
            .await
            .map_err(StoreError::during("acquiring connection"))
    }

    /// Close every pooled connection.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::raw_sql(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(StoreError::during("applying schema"))?;
        Ok(())
    }
}

async fn memory_pool(options: SqliteConnectOptions) -> Result<SqlitePool, StoreError> {
    SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None::<Duration>)
        .max_lifetime(None::<Duration>)
        .connect_with(options)
        .await
        .map_err(StoreError::during("opening in-memory database"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn in_memory_has_schema() {
        let db = Database::in_memory().await.unwrap();
        let mut conn = db.acquire().await.unwrap();

        assert!(stops::list(&mut conn).await.unwrap().is_empty());
        assert_eq!(trips::max_id(&mut conn).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn schema_is_idempotent() {
        let db = Database::in_memory().await.unwrap();
        db.migrate().await.unwrap();
    }

    #[tokio::test]
    async fn file_database_persists_across_pools() {
        let dir = tempdir().unwrap();
        let url = format!("sqlite://{}", dir.path().join("schedule.db").display());

        {
            let db = Database::connect(&url, 2).await.unwrap();
            let mut conn = db.acquire().await.unwrap();
            stops::create(&mut conn, "Dworzec").await.unwrap();
            drop(conn);
            db.close().await;
        }

        let db = Database::connect(&url, 2).await.unwrap();
        let mut conn = db.acquire().await.unwrap();
        let all = stops::list(&mut conn).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].name, "Dworzec");
    }

    #[tokio::test]
    async fn in_memory_databases_are_isolated() {
        let a = Database::in_memory().await.unwrap();
        let b = Database::in_memory().await.unwrap();

        stops::create(&mut a.acquire().await.unwrap(), "Rynek")
            .await
            .unwrap();

        assert!(stops::list(&mut b.acquire().await.unwrap())
            .await
            .unwrap()
            .is_empty());
    }
}

//! Database access layer.
//!
//! Each domain gets a repository struct that borrows the pool and exposes
//! query methods. Queries are runtime-checked (`sqlx::query` /
//! `sqlx::query_as`), so no database is needed at compile time.

use std::str::FromStr;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use sqlx::migrate::Migrator;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use thiserror::Error;

pub mod accounts;
pub mod admin;
pub mod cart;
pub mod newsletter;
pub mod orders;
pub mod outbox;
pub mod products;

pub use accounts::AccountRepository;
pub use admin::AdminRepository;
pub use cart::CartRepository;
pub use newsletter::NewsletterRepository;
pub use orders::OrderRepository;
pub use outbox::OutboxRepository;
pub use products::ProductRepository;

/// Embedded migrations from `crates/server/migrations/`.
pub static MIGRATOR: Migrator = sqlx::migrate!();

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database query failed
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in database is invalid/corrupted
    #[error("Data corruption: {0}")]
    DataCorruption(String),

    /// Entity not found
    #[error("Entity not found")]
    NotFound,

    /// Unique constraint violation
    #[error("Conflict: {0}")]
    Conflict(String),
}

/// Open a `SQLite` pool for the given connection URL.
///
/// The database file is created if missing. WAL mode keeps readers from
/// blocking the writer; a single connection serializes writes, which is
/// all `SQLite` supports anyway.
///
/// # Errors
///
/// Returns `sqlx::Error` if the URL is malformed or the connection fails.
pub async fn create_pool(database_url: &SecretString) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url.expose_secret())?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .foreign_keys(true)
        .busy_timeout(Duration::from_secs(5));

    SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
}

/// In-memory pool with migrations applied, for unit tests.
///
/// A single never-recycled connection keeps the in-memory database alive
/// for the life of the pool.
#[cfg(test)]
pub(crate) async fn test_pool() -> SqlitePool {
    #[allow(clippy::unwrap_used)]
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .unwrap()
        .foreign_keys(true);

    #[allow(clippy::unwrap_used)]
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .unwrap();

    #[allow(clippy::unwrap_used)]
    MIGRATOR.run(&pool).await.unwrap();

    pool
}

//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! threadbare-cli migrate
//! ```
//!
//! # Environment Variables
//!
//! - `THREADBARE_DATABASE_URL` - `SQLite` connection string (falls back to
//!   `DATABASE_URL`)
//!
//! Migrations are embedded at compile time from `crates/server/migrations/`,
//! so the binary carries everything it needs.

use secrecy::SecretString;
use thiserror::Error;

use threadbare_server::db;

/// Errors that can occur while running migrations.
#[derive(Debug, Error)]
pub enum MigrateError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration error.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Run all pending database migrations.
pub async fn run() -> Result<(), MigrateError> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("THREADBARE_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| MigrateError::MissingEnvVar("THREADBARE_DATABASE_URL"))?;

    tracing::info!("Connecting to database...");
    let pool = db::create_pool(&database_url).await?;

    tracing::info!("Running migrations...");
    db::MIGRATOR.run(&pool).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}

//! Admin seat inspection commands.
//!
//! Threadbare has exactly one admin seat, claimed in-app by the first
//! authenticated account that asks for it. There is no CLI path that
//! creates an admin directly; this module only reports the seat's state.
//!
//! # Usage
//!
//! ```bash
//! threadbare-cli admin status
//! ```
//!
//! # Environment Variables
//!
//! - `THREADBARE_DATABASE_URL` - `SQLite` connection string (falls back to
//!   `DATABASE_URL`)

use secrecy::SecretString;
use thiserror::Error;

use threadbare_server::db::{self, AccountRepository, AdminRepository, RepositoryError};

/// Errors that can occur during admin seat inspection.
#[derive(Debug, Error)]
pub enum AdminError {
    /// Required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    /// Repository error.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Report whether the admin seat has been claimed, and by whom.
pub async fn status() -> Result<(), AdminError> {
    dotenvy::dotenv().ok();

    let database_url = std::env::var("THREADBARE_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| AdminError::MissingEnvVar("THREADBARE_DATABASE_URL"))?;

    tracing::info!("Connecting to database...");
    let pool = db::create_pool(&database_url).await?;

    let Some(marker) = AdminRepository::new(&pool).get_marker().await? else {
        tracing::info!("Admin seat is unclaimed");
        tracing::info!("The first account to call POST /api/admin/claim becomes the admin.");
        return Ok(());
    };

    match AccountRepository::new(&pool).get(marker.account_id).await? {
        Some(account) => {
            tracing::info!("Admin seat is claimed");
            tracing::info!("  Email: {}", account.email);
            tracing::info!("  Claimed at: {}", marker.claimed_at);
        }
        None => {
            tracing::warn!(
                "Admin marker references a missing account: {}",
                marker.account_id
            );
        }
    }

    Ok(())
}

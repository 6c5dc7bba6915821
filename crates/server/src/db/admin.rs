//! Admin marker repository.
//!
//! The store has a single admin: the first account to claim the marker.
//! The marker table's primary key is a constant, so concurrent claims
//! collapse into one insert winning and the rest hitting a unique
//! violation.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use threadbare_core::AccountId;

use super::RepositoryError;
use crate::models::AdminMarker;

#[derive(sqlx::FromRow)]
struct AdminMarkerRow {
    account_id: String,
    claimed_at: DateTime<Utc>,
}

impl TryFrom<AdminMarkerRow> for AdminMarker {
    type Error = RepositoryError;

    fn try_from(row: AdminMarkerRow) -> Result<Self, Self::Error> {
        let account_id = row.account_id.parse::<AccountId>().map_err(|e| {
            RepositoryError::DataCorruption(format!("admin account id {:?}: {e}", row.account_id))
        })?;

        Ok(Self {
            account_id,
            claimed_at: row.claimed_at,
        })
    }
}

/// Repository for the admin marker.
pub struct AdminRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> AdminRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Claim the admin marker for an account.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if an admin already exists.
    pub async fn claim(&self, account_id: AccountId) -> Result<AdminMarker, RepositoryError> {
        let now = Utc::now();

        sqlx::query("INSERT INTO admin_marker (singleton, account_id, claimed_at) VALUES (1, ?1, ?2)")
            .bind(account_id.to_string())
            .bind(now)
            .execute(self.pool)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(ref db_err) = e
                    && db_err.is_unique_violation()
                {
                    RepositoryError::Conflict("Admin already exists".to_string())
                } else {
                    RepositoryError::Database(e)
                }
            })?;

        Ok(AdminMarker {
            account_id,
            claimed_at: now,
        })
    }

    /// Whether any account has claimed the marker.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn has_admin(&self) -> Result<bool, RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM admin_marker")
            .fetch_one(self.pool)
            .await?;
        Ok(count > 0)
    }

    /// Whether this specific account is the admin.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn is_admin(&self, account_id: AccountId) -> Result<bool, RepositoryError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM admin_marker WHERE account_id = ?1")
                .bind(account_id.to_string())
                .fetch_one(self.pool)
                .await?;
        Ok(count > 0)
    }

    /// Fetch the marker, if claimed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_marker(&self) -> Result<Option<AdminMarker>, RepositoryError> {
        let row = sqlx::query_as::<_, AdminMarkerRow>(
            "SELECT account_id, claimed_at FROM admin_marker WHERE singleton = 1",
        )
        .fetch_optional(self.pool)
        .await?;

        row.map(AdminMarker::try_from).transpose()
    }
}

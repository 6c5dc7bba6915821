//! Account repository.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use threadbare_core::{AccountId, Email};

use super::RepositoryError;
use crate::models::Account;

/// Account joined with its password hash, for credential checks only.
pub struct AccountWithPassword {
    pub account: Account,
    pub password_hash: String,
}

#[derive(sqlx::FromRow)]
struct AccountRow {
    id: String,
    email: String,
    password_hash: String,
    created_at: DateTime<Utc>,
}

impl AccountRow {
    fn into_parts(self) -> Result<AccountWithPassword, RepositoryError> {
        let id = self
            .id
            .parse::<AccountId>()
            .map_err(|e| RepositoryError::DataCorruption(format!("account id {:?}: {e}", self.id)))?;

        Ok(AccountWithPassword {
            account: Account {
                id,
                email: self.email,
                created_at: self.created_at,
            },
            password_hash: self.password_hash,
        })
    }
}

/// Repository for account operations.
pub struct AccountRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> AccountRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new account with a pre-hashed password.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email is already registered.
    pub async fn create(
        &self,
        email: &Email,
        password_hash: &str,
    ) -> Result<Account, RepositoryError> {
        let id = AccountId::new();
        let now = Utc::now();

        sqlx::query(
            r"
            INSERT INTO accounts (id, email, password_hash, created_at)
            VALUES (?1, ?2, ?3, ?4)
            ",
        )
        .bind(id.to_string())
        .bind(email.as_str())
        .bind(password_hash)
        .bind(now)
        .execute(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_unique_violation()
            {
                RepositoryError::Conflict("Account already exists".to_string())
            } else {
                RepositoryError::Database(e)
            }
        })?;

        Ok(Account {
            id,
            email: email.as_str().to_string(),
            created_at: now,
        })
    }

    /// Look up an account and its password hash by email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_by_email(
        &self,
        email: &str,
    ) -> Result<Option<AccountWithPassword>, RepositoryError> {
        let row = sqlx::query_as::<_, AccountRow>(
            "SELECT id, email, password_hash, created_at FROM accounts WHERE email = ?1",
        )
        .bind(email)
        .fetch_optional(self.pool)
        .await?;

        row.map(AccountRow::into_parts).transpose()
    }

    /// Fetch an account by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: AccountId) -> Result<Option<Account>, RepositoryError> {
        let row = sqlx::query_as::<_, AccountRow>(
            "SELECT id, email, password_hash, created_at FROM accounts WHERE id = ?1",
        )
        .bind(id.to_string())
        .fetch_optional(self.pool)
        .await?;

        row.map(|r| r.into_parts().map(|p| p.account)).transpose()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    #[tokio::test]
    async fn test_create_and_find_by_email() {
        let pool = test_pool().await;
        let repo = AccountRepository::new(&pool);

        let email = Email::parse("shopper@example.com").unwrap();
        let created = repo.create(&email, "hashed_password").await.unwrap();

        let found = repo
            .find_by_email("shopper@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.account.id, created.id);
        assert_eq!(found.account.email, "shopper@example.com");
        assert_eq!(found.password_hash, "hashed_password");
    }

    #[tokio::test]
    async fn test_find_by_email_missing() {
        let pool = test_pool().await;
        let repo = AccountRepository::new(&pool);

        let found = repo.find_by_email("nobody@example.com").await.unwrap();
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let pool = test_pool().await;
        let repo = AccountRepository::new(&pool);

        let email = Email::parse("dupe@example.com").unwrap();
        repo.create(&email, "hash_one").await.unwrap();
        let second = repo.create(&email, "hash_two").await;

        assert!(matches!(second, Err(RepositoryError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_get_by_id() {
        let pool = test_pool().await;
        let repo = AccountRepository::new(&pool);

        let email = Email::parse("byid@example.com").unwrap();
        let created = repo.create(&email, "hash").await.unwrap();

        let fetched = repo.get(created.id).await.unwrap().unwrap();
        assert_eq!(fetched.email, "byid@example.com");

        assert!(repo.get(AccountId::new()).await.unwrap().is_none());
    }
}

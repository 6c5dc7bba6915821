//! Newsletter subscriber repository.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use threadbare_core::{Email, SubscriberId};

use super::RepositoryError;
use crate::models::Subscriber;

#[derive(sqlx::FromRow)]
struct SubscriberRow {
    id: String,
    email: String,
    subscribed_at: DateTime<Utc>,
}

impl TryFrom<SubscriberRow> for Subscriber {
    type Error = RepositoryError;

    fn try_from(row: SubscriberRow) -> Result<Self, Self::Error> {
        let id = row.id.parse::<SubscriberId>().map_err(|e| {
            RepositoryError::DataCorruption(format!("subscriber id {:?}: {e}", row.id))
        })?;

        Ok(Self {
            id,
            email: row.email,
            subscribed_at: row.subscribed_at,
        })
    }
}

/// Repository for newsletter subscriptions.
pub struct NewsletterRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> NewsletterRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Subscribe an email address.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email is already
    /// subscribed.
    pub async fn subscribe(&self, email: &Email) -> Result<Subscriber, RepositoryError> {
        let id = SubscriberId::new();
        let now = Utc::now();

        sqlx::query("INSERT INTO newsletter_subscribers (id, email, subscribed_at) VALUES (?1, ?2, ?3)")
            .bind(id.to_string())
            .bind(email.as_str())
            .bind(now)
            .execute(self.pool)
            .await
            .map_err(|e| {
                if let sqlx::Error::Database(ref db_err) = e
                    && db_err.is_unique_violation()
                {
                    RepositoryError::Conflict("Email already subscribed".to_string())
                } else {
                    RepositoryError::Database(e)
                }
            })?;

        Ok(Subscriber {
            id,
            email: email.as_str().to_string(),
            subscribed_at: now,
        })
    }

    /// List subscribers, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<Subscriber>, RepositoryError> {
        let rows = sqlx::query_as::<_, SubscriberRow>(
            r"
            SELECT id, email, subscribed_at
            FROM newsletter_subscribers
            ORDER BY subscribed_at DESC, id DESC
            ",
        )
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Subscriber::try_from).collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    #[tokio::test]
    async fn test_subscribe_and_list() {
        let pool = test_pool().await;
        let repo = NewsletterRepository::new(&pool);

        let email = Email::parse("fan@example.com").unwrap();
        let subscriber = repo.subscribe(&email).await.unwrap();
        assert_eq!(subscriber.email, "fan@example.com");

        let all = repo.list_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, subscriber.id);
    }

    #[tokio::test]
    async fn test_duplicate_subscribe_conflicts_once() {
        let pool = test_pool().await;
        let repo = NewsletterRepository::new(&pool);

        let email = Email::parse("once@example.com").unwrap();
        repo.subscribe(&email).await.unwrap();

        let second = repo.subscribe(&email).await;
        match second {
            Err(RepositoryError::Conflict(msg)) => {
                assert_eq!(msg, "Email already subscribed");
            }
            other => panic!("expected conflict, got {other:?}"),
        }

        // Exactly one row survives
        assert_eq!(repo.list_all().await.unwrap().len(), 1);
    }
}

//! Notification outbox repository.
//!
//! Jobs are enqueued inside the order-creation transaction and consumed
//! by a single background worker, so claiming needs no row locking.
//! Delivery is at-least-once: a crash after the SMTP send but before
//! `mark_sent` redelivers on restart.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use threadbare_core::{NotificationJobId, OrderId};

use super::RepositoryError;
use crate::models::{JobStatus, NotificationJob};

#[derive(sqlx::FromRow)]
struct JobRow {
    id: String,
    order_id: String,
    status: String,
    attempts: i64,
    last_error: Option<String>,
    created_at: DateTime<Utc>,
    sent_at: Option<DateTime<Utc>>,
}

impl TryFrom<JobRow> for NotificationJob {
    type Error = RepositoryError;

    fn try_from(row: JobRow) -> Result<Self, Self::Error> {
        let id = row
            .id
            .parse::<NotificationJobId>()
            .map_err(|e| RepositoryError::DataCorruption(format!("job id {:?}: {e}", row.id)))?;
        let order_id = row.order_id.parse::<OrderId>().map_err(|e| {
            RepositoryError::DataCorruption(format!("job order id {:?}: {e}", row.order_id))
        })?;
        let status = row
            .status
            .parse::<JobStatus>()
            .map_err(RepositoryError::DataCorruption)?;

        Ok(Self {
            id,
            order_id,
            status,
            attempts: row.attempts,
            last_error: row.last_error,
            created_at: row.created_at,
            sent_at: row.sent_at,
        })
    }
}

const JOB_COLUMNS: &str = "id, order_id, status, attempts, last_error, created_at, sent_at";

/// Repository for notification outbox jobs.
pub struct OutboxRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> OutboxRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Fetch pending jobs still under the attempt cap, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn pending_batch(
        &self,
        max_attempts: u32,
        limit: u32,
    ) -> Result<Vec<NotificationJob>, RepositoryError> {
        let rows = sqlx::query_as::<_, JobRow>(&format!(
            r"
            SELECT {JOB_COLUMNS}
            FROM notification_outbox
            WHERE status = 'pending' AND attempts < ?1
            ORDER BY created_at ASC
            LIMIT ?2
            "
        ))
        .bind(i64::from(max_attempts))
        .bind(i64::from(limit))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(NotificationJob::try_from).collect()
    }

    /// Record a successful delivery.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the job does not exist.
    pub async fn mark_sent(&self, id: NotificationJobId) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE notification_outbox
            SET status = 'sent', attempts = attempts + 1, last_error = NULL, sent_at = ?2
            WHERE id = ?1
            ",
        )
        .bind(id.to_string())
        .bind(Utc::now())
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Record a failed delivery attempt.
    ///
    /// The job stays pending for a retry until it has burned
    /// `max_attempts` tries, then it is parked as failed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the job does not exist.
    pub async fn record_failure(
        &self,
        id: NotificationJobId,
        error: &str,
        max_attempts: u32,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE notification_outbox
            SET attempts = attempts + 1,
                last_error = ?2,
                status = CASE WHEN attempts + 1 >= ?3 THEN 'failed' ELSE 'pending' END
            WHERE id = ?1
            ",
        )
        .bind(id.to_string())
        .bind(error)
        .bind(i64::from(max_attempts))
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Park a job as failed immediately, with no further retries.
    ///
    /// Used when the job can never succeed, e.g. its order row is gone.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the job does not exist.
    pub async fn mark_failed(
        &self,
        id: NotificationJobId,
        error: &str,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE notification_outbox
            SET status = 'failed', attempts = attempts + 1, last_error = ?2
            WHERE id = ?1
            ",
        )
        .bind(id.to_string())
        .bind(error)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// List the jobs for one order, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_order(
        &self,
        order_id: OrderId,
    ) -> Result<Vec<NotificationJob>, RepositoryError> {
        let rows = sqlx::query_as::<_, JobRow>(&format!(
            "SELECT {JOB_COLUMNS} FROM notification_outbox WHERE order_id = ?1 ORDER BY created_at ASC"
        ))
        .bind(order_id.to_string())
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(NotificationJob::try_from).collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::orders::{NewOrder, OrderRepository};
    use crate::db::test_pool;
    use threadbare_core::{Price, ProductId};

    async fn make_order(pool: &SqlitePool) -> OrderId {
        OrderRepository::new(pool)
            .create(NewOrder {
                owner: None,
                customer_name: "Grace Hopper".to_string(),
                customer_email: "grace@example.com".to_string(),
                customer_phone: "+1-555-0199".to_string(),
                customer_address: "1 Compiler Court".to_string(),
                items: vec![crate::models::OrderItem {
                    product_id: ProductId::new(),
                    product_name: "Classic White Tee".to_string(),
                    price: Price::parse("15.00").unwrap(),
                    quantity: 1,
                }],
                total_amount: Price::parse("15.00").unwrap(),
            })
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn test_pending_batch_and_mark_sent() {
        let pool = test_pool().await;
        let repo = OutboxRepository::new(&pool);
        let order_id = make_order(&pool).await;

        let batch = repo.pending_batch(5, 10).await.unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].order_id, order_id);

        repo.mark_sent(batch[0].id).await.unwrap();

        assert!(repo.pending_batch(5, 10).await.unwrap().is_empty());
        let jobs = repo.list_for_order(order_id).await.unwrap();
        assert_eq!(jobs[0].status, JobStatus::Sent);
        assert_eq!(jobs[0].attempts, 1);
        assert!(jobs[0].sent_at.is_some());
    }

    #[tokio::test]
    async fn test_record_failure_retries_until_cap() {
        let pool = test_pool().await;
        let repo = OutboxRepository::new(&pool);
        let order_id = make_order(&pool).await;

        let batch = repo.pending_batch(3, 10).await.unwrap();
        let job_id = batch[0].id;

        repo.record_failure(job_id, "smtp timeout", 3).await.unwrap();
        repo.record_failure(job_id, "smtp timeout", 3).await.unwrap();

        // Two failures in, the job is still eligible
        assert_eq!(repo.pending_batch(3, 10).await.unwrap().len(), 1);

        repo.record_failure(job_id, "smtp timeout", 3).await.unwrap();

        // Third failure parks it
        assert!(repo.pending_batch(3, 10).await.unwrap().is_empty());
        let jobs = repo.list_for_order(order_id).await.unwrap();
        assert_eq!(jobs[0].status, JobStatus::Failed);
        assert_eq!(jobs[0].attempts, 3);
        assert_eq!(jobs[0].last_error.as_deref(), Some("smtp timeout"));
    }

    #[tokio::test]
    async fn test_mark_failed_parks_immediately() {
        let pool = test_pool().await;
        let repo = OutboxRepository::new(&pool);
        let order_id = make_order(&pool).await;

        let batch = repo.pending_batch(5, 10).await.unwrap();
        repo.mark_failed(batch[0].id, "order missing").await.unwrap();

        assert!(repo.pending_batch(5, 10).await.unwrap().is_empty());
        let jobs = repo.list_for_order(order_id).await.unwrap();
        assert_eq!(jobs[0].status, JobStatus::Failed);
    }

    #[tokio::test]
    async fn test_pending_batch_oldest_first() {
        let pool = test_pool().await;
        let repo = OutboxRepository::new(&pool);
        let first_order = make_order(&pool).await;
        let second_order = make_order(&pool).await;

        let batch = repo.pending_batch(5, 10).await.unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch[0].order_id, first_order);
        assert_eq!(batch[1].order_id, second_order);

        let capped = repo.pending_batch(5, 1).await.unwrap();
        assert_eq!(capped.len(), 1);
    }
}

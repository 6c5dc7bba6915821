//! Notification outbox worker.
//!
//! A single background task drains pending confirmation jobs. It wakes on
//! a nudge from checkout or on a poll tick, whichever comes first, so
//! fresh orders go out immediately while crashed-over jobs still get
//! picked up.

use tokio::task::JoinHandle;
use tracing::instrument;

use crate::db::orders::OrderRepository;
use crate::db::outbox::OutboxRepository;
use crate::db::RepositoryError;
use crate::models::NotificationJob;
use crate::state::AppState;

/// Jobs handled per wake. A job that fails is not retried until the next
/// poll tick, so retries are naturally spaced out.
const BATCH_SIZE: u32 = 64;

/// Spawn the worker task.
pub fn spawn(state: AppState) -> JoinHandle<()> {
    tokio::spawn(run(state))
}

async fn run(state: AppState) {
    tracing::info!(
        poll_interval = ?state.config().outbox.poll_interval,
        max_attempts = state.config().outbox.max_attempts,
        "outbox worker started"
    );

    loop {
        // Drain first: jobs may be waiting from before a restart
        drain(&state).await;

        tokio::select! {
            () = state.outbox_nudged() => {}
            () = tokio::time::sleep(state.config().outbox.poll_interval) => {}
        }
    }
}

/// Process one batch of pending jobs.
#[instrument(skip_all)]
async fn drain(state: &AppState) {
    let outbox = OutboxRepository::new(state.pool());
    let max_attempts = state.config().outbox.max_attempts;

    let jobs = match outbox.pending_batch(max_attempts, BATCH_SIZE).await {
        Ok(jobs) => jobs,
        Err(e) => {
            tracing::error!(error = %e, "outbox poll failed");
            return;
        }
    };

    for job in jobs {
        if let Err(e) = process(state, &job).await {
            tracing::error!(job_id = %job.id, error = %e, "outbox processing failed");
            return;
        }
    }
}

async fn process(state: &AppState, job: &NotificationJob) -> Result<(), RepositoryError> {
    let outbox = OutboxRepository::new(state.pool());
    let orders = OrderRepository::new(state.pool());
    let max_attempts = state.config().outbox.max_attempts;

    let Some(order) = orders.get(job.order_id).await? else {
        tracing::warn!(job_id = %job.id, order_id = %job.order_id, "order gone, parking job");
        return outbox.mark_failed(job.id, "order row missing").await;
    };

    match state.mailer().send_order_confirmation(&order).await {
        Ok(()) => outbox.mark_sent(job.id).await,
        Err(e) => {
            tracing::warn!(
                job_id = %job.id,
                order_id = %order.id,
                attempts = job.attempts + 1,
                error = %e,
                "order confirmation failed"
            );
            outbox.record_failure(job.id, &e.to_string(), max_attempts).await
        }
    }
}

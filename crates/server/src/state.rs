//! Shared application state.

use std::sync::Arc;

use sqlx::SqlitePool;
use tokio::sync::Notify;

use crate::config::Config;
use crate::services::email::Mailer;

/// Shared application state, cheap to clone.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Config,
    pool: SqlitePool,
    mailer: Mailer,
    outbox_notify: Notify,
}

impl AppState {
    #[must_use]
    pub fn new(config: Config, pool: SqlitePool, mailer: Mailer) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                mailer,
                outbox_notify: Notify::new(),
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.inner.pool
    }

    #[must_use]
    pub fn mailer(&self) -> &Mailer {
        &self.inner.mailer
    }

    /// Wake the outbox worker so a freshly enqueued job is picked up
    /// without waiting for the next poll.
    pub fn nudge_outbox(&self) {
        self.inner.outbox_notify.notify_one();
    }

    /// Wait until the outbox is nudged.
    ///
    /// `Notify::notify_one` stores a permit, so a nudge that lands while
    /// the worker is processing is not lost.
    pub async fn outbox_nudged(&self) {
        self.inner.outbox_notify.notified().await;
    }
}

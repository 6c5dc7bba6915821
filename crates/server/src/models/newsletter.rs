//! Newsletter subscriber model.

use chrono::{DateTime, Utc};
use serde::Serialize;
use threadbare_core::SubscriberId;

/// A newsletter subscriber.
#[derive(Debug, Clone, Serialize)]
pub struct Subscriber {
    pub id: SubscriberId,
    pub email: String,
    pub subscribed_at: DateTime<Utc>,
}

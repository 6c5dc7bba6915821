//! Order and notification models.

use chrono::{DateTime, Utc};
use serde::Serialize;
use threadbare_core::{NotificationJobId, OrderId, OrderStatus, OwnerKey, Price, ProductId};

/// A line on a placed order.
///
/// Product name and price are copied at checkout so later catalog edits
/// don't rewrite history.
#[derive(Debug, Clone, Serialize)]
pub struct OrderItem {
    pub product_id: ProductId,
    pub product_name: String,
    pub price: Price,
    pub quantity: i64,
}

/// A placed order.
#[derive(Debug, Clone, Serialize)]
pub struct Order {
    pub id: OrderId,
    pub owner: Option<OwnerKey>,
    pub customer_name: String,
    pub customer_email: String,
    pub customer_phone: String,
    pub customer_address: String,
    pub items: Vec<OrderItem>,
    pub total_amount: Price,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Delivery state of a notification outbox job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Sent,
    Failed,
}

impl JobStatus {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Sent => "sent",
            Self::Failed => "failed",
        }
    }
}

impl std::str::FromStr for JobStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "sent" => Ok(Self::Sent),
            "failed" => Ok(Self::Failed),
            other => Err(format!("unknown job status {other:?}")),
        }
    }
}

/// A queued order-confirmation email.
///
/// Written in the same transaction as the order; a background worker
/// delivers it. `attempts` counts delivery tries; after too many failures
/// the job is parked as `Failed`.
#[derive(Debug, Clone, Serialize)]
pub struct NotificationJob {
    pub id: NotificationJobId,
    pub order_id: OrderId,
    pub status: JobStatus,
    pub attempts: i64,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub sent_at: Option<DateTime<Utc>>,
}

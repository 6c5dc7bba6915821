//! Account and admin marker models.

use chrono::{DateTime, Utc};
use serde::Serialize;
use threadbare_core::AccountId;

/// A registered customer account.
///
/// The password hash never leaves the database layer; this struct is safe
/// to serialize into API responses.
#[derive(Debug, Clone, Serialize)]
pub struct Account {
    pub id: AccountId,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// The single admin claim.
///
/// At most one row exists; whoever claimed it is the store admin.
#[derive(Debug, Clone, Serialize)]
pub struct AdminMarker {
    pub account_id: AccountId,
    pub claimed_at: DateTime<Utc>,
}

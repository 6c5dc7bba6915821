//! Session data models.

use serde::{Deserialize, Serialize};
use threadbare_core::AccountId;

/// Account data stored in the session after login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentAccount {
    pub id: AccountId,
    pub email: String,
}

/// Session keys used for storing data.
pub mod keys {
    /// Key for the logged-in account.
    pub const CURRENT_ACCOUNT: &str = "current_account";
}

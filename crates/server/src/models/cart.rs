//! Shopping cart models.

use chrono::{DateTime, Utc};
use serde::Serialize;
use threadbare_core::{CartItemId, OwnerKey, ProductId};

use super::catalog::Product;

/// A line in someone's cart.
#[derive(Debug, Clone, Serialize)]
pub struct CartItem {
    pub id: CartItemId,
    pub owner: OwnerKey,
    pub product_id: ProductId,
    pub quantity: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A cart line joined with its product.
///
/// Lines whose product no longer exists are dropped by the join and never
/// reach the client.
#[derive(Debug, Clone, Serialize)]
pub struct CartEntry {
    pub item: CartItem,
    pub product: Product,
}

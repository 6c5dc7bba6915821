//! Product catalog models.

use chrono::{DateTime, Utc};
use serde::Serialize;
use threadbare_core::{Price, ProductId};

/// A product in the catalog.
#[derive(Debug, Clone, Serialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Price,
    pub image_url: String,
    pub category: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

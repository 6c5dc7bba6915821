//! Shopping cart repository.
//!
//! Cart lines are keyed by `(owner_kind, owner_id, product_id)`, so adding
//! the same product twice merges into one line via an atomic upsert rather
//! than a read-modify-write.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use threadbare_core::{CartItemId, OwnerKey, Price, ProductId};

use super::RepositoryError;
use crate::models::{CartEntry, CartItem, Product};

#[derive(sqlx::FromRow)]
struct CartItemRow {
    id: String,
    owner_kind: String,
    owner_id: String,
    product_id: String,
    quantity: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<CartItemRow> for CartItem {
    type Error = RepositoryError;

    fn try_from(row: CartItemRow) -> Result<Self, Self::Error> {
        let id = row
            .id
            .parse::<CartItemId>()
            .map_err(|e| RepositoryError::DataCorruption(format!("cart item id {:?}: {e}", row.id)))?;
        let owner = OwnerKey::from_parts(&row.owner_kind, &row.owner_id)
            .map_err(RepositoryError::DataCorruption)?;
        let product_id = row.product_id.parse::<ProductId>().map_err(|e| {
            RepositoryError::DataCorruption(format!("cart product id {:?}: {e}", row.product_id))
        })?;

        Ok(Self {
            id,
            owner,
            product_id,
            quantity: row.quantity,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct CartEntryRow {
    item_id: String,
    owner_kind: String,
    owner_id: String,
    quantity: i64,
    item_created_at: DateTime<Utc>,
    item_updated_at: DateTime<Utc>,
    product_id: String,
    name: String,
    description: String,
    price: String,
    image_url: String,
    category: String,
    is_active: bool,
    product_created_at: DateTime<Utc>,
    product_updated_at: DateTime<Utc>,
}

impl TryFrom<CartEntryRow> for CartEntry {
    type Error = RepositoryError;

    fn try_from(row: CartEntryRow) -> Result<Self, Self::Error> {
        let item_id = row.item_id.parse::<CartItemId>().map_err(|e| {
            RepositoryError::DataCorruption(format!("cart item id {:?}: {e}", row.item_id))
        })?;
        let owner = OwnerKey::from_parts(&row.owner_kind, &row.owner_id)
            .map_err(RepositoryError::DataCorruption)?;
        let product_id = row.product_id.parse::<ProductId>().map_err(|e| {
            RepositoryError::DataCorruption(format!("product id {:?}: {e}", row.product_id))
        })?;
        let price = Price::parse(&row.price).map_err(|e| {
            RepositoryError::DataCorruption(format!("product price {:?}: {e}", row.price))
        })?;

        Ok(Self {
            item: CartItem {
                id: item_id,
                owner: owner.clone(),
                product_id,
                quantity: row.quantity,
                created_at: row.item_created_at,
                updated_at: row.item_updated_at,
            },
            product: Product {
                id: product_id,
                name: row.name,
                description: row.description,
                price,
                image_url: row.image_url,
                category: row.category,
                is_active: row.is_active,
                created_at: row.product_created_at,
                updated_at: row.product_updated_at,
            },
        })
    }
}

/// Repository for cart operations.
pub struct CartRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> CartRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Add `quantity` of a product, merging with any existing line.
    ///
    /// Quantities merge arithmetically, so negative deltas are allowed;
    /// a merge that lands at zero or below removes the line and returns
    /// `None`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the transaction fails.
    pub async fn add_item(
        &self,
        owner: &OwnerKey,
        product_id: ProductId,
        quantity: i64,
    ) -> Result<Option<CartItem>, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let now = Utc::now();

        let row = sqlx::query_as::<_, CartItemRow>(
            r"
            INSERT INTO cart_items (id, owner_kind, owner_id, product_id, quantity, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
            ON CONFLICT (owner_kind, owner_id, product_id)
            DO UPDATE SET quantity = quantity + excluded.quantity, updated_at = excluded.updated_at
            RETURNING id, owner_kind, owner_id, product_id, quantity, created_at, updated_at
            ",
        )
        .bind(CartItemId::new().to_string())
        .bind(owner.kind())
        .bind(owner.id_string())
        .bind(product_id.to_string())
        .bind(quantity)
        .bind(now)
        .fetch_one(&mut *tx)
        .await?;

        let item = CartItem::try_from(row)?;

        if item.quantity <= 0 {
            sqlx::query("DELETE FROM cart_items WHERE id = ?1")
                .bind(item.id.to_string())
                .execute(&mut *tx)
                .await?;
            tx.commit().await?;
            return Ok(None);
        }

        tx.commit().await?;
        Ok(Some(item))
    }

    /// List the owner's cart joined with product data, oldest line first.
    ///
    /// Lines whose product was deleted are dropped from the result.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_entries(&self, owner: &OwnerKey) -> Result<Vec<CartEntry>, RepositoryError> {
        let rows = sqlx::query_as::<_, CartEntryRow>(
            r"
            SELECT
                ci.id AS item_id,
                ci.owner_kind,
                ci.owner_id,
                ci.quantity,
                ci.created_at AS item_created_at,
                ci.updated_at AS item_updated_at,
                p.id AS product_id,
                p.name,
                p.description,
                p.price,
                p.image_url,
                p.category,
                p.is_active,
                p.created_at AS product_created_at,
                p.updated_at AS product_updated_at
            FROM cart_items ci
            INNER JOIN products p ON p.id = ci.product_id
            WHERE ci.owner_kind = ?1 AND ci.owner_id = ?2
            ORDER BY ci.created_at ASC
            ",
        )
        .bind(owner.kind())
        .bind(owner.id_string())
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(CartEntry::try_from).collect()
    }

    /// Set a line's quantity exactly. Zero or below removes the line.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the line does not exist or
    /// belongs to a different owner.
    pub async fn set_quantity(
        &self,
        owner: &OwnerKey,
        item_id: CartItemId,
        quantity: i64,
    ) -> Result<(), RepositoryError> {
        if quantity <= 0 {
            return self.remove_item(owner, item_id).await;
        }

        let result = sqlx::query(
            r"
            UPDATE cart_items
            SET quantity = ?4, updated_at = ?5
            WHERE id = ?1 AND owner_kind = ?2 AND owner_id = ?3
            ",
        )
        .bind(item_id.to_string())
        .bind(owner.kind())
        .bind(owner.id_string())
        .bind(quantity)
        .bind(Utc::now())
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Remove a single line.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the line does not exist or
    /// belongs to a different owner.
    pub async fn remove_item(
        &self,
        owner: &OwnerKey,
        item_id: CartItemId,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "DELETE FROM cart_items WHERE id = ?1 AND owner_kind = ?2 AND owner_id = ?3",
        )
        .bind(item_id.to_string())
        .bind(owner.kind())
        .bind(owner.id_string())
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Remove every line the owner has. A no-op for an empty cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn clear(&self, owner: &OwnerKey) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM cart_items WHERE owner_kind = ?1 AND owner_id = ?2")
            .bind(owner.kind())
            .bind(owner.id_string())
            .execute(self.pool)
            .await?;
        Ok(())
    }
}

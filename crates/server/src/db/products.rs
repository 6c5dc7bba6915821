//! Product catalog repository.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use threadbare_core::{Price, ProductId};

use super::RepositoryError;
use crate::models::Product;

/// Fields for creating a product. New products start active.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price: Price,
    pub image_url: String,
    pub category: String,
}

/// Full replacement of a product's fields.
#[derive(Debug, Clone)]
pub struct ProductUpdate {
    pub name: String,
    pub description: String,
    pub price: Price,
    pub image_url: String,
    pub category: String,
    pub is_active: bool,
}

/// Starter catalog inserted by [`ProductRepository::seed_sample`].
const SAMPLE_PRODUCTS: &[(&str, &str, &str, &str, &str)] = &[
    (
        "Classic White Tee",
        "A timeless classic white t-shirt made from 100% cotton. Perfect for everyday wear.",
        "15.00",
        "https://placehold.co/400x400/E0E0E0/000000?text=White+Tee",
        "Basic",
    ),
    (
        "Graphic Print Tee",
        "Express yourself with this stylish graphic print t-shirt. Comfortable and trendy.",
        "22.50",
        "https://placehold.co/400x400/333333/FFFFFF?text=Graphic+Tee",
        "Graphic",
    ),
    (
        "V-Neck Basic Tee",
        "A versatile v-neck t-shirt that pairs well with any outfit. Soft and comfortable.",
        "18.00",
        "https://placehold.co/400x400/C0C0C0/000000?text=V-Neck+Tee",
        "Basic",
    ),
];

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: String,
    name: String,
    description: String,
    price: String,
    image_url: String,
    category: String,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ProductRow> for Product {
    type Error = RepositoryError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        let id = row
            .id
            .parse::<ProductId>()
            .map_err(|e| RepositoryError::DataCorruption(format!("product id {:?}: {e}", row.id)))?;
        let price = Price::parse(&row.price).map_err(|e| {
            RepositoryError::DataCorruption(format!("product price {:?}: {e}", row.price))
        })?;

        Ok(Self {
            id,
            name: row.name,
            description: row.description,
            price,
            image_url: row.image_url,
            category: row.category,
            is_active: row.is_active,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const PRODUCT_COLUMNS: &str =
    "id, name, description, price, image_url, category, is_active, created_at, updated_at";

/// Repository for product catalog operations.
pub struct ProductRepository<'a> {
    pool: &'a SqlitePool,
}

impl<'a> ProductRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// List active products, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_active(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE is_active = 1 ORDER BY created_at ASC"
        ))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Product::try_from).collect()
    }

    /// List every product regardless of active flag, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_all(&self) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products ORDER BY created_at ASC"
        ))
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Product::try_from).collect()
    }

    /// Fetch a product for the storefront.
    ///
    /// Inactive products are treated the same as missing ones, so hidden
    /// items cannot be fetched by guessing ids.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_active(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1 AND is_active = 1"
        ))
        .bind(id.to_string())
        .fetch_optional(self.pool)
        .await?;

        row.map(Product::try_from).transpose()
    }

    /// Fetch a product regardless of active flag.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_any(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1"
        ))
        .bind(id.to_string())
        .fetch_optional(self.pool)
        .await?;

        row.map(Product::try_from).transpose()
    }

    /// Create a product. New products are active.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, new: NewProduct) -> Result<Product, RepositoryError> {
        let id = ProductId::new();
        let now = Utc::now();

        sqlx::query(
            r"
            INSERT INTO products (id, name, description, price, image_url, category, is_active, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1, ?7, ?7)
            ",
        )
        .bind(id.to_string())
        .bind(&new.name)
        .bind(&new.description)
        .bind(new.price.amount().to_string())
        .bind(&new.image_url)
        .bind(&new.category)
        .bind(now)
        .execute(self.pool)
        .await?;

        Ok(Product {
            id,
            name: new.name,
            description: new.description,
            price: new.price,
            image_url: new.image_url,
            category: new.category,
            is_active: true,
            created_at: now,
            updated_at: now,
        })
    }

    /// Replace every editable field of a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    pub async fn update(
        &self,
        id: ProductId,
        update: ProductUpdate,
    ) -> Result<Product, RepositoryError> {
        let now = Utc::now();

        let row = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            UPDATE products
            SET name = ?2, description = ?3, price = ?4, image_url = ?5,
                category = ?6, is_active = ?7, updated_at = ?8
            WHERE id = ?1
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(id.to_string())
        .bind(&update.name)
        .bind(&update.description)
        .bind(update.price.amount().to_string())
        .bind(&update.image_url)
        .bind(&update.category)
        .bind(update.is_active)
        .bind(now)
        .fetch_optional(self.pool)
        .await?;

        row.map(Product::try_from)
            .transpose()?
            .ok_or(RepositoryError::NotFound)
    }

    /// Hard-delete a product. Cart lines pointing at it become orphans
    /// that the cart join silently drops.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    pub async fn remove(&self, id: ProductId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id.to_string())
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Insert the starter catalog if the table is empty.
    ///
    /// Returns `true` if products were inserted, `false` if the catalog
    /// already had any products. Runs in one transaction so concurrent
    /// seeds cannot double-insert.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the transaction fails.
    pub async fn seed_sample(&self) -> Result<bool, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&mut *tx)
            .await?;
        if count > 0 {
            return Ok(false);
        }

        let now = Utc::now();
        for (name, description, price, image_url, category) in SAMPLE_PRODUCTS {
            sqlx::query(
                r"
                INSERT INTO products (id, name, description, price, image_url, category, is_active, created_at, updated_at)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1, ?7, ?7)
                ",
            )
            .bind(ProductId::new().to_string())
            .bind(name)
            .bind(description)
            .bind(price)
            .bind(image_url)
            .bind(category)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(true)
    }
}

//! Seed the product catalog with sample data.
//!
//! Inserts the built-in sample t-shirts so a fresh deployment has something
//! to sell. The command is idempotent: if the catalog already contains any
//! product it leaves the database untouched.

use secrecy::SecretString;
use tracing::info;

use threadbare_server::db::{self, ProductRepository};

/// Seed sample products into an empty catalog.
///
/// # Errors
///
/// Returns an error if environment variables are missing or database
/// operations fail.
pub async fn sample_products() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let database_url = std::env::var("THREADBARE_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| "THREADBARE_DATABASE_URL not set")?;

    let pool = db::create_pool(&database_url).await?;
    info!("Connected to database");

    let seeded = ProductRepository::new(&pool).seed_sample().await?;

    if seeded {
        info!("Sample products inserted");
    } else {
        info!("Catalog already has products, nothing to do");
    }

    Ok(())
}

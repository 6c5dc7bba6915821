//! Storefront catalog endpoints.

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use threadbare_core::ProductId;

use crate::db::products::ProductRepository;
use crate::error::{AppError, Result};
use crate::models::Product;
use crate::state::AppState;

pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_products))
        .route("/seed", post(seed_products))
        .route("/{id}", get(get_product))
}

#[derive(Serialize)]
struct SeedResponse {
    seeded: bool,
}

async fn list_products(State(state): State<AppState>) -> Result<Json<Vec<Product>>> {
    let products = ProductRepository::new(state.pool()).list_active().await?;
    Ok(Json(products))
}

async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<Product>> {
    ProductRepository::new(state.pool())
        .get_active(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Product not found".to_string()))
}

async fn seed_products(State(state): State<AppState>) -> Result<Json<SeedResponse>> {
    let seeded = ProductRepository::new(state.pool()).seed_sample().await?;
    if seeded {
        tracing::info!("starter catalog seeded");
    }
    Ok(Json(SeedResponse { seeded }))
}

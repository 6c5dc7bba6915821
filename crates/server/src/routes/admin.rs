//! Admin endpoints.
//!
//! Everything except the claim and status endpoints requires the admin
//! account, enforced by the `RequireAdmin` extractor.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use threadbare_core::{OrderId, OrderStatus, Price, ProductId};
use tracing::instrument;

use crate::db::admin::AdminRepository;
use crate::db::newsletter::NewsletterRepository;
use crate::db::orders::{OrderAnalytics, OrderRepository};
use crate::db::products::{NewProduct, ProductRepository, ProductUpdate};
use crate::db::RepositoryError;
use crate::error::{AppError, Result};
use crate::middleware::auth::{OptionalAuth, RequireAdmin, RequireAuth};
use crate::models::{AdminMarker, Order, Product, Subscriber};
use crate::state::AppState;

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/claim", post(claim_admin))
        .route("/status", get(admin_status))
        .route("/products", get(list_all_products).post(create_product))
        .route("/products/{id}", put(update_product).delete(delete_product))
        .route("/orders", get(list_orders))
        .route("/orders/{id}/status", put(update_order_status))
        .route("/analytics", get(analytics))
        .route("/newsletter", get(list_subscribers))
}

#[derive(Serialize)]
struct AdminStatus {
    has_admin: bool,
    is_admin: bool,
}

#[derive(Deserialize)]
struct ProductForm {
    name: String,
    description: String,
    price: Price,
    image_url: String,
    category: String,
}

#[derive(Deserialize)]
struct ProductUpdateForm {
    name: String,
    description: String,
    price: Price,
    image_url: String,
    category: String,
    is_active: bool,
}

#[derive(Deserialize)]
struct OrderStatusForm {
    status: OrderStatus,
}

/// Claim the admin role. First logged-in account to call this wins;
/// everyone after gets a conflict.
#[instrument(skip_all)]
async fn claim_admin(
    RequireAuth(account): RequireAuth,
    State(state): State<AppState>,
) -> Result<Json<AdminMarker>> {
    let marker = AdminRepository::new(state.pool()).claim(account.id).await?;
    tracing::info!(account_id = %account.id, "admin role claimed");
    Ok(Json(marker))
}

async fn admin_status(
    OptionalAuth(account): OptionalAuth,
    State(state): State<AppState>,
) -> Result<Json<AdminStatus>> {
    let repo = AdminRepository::new(state.pool());
    let has_admin = repo.has_admin().await?;
    let is_admin = match account {
        Some(account) => repo.is_admin(account.id).await?,
        None => false,
    };
    Ok(Json(AdminStatus { has_admin, is_admin }))
}

async fn list_all_products(
    _admin: RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<Vec<Product>>> {
    let products = ProductRepository::new(state.pool()).list_all().await?;
    Ok(Json(products))
}

async fn create_product(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Json(form): Json<ProductForm>,
) -> Result<(StatusCode, Json<Product>)> {
    if form.name.trim().is_empty() {
        return Err(AppError::BadRequest("Product name is required".to_string()));
    }

    let product = ProductRepository::new(state.pool())
        .create(NewProduct {
            name: form.name,
            description: form.description,
            price: form.price,
            image_url: form.image_url,
            category: form.category,
        })
        .await?;

    tracing::info!(product_id = %product.id, "product created");
    Ok((StatusCode::CREATED, Json(product)))
}

async fn update_product(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
    Json(form): Json<ProductUpdateForm>,
) -> Result<Json<Product>> {
    if form.name.trim().is_empty() {
        return Err(AppError::BadRequest("Product name is required".to_string()));
    }

    match ProductRepository::new(state.pool())
        .update(
            id,
            ProductUpdate {
                name: form.name,
                description: form.description,
                price: form.price,
                image_url: form.image_url,
                category: form.category,
                is_active: form.is_active,
            },
        )
        .await
    {
        Ok(product) => Ok(Json(product)),
        Err(RepositoryError::NotFound) => {
            Err(AppError::NotFound("Product not found".to_string()))
        }
        Err(e) => Err(e.into()),
    }
}

async fn delete_product(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<StatusCode> {
    match ProductRepository::new(state.pool()).remove(id).await {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(RepositoryError::NotFound) => {
            Err(AppError::NotFound("Product not found".to_string()))
        }
        Err(e) => Err(e.into()),
    }
}

async fn list_orders(
    _admin: RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<Vec<Order>>> {
    let orders = OrderRepository::new(state.pool()).list_all().await?;
    Ok(Json(orders))
}

/// Advance an order one step along pending, confirmed, shipped,
/// delivered. Skips, reversals, and moves out of `delivered` are
/// rejected.
#[instrument(skip_all, fields(order_id = %id))]
async fn update_order_status(
    _admin: RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
    Json(form): Json<OrderStatusForm>,
) -> Result<Json<Order>> {
    let repo = OrderRepository::new(state.pool());

    let Some(order) = repo.get(id).await? else {
        return Err(AppError::NotFound("Order not found".to_string()));
    };

    if !order.status.can_transition_to(form.status) {
        return Err(AppError::BadRequest(format!(
            "Cannot change order status from {} to {}",
            order.status, form.status
        )));
    }

    let advanced = repo.transition_status(id, order.status, form.status).await?;
    if !advanced {
        return Err(AppError::AlreadyExists(
            "Order status changed concurrently".to_string(),
        ));
    }

    tracing::info!(order_id = %id, from = %order.status, to = %form.status, "order status updated");

    repo.get(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Order not found".to_string()))
}

async fn analytics(
    _admin: RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<OrderAnalytics>> {
    let analytics = OrderRepository::new(state.pool()).analytics().await?;
    Ok(Json(analytics))
}

async fn list_subscribers(
    _admin: RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<Vec<Subscriber>>> {
    let subscribers = NewsletterRepository::new(state.pool()).list_all().await?;
    Ok(Json(subscribers))
}

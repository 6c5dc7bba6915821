//! Checkout and order lookup endpoints.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use rust_decimal::Decimal;
use serde::Deserialize;
use threadbare_core::{Email, OrderId, Price, ProductId};
use tracing::instrument;

use crate::db::orders::{NewOrder, OrderRepository};
use crate::db::products::ProductRepository;
use crate::error::{AppError, Result};
use crate::middleware::auth::{resolve_owner, OptionalAuth};
use crate::models::{Order, OrderItem};
use crate::state::AppState;

pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_order))
        .route("/{id}", get(get_order))
}

#[derive(Deserialize)]
struct OrderItemForm {
    product_id: ProductId,
    product_name: String,
    price: Price,
    quantity: i64,
}

#[derive(Deserialize)]
struct CreateOrderForm {
    customer_name: String,
    customer_email: String,
    customer_phone: String,
    customer_address: String,
    items: Vec<OrderItemForm>,
    total_amount: Price,
    session_key: Option<String>,
}

/// Place an order.
///
/// Prices and the total are recomputed against the catalog and the
/// request is rejected on any mismatch, so a tampered client cannot buy
/// at made-up prices.
#[instrument(skip_all, fields(email = %form.customer_email, items = form.items.len()))]
async fn create_order(
    State(state): State<AppState>,
    OptionalAuth(account): OptionalAuth,
    Json(form): Json<CreateOrderForm>,
) -> Result<(StatusCode, Json<Order>)> {
    let customer_name = form.customer_name.trim();
    if customer_name.is_empty() {
        return Err(AppError::BadRequest("Name is required".to_string()));
    }
    let customer_email = Email::parse(form.customer_email.trim())
        .map_err(|e| AppError::BadRequest(e.to_string()))?;
    let customer_phone = form.customer_phone.trim();
    if customer_phone.is_empty() {
        return Err(AppError::BadRequest("Phone number is required".to_string()));
    }
    let customer_address = form.customer_address.trim();
    if customer_address.is_empty() {
        return Err(AppError::BadRequest(
            "Delivery address is required".to_string(),
        ));
    }
    if form.items.is_empty() {
        return Err(AppError::BadRequest(
            "Order must contain at least one item".to_string(),
        ));
    }

    let owner = resolve_owner(account.as_ref(), form.session_key.as_deref())?;

    let products = ProductRepository::new(state.pool());
    let mut items = Vec::with_capacity(form.items.len());
    let mut computed_total = Decimal::ZERO;
    for line in &form.items {
        if line.quantity <= 0 {
            return Err(AppError::BadRequest(
                "Item quantity must be positive".to_string(),
            ));
        }

        let Some(product) = products.get_any(line.product_id).await? else {
            return Err(AppError::BadRequest(format!(
                "Unknown product in order: {}",
                line.product_id
            )));
        };
        if line.price != product.price {
            return Err(AppError::BadRequest(format!(
                "Price for {} does not match the catalog",
                product.name
            )));
        }
        if line.product_name != product.name {
            return Err(AppError::BadRequest(
                "Item name does not match the catalog".to_string(),
            ));
        }

        computed_total += product.price.line_total(line.quantity);
        items.push(OrderItem {
            product_id: product.id,
            product_name: product.name,
            price: product.price,
            quantity: line.quantity,
        });
    }

    if form.total_amount.amount() != computed_total {
        return Err(AppError::BadRequest(
            "Order total does not match item prices".to_string(),
        ));
    }

    let order = OrderRepository::new(state.pool())
        .create(NewOrder {
            owner,
            customer_name: customer_name.to_string(),
            customer_email: customer_email.into_inner(),
            customer_phone: customer_phone.to_string(),
            customer_address: customer_address.to_string(),
            items,
            total_amount: form.total_amount,
        })
        .await?;

    // Confirmation job is already queued; wake the worker now
    state.nudge_outbox();

    tracing::info!(order_id = %order.id, total = %order.total_amount, "order placed");
    Ok((StatusCode::CREATED, Json(order)))
}

async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<OrderId>,
) -> Result<Json<Order>> {
    OrderRepository::new(state.pool())
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Order not found".to_string()))
}

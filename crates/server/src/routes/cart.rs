//! Cart endpoints.
//!
//! Carts work for both guests and logged-in accounts. Guests identify
//! their cart with a client-generated `session_key`; logged-in accounts
//! are keyed by account id and any `session_key` they send is ignored.
//! A request with neither reads as an empty cart and writes as a no-op.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use threadbare_core::{CartItemId, ProductId};

use crate::db::cart::CartRepository;
use crate::db::products::ProductRepository;
use crate::db::RepositoryError;
use crate::error::{AppError, Result};
use crate::middleware::auth::{resolve_owner, OptionalAuth};
use crate::models::{CartEntry, CartItem};
use crate::state::AppState;

pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(get_cart).delete(clear_cart))
        .route("/items", post(add_item))
        .route("/items/{id}", put(update_item).delete(remove_item))
}

#[derive(Deserialize)]
struct OwnerQuery {
    session_key: Option<String>,
}

#[derive(Deserialize)]
struct AddItemForm {
    product_id: ProductId,
    quantity: i64,
    session_key: Option<String>,
}

#[derive(Serialize)]
struct AddItemResponse {
    /// The merged line, or `None` when the merge removed it (or the
    /// caller had no cart to add to).
    item: Option<CartItem>,
}

#[derive(Deserialize)]
struct UpdateItemForm {
    quantity: i64,
    session_key: Option<String>,
}

async fn get_cart(
    State(state): State<AppState>,
    OptionalAuth(account): OptionalAuth,
    Query(query): Query<OwnerQuery>,
) -> Result<Json<Vec<CartEntry>>> {
    let Some(owner) = resolve_owner(account.as_ref(), query.session_key.as_deref())? else {
        return Ok(Json(Vec::new()));
    };

    let entries = CartRepository::new(state.pool()).list_entries(&owner).await?;
    Ok(Json(entries))
}

async fn add_item(
    State(state): State<AppState>,
    OptionalAuth(account): OptionalAuth,
    Json(form): Json<AddItemForm>,
) -> Result<Json<AddItemResponse>> {
    let Some(owner) = resolve_owner(account.as_ref(), form.session_key.as_deref())? else {
        return Ok(Json(AddItemResponse { item: None }));
    };

    let products = ProductRepository::new(state.pool());
    if products.get_any(form.product_id).await?.is_none() {
        return Err(AppError::NotFound("Product not found".to_string()));
    }

    let item = CartRepository::new(state.pool())
        .add_item(&owner, form.product_id, form.quantity)
        .await?;
    Ok(Json(AddItemResponse { item }))
}

async fn update_item(
    State(state): State<AppState>,
    OptionalAuth(account): OptionalAuth,
    Path(id): Path<CartItemId>,
    Json(form): Json<UpdateItemForm>,
) -> Result<StatusCode> {
    let Some(owner) = resolve_owner(account.as_ref(), form.session_key.as_deref())? else {
        return Ok(StatusCode::NO_CONTENT);
    };

    match CartRepository::new(state.pool())
        .set_quantity(&owner, id, form.quantity)
        .await
    {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(RepositoryError::NotFound) => {
            Err(AppError::NotFound("Cart item not found".to_string()))
        }
        Err(e) => Err(e.into()),
    }
}

async fn remove_item(
    State(state): State<AppState>,
    OptionalAuth(account): OptionalAuth,
    Path(id): Path<CartItemId>,
    Query(query): Query<OwnerQuery>,
) -> Result<StatusCode> {
    let Some(owner) = resolve_owner(account.as_ref(), query.session_key.as_deref())? else {
        return Ok(StatusCode::NO_CONTENT);
    };

    match CartRepository::new(state.pool()).remove_item(&owner, id).await {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(RepositoryError::NotFound) => {
            Err(AppError::NotFound("Cart item not found".to_string()))
        }
        Err(e) => Err(e.into()),
    }
}

async fn clear_cart(
    State(state): State<AppState>,
    OptionalAuth(account): OptionalAuth,
    Query(query): Query<OwnerQuery>,
) -> Result<StatusCode> {
    let Some(owner) = resolve_owner(account.as_ref(), query.session_key.as_deref())? else {
        return Ok(StatusCode::NO_CONTENT);
    };

    CartRepository::new(state.pool()).clear(&owner).await?;
    Ok(StatusCode::NO_CONTENT)
}

//! HTTP route handlers.

mod admin;
mod auth;
mod cart;
mod newsletter;
mod orders;
mod products;

use axum::Router;

use crate::state::AppState;

/// Assemble the API router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/api/auth", auth::auth_routes())
        .nest("/api/products", products::product_routes())
        .nest("/api/cart", cart::cart_routes())
        .nest("/api/orders", orders::order_routes())
        .nest("/api/newsletter", newsletter::newsletter_routes())
        .nest("/api/admin", admin::admin_routes())
}

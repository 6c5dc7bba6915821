//! Threadbare storefront server.
//!
//! HTTP API for a small t-shirt store: a public catalog, guest and
//! account carts, checkout with emailed confirmations, a newsletter
//! list, and a single-admin dashboard.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the full application router, including the session layer.
///
/// # Errors
///
/// Returns `sqlx::Error` if the session store migration fails.
pub async fn app(state: AppState) -> Result<Router, sqlx::Error> {
    let session_layer =
        middleware::session::create_session_layer(state.pool(), state.config()).await?;

    Ok(Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(ready))
        .merge(routes::routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .layer(session_layer)
        .with_state(state)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction()))
}

async fn health() -> &'static str {
    "ok"
}

async fn ready(State(state): State<AppState>) -> Result<&'static str, StatusCode> {
    match sqlx::query("SELECT 1").execute(state.pool()).await {
        Ok(_) => Ok("ok"),
        Err(e) => {
            tracing::error!(error = %e, "readiness check failed");
            Err(StatusCode::SERVICE_UNAVAILABLE)
        }
    }
}

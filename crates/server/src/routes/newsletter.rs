//! Newsletter signup endpoint.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use threadbare_core::Email;
use tracing::instrument;

use crate::db::newsletter::NewsletterRepository;
use crate::error::{AppError, Result};
use crate::models::Subscriber;
use crate::state::AppState;

pub fn newsletter_routes() -> Router<AppState> {
    Router::new().route("/subscribe", post(subscribe))
}

#[derive(Deserialize)]
struct SubscribeForm {
    email: String,
}

#[instrument(skip(state, form), fields(email = %form.email))]
async fn subscribe(
    State(state): State<AppState>,
    Json(form): Json<SubscribeForm>,
) -> Result<(StatusCode, Json<Subscriber>)> {
    let normalized = form.email.trim().to_lowercase();
    let email = Email::parse(&normalized).map_err(|e| AppError::BadRequest(e.to_string()))?;

    let subscriber = NewsletterRepository::new(state.pool()).subscribe(&email).await?;

    tracing::info!(subscriber_id = %subscriber.id, "newsletter signup");
    Ok((StatusCode::CREATED, Json(subscriber)))
}

//! Registration, login, and session endpoints.

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::middleware::auth::{clear_current_account, set_current_account, OptionalAuth};
use crate::models::CurrentAccount;
use crate::services::auth::AuthService;
use crate::state::AppState;

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/me", get(me))
}

#[derive(Deserialize)]
struct CredentialsForm {
    email: String,
    password: String,
}

#[derive(Serialize)]
struct MeResponse {
    account: Option<CurrentAccount>,
}

#[instrument(skip(state, session, form), fields(email = %form.email))]
async fn register(
    State(state): State<AppState>,
    session: Session,
    Json(form): Json<CredentialsForm>,
) -> Result<(StatusCode, Json<CurrentAccount>)> {
    let account = AuthService::new(state.pool())
        .register(&form.email, &form.password)
        .await?;

    // Fresh session id on privilege change
    session
        .cycle_id()
        .await
        .map_err(|e| AppError::Internal(format!("session cycle failed: {e}")))?;

    let current = CurrentAccount {
        id: account.id,
        email: account.email,
    };
    set_current_account(&session, &current).await?;

    tracing::info!(account_id = %current.id, "account registered");
    Ok((StatusCode::CREATED, Json(current)))
}

#[instrument(skip(state, session, form), fields(email = %form.email))]
async fn login(
    State(state): State<AppState>,
    session: Session,
    Json(form): Json<CredentialsForm>,
) -> Result<Json<CurrentAccount>> {
    let account = AuthService::new(state.pool())
        .login(&form.email, &form.password)
        .await?;

    session
        .cycle_id()
        .await
        .map_err(|e| AppError::Internal(format!("session cycle failed: {e}")))?;

    let current = CurrentAccount {
        id: account.id,
        email: account.email,
    };
    set_current_account(&session, &current).await?;

    tracing::info!(account_id = %current.id, "logged in");
    Ok(Json(current))
}

async fn logout(session: Session) -> Result<StatusCode> {
    clear_current_account(&session).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn me(OptionalAuth(account): OptionalAuth) -> Json<MeResponse> {
    Json(MeResponse { account })
}

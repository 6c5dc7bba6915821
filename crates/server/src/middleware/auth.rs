//! Auth extractors and session helpers.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use std::convert::Infallible;
use threadbare_core::{OwnerKey, SessionKey};
use tower_sessions::Session;

use crate::db::admin::AdminRepository;
use crate::error::AppError;
use crate::models::session::{keys, CurrentAccount};
use crate::state::AppState;

async fn current_account(parts: &Parts) -> Result<Option<CurrentAccount>, AppError> {
    let Some(session) = parts.extensions.get::<Session>() else {
        return Err(AppError::Internal("session layer not installed".to_string()));
    };

    session
        .get::<CurrentAccount>(keys::CURRENT_ACCOUNT)
        .await
        .map_err(|e| AppError::Internal(format!("session load failed: {e}")))
}

/// Extractor that rejects the request unless someone is logged in.
pub struct RequireAuth(pub CurrentAccount);

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let account = current_account(parts).await?;
        account
            .map(Self)
            .ok_or_else(|| AppError::Unauthenticated("Must be logged in".to_string()))
    }
}

/// Extractor that yields the logged-in account, if any.
pub struct OptionalAuth(pub Option<CurrentAccount>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(current_account(parts).await.unwrap_or_default()))
    }
}

/// Extractor that rejects the request unless the admin is logged in.
///
/// Every admin route goes through this single guard; handlers never
/// re-check the marker themselves.
pub struct RequireAdmin(pub CurrentAccount);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let account = current_account(parts)
            .await?
            .ok_or_else(|| AppError::Unauthenticated("Must be logged in".to_string()))?;

        let is_admin = AdminRepository::new(state.pool()).is_admin(account.id).await?;
        if !is_admin {
            return Err(AppError::Unauthorized("Admin access required".to_string()));
        }

        Ok(Self(account))
    }
}

/// Store the logged-in account in the session.
///
/// # Errors
///
/// Returns `AppError::Internal` if the session store fails.
pub async fn set_current_account(
    session: &Session,
    account: &CurrentAccount,
) -> Result<(), AppError> {
    session
        .insert(keys::CURRENT_ACCOUNT, account)
        .await
        .map_err(|e| AppError::Internal(format!("session save failed: {e}")))
}

/// Destroy the session, logging the account out.
///
/// # Errors
///
/// Returns `AppError::Internal` if the session store fails.
pub async fn clear_current_account(session: &Session) -> Result<(), AppError> {
    session
        .flush()
        .await
        .map_err(|e| AppError::Internal(format!("session clear failed: {e}")))
}

/// Work out whose cart a request refers to.
///
/// A logged-in account always wins over a supplied session key; an empty
/// session key counts as absent. `None` means the caller has no cart at
/// all, which reads as an empty cart and writes as a no-op.
///
/// # Errors
///
/// Returns `AppError::BadRequest` if the session key is present but
/// malformed.
pub fn resolve_owner(
    account: Option<&CurrentAccount>,
    session_key: Option<&str>,
) -> Result<Option<OwnerKey>, AppError> {
    if let Some(account) = account {
        return Ok(Some(OwnerKey::Account(account.id)));
    }

    match session_key.filter(|key| !key.is_empty()) {
        Some(key) => SessionKey::parse(key)
            .map(|key| Some(OwnerKey::Session(key)))
            .map_err(|e| AppError::BadRequest(e.to_string())),
        None => Ok(None),
    }
}

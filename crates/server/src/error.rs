//! Application error types and HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::auth::AuthError;

/// Top-level application error.
///
/// Every handler returns `Result<T, AppError>`; the `IntoResponse` impl maps
/// each variant to an HTTP status and a plain-text body. Internal details are
/// logged and reported to Sentry but never sent to the client.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::Database(ref err) => match err {
                RepositoryError::NotFound => (StatusCode::NOT_FOUND, "Not found".to_string()),
                RepositoryError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
                RepositoryError::Database(_) | RepositoryError::DataCorruption(_) => {
                    capture_internal(&self);
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "An internal error occurred".to_string(),
                    )
                }
            },
            Self::Auth(ref err) => match err {
                AuthError::InvalidCredentials => {
                    (StatusCode::UNAUTHORIZED, "Invalid credentials".to_string())
                }
                AuthError::AccountAlreadyExists => (
                    StatusCode::CONFLICT,
                    "An account with this email already exists".to_string(),
                ),
                AuthError::WeakPassword(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
                AuthError::InvalidEmail(e) => (StatusCode::BAD_REQUEST, e.to_string()),
                AuthError::Repository(RepositoryError::NotFound) => {
                    (StatusCode::NOT_FOUND, "Not found".to_string())
                }
                AuthError::Repository(RepositoryError::Conflict(msg)) => {
                    (StatusCode::CONFLICT, msg.clone())
                }
                AuthError::Repository(_) | AuthError::PasswordHash => {
                    capture_internal(&self);
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        "An internal error occurred".to_string(),
                    )
                }
            },
            Self::Unauthenticated(msg) => (StatusCode::UNAUTHORIZED, msg),
            Self::Unauthorized(msg) => (StatusCode::FORBIDDEN, msg),
            Self::AlreadyExists(msg) => (StatusCode::CONFLICT, msg),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::Internal(_) => {
                capture_internal(&self);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred".to_string(),
                )
            }
        };

        (status, message).into_response()
    }
}

fn capture_internal(err: &AppError) {
    sentry::capture_error(err);
    tracing::error!(error = %err, "internal server error");
}

/// Convenience alias for handler results.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn status_of(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_unauthenticated_maps_to_401() {
        let err = AppError::Unauthenticated("Must be logged in".to_string());
        assert_eq!(status_of(err), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_unauthorized_maps_to_403() {
        let err = AppError::Unauthorized("Admin access required".to_string());
        assert_eq!(status_of(err), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_already_exists_maps_to_409() {
        let err = AppError::AlreadyExists("Email already subscribed".to_string());
        assert_eq!(status_of(err), StatusCode::CONFLICT);
    }

    #[test]
    fn test_not_found_maps_to_404() {
        let err = AppError::NotFound("Product not found".to_string());
        assert_eq!(status_of(err), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_bad_request_maps_to_400() {
        let err = AppError::BadRequest("quantity must be positive".to_string());
        assert_eq!(status_of(err), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_repository_not_found_maps_to_404() {
        let err = AppError::Database(RepositoryError::NotFound);
        assert_eq!(status_of(err), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_repository_conflict_maps_to_409() {
        let err = AppError::Database(RepositoryError::Conflict(
            "Admin already exists".to_string(),
        ));
        assert_eq!(status_of(err), StatusCode::CONFLICT);
    }

    #[test]
    fn test_data_corruption_hides_details() {
        let err = AppError::Database(RepositoryError::DataCorruption(
            "bad price in row 7".to_string(),
        ));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_invalid_credentials_maps_to_401() {
        let err = AppError::Auth(AuthError::InvalidCredentials);
        assert_eq!(status_of(err), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_account_already_exists_maps_to_409() {
        let err = AppError::Auth(AuthError::AccountAlreadyExists);
        assert_eq!(status_of(err), StatusCode::CONFLICT);
    }

    #[test]
    fn test_weak_password_maps_to_400() {
        let err = AppError::Auth(AuthError::WeakPassword(
            "Password must be at least 8 characters".to_string(),
        ));
        assert_eq!(status_of(err), StatusCode::BAD_REQUEST);
    }
}

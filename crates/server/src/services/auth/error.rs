//! Authentication error types.

use thiserror::Error;
use threadbare_core::EmailError;

use crate::db::RepositoryError;

/// Errors that can occur during authentication.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Email failed validation
    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// Wrong email or password. One variant for both, so responses don't
    /// reveal which emails have accounts.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Email already registered
    #[error("An account with this email already exists")]
    AccountAlreadyExists,

    /// Password failed validation
    #[error("{0}")]
    WeakPassword(String),

    /// Password hashing or parsing failed
    #[error("Password hashing failed")]
    PasswordHash,

    /// Underlying repository error
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

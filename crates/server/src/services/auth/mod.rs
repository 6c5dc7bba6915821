//! Email/password authentication.

mod error;

pub use error::AuthError;

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use sqlx::SqlitePool;
use threadbare_core::Email;

use crate::db::accounts::AccountRepository;
use crate::db::RepositoryError;
use crate::models::Account;

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Validate a password against policy.
///
/// # Errors
///
/// Returns `AuthError::WeakPassword` if the password is too short.
pub fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}

/// Hash a password with Argon2id and a random salt.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|_| AuthError::PasswordHash)?;
    Ok(hash.to_string())
}

/// Verify a password against a stored hash.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if the stored hash is malformed.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
    let parsed = PasswordHash::new(hash).map_err(|_| AuthError::PasswordHash)?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

/// Registration and login against the accounts table.
pub struct AuthService<'a> {
    accounts: AccountRepository<'a>,
}

impl<'a> AuthService<'a> {
    #[must_use]
    pub const fn new(pool: &'a SqlitePool) -> Self {
        Self {
            accounts: AccountRepository::new(pool),
        }
    }

    /// Register a new account.
    ///
    /// The email is trimmed and lowercased before validation, so
    /// `Ada@Example.com` and `ada@example.com` are the same account.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::AccountAlreadyExists` if the email is taken,
    /// `AuthError::InvalidEmail` or `AuthError::WeakPassword` on bad input.
    pub async fn register(&self, email: &str, password: &str) -> Result<Account, AuthError> {
        let normalized = email.trim().to_lowercase();
        let email = Email::parse(&normalized)?;
        validate_password(password)?;

        let password_hash = hash_password(password)?;

        match self.accounts.create(&email, &password_hash).await {
            Ok(account) => Ok(account),
            Err(RepositoryError::Conflict(_)) => Err(AuthError::AccountAlreadyExists),
            Err(e) => Err(AuthError::Repository(e)),
        }
    }

    /// Log in with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` for an unknown email or a
    /// wrong password, without distinguishing the two.
    pub async fn login(&self, email: &str, password: &str) -> Result<Account, AuthError> {
        let normalized = email.trim().to_lowercase();

        let Some(found) = self.accounts.find_by_email(&normalized).await? else {
            return Err(AuthError::InvalidCredentials);
        };

        if !verify_password(password, &found.password_hash)? {
            return Err(AuthError::InvalidCredentials);
        }

        Ok(found.account)
    }
}

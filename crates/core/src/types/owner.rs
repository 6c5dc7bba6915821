//! Cart and order ownership.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::types::id::AccountId;

/// Errors that can occur when parsing a [`SessionKey`].
#[derive(thiserror::Error, Debug, Clone)]
pub enum SessionKeyError {
    /// The input string is empty.
    #[error("session key cannot be empty")]
    Empty,
    /// The input string is too long.
    #[error("session key must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
}

/// A client-generated opaque string that scopes an anonymous cart.
///
/// The client mints one, persists it locally, and sends it with every cart
/// and checkout request made while logged out. The server treats it as an
/// opaque identifier.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct SessionKey(String);

impl SessionKey {
    /// Maximum accepted length.
    pub const MAX_LENGTH: usize = 128;

    /// Parse a `SessionKey` from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty or longer than
    /// [`Self::MAX_LENGTH`].
    pub fn parse(s: &str) -> Result<Self, SessionKeyError> {
        if s.is_empty() {
            return Err(SessionKeyError::Empty);
        }
        if s.len() > Self::MAX_LENGTH {
            return Err(SessionKeyError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        Ok(Self(s.to_owned()))
    }

    /// Returns the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The identity a cart or order belongs to.
///
/// Exactly one of an account id (logged in) or a session key (anonymous).
/// Modeling this as an enum makes the both-set and neither-set states
/// unrepresentable; "no owner at all" is `Option<OwnerKey>::None` at the
/// request boundary.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum OwnerKey {
    /// Owned by a logged-in account.
    Account(AccountId),
    /// Owned by an anonymous browser session.
    Session(SessionKey),
}

impl OwnerKey {
    /// Storage discriminant: `"account"` or `"session"`.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Account(_) => "account",
            Self::Session(_) => "session",
        }
    }

    /// Storage identifier: the account UUID or the raw session key.
    #[must_use]
    pub fn id_string(&self) -> String {
        match self {
            Self::Account(id) => id.to_string(),
            Self::Session(key) => key.as_str().to_owned(),
        }
    }

    /// Reassemble an `OwnerKey` from its stored `(kind, id)` columns.
    ///
    /// # Errors
    ///
    /// Returns a message describing the corrupt column pair.
    pub fn from_parts(kind: &str, id: &str) -> Result<Self, String> {
        match kind {
            "account" => id
                .parse()
                .map(Self::Account)
                .map_err(|e| format!("invalid account id {id:?}: {e}")),
            "session" => SessionKey::parse(id)
                .map(Self::Session)
                .map_err(|e| format!("invalid session key: {e}")),
            other => Err(format!("unknown owner kind {other:?}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_session_key_bounds() {
        assert!(matches!(SessionKey::parse(""), Err(SessionKeyError::Empty)));
        assert!(matches!(
            SessionKey::parse(&"k".repeat(129)),
            Err(SessionKeyError::TooLong { .. })
        ));
        assert!(SessionKey::parse(&"k".repeat(128)).is_ok());
    }

    #[test]
    fn test_from_parts_roundtrip() {
        let account = OwnerKey::Account(AccountId::new());
        let rebuilt = OwnerKey::from_parts(account.kind(), &account.id_string()).unwrap();
        assert_eq!(rebuilt, account);

        let session = OwnerKey::Session(SessionKey::parse("cart-abc123").unwrap());
        let rebuilt = OwnerKey::from_parts(session.kind(), &session.id_string()).unwrap();
        assert_eq!(rebuilt, session);
    }

    #[test]
    fn test_from_parts_rejects_corrupt_columns() {
        assert!(OwnerKey::from_parts("basket", "x").is_err());
        assert!(OwnerKey::from_parts("account", "not-a-uuid").is_err());
        assert!(OwnerKey::from_parts("session", "").is_err());
    }

    #[test]
    fn test_serde_shape() {
        let session = OwnerKey::Session(SessionKey::parse("s-1").unwrap());
        let json = serde_json::to_string(&session).unwrap();
        assert_eq!(json, r#"{"kind":"session","id":"s-1"}"#);
    }
}

//! Validated email address newtype.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Why a string failed to parse as an [`Email`].
#[derive(thiserror::Error, Debug, Clone)]
pub enum EmailError {
    /// The input string is empty.
    #[error("email cannot be empty")]
    Empty,
    /// The input exceeds the RFC 5321 length cap.
    #[error("email exceeds {} characters", Email::MAX_LENGTH)]
    TooLong,
    /// The input has no @ sign.
    #[error("email must contain '@'")]
    MissingAt,
    /// Nothing before the @ sign.
    #[error("email is missing the part before '@'")]
    BlankLocal,
    /// Nothing after the @ sign.
    #[error("email is missing the domain after '@'")]
    BlankDomain,
}

/// An email address that passed structural validation.
///
/// Validation is deliberately shallow: the address must be non-empty, fit
/// the RFC 5321 length cap, and have text on both sides of an @ sign. The
/// accepted string is kept byte-for-byte; callers wanting case-insensitive
/// matching normalize before parsing.
///
/// ```
/// use threadbare_core::Email;
///
/// assert!(Email::parse("orders@tshirtstore.com").is_ok());
/// assert!(Email::parse("jane.doe+cart@shop.example").is_ok());
///
/// assert!(Email::parse("").is_err());
/// assert!(Email::parse("no-at-sign").is_err());
/// assert!(Email::parse("@shop.example").is_err());
/// assert!(Email::parse("jane@").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    /// Maximum length of an email address (RFC 5321).
    pub const MAX_LENGTH: usize = 254;

    /// Parse an `Email`, rejecting structurally invalid input.
    ///
    /// # Errors
    ///
    /// Returns an [`EmailError`] naming the first structural problem found:
    /// empty input, oversized input, a missing @ sign, or a blank local
    /// part or domain.
    pub fn parse(s: &str) -> Result<Self, EmailError> {
        if s.is_empty() {
            return Err(EmailError::Empty);
        }
        if s.len() > Self::MAX_LENGTH {
            return Err(EmailError::TooLong);
        }

        let (local, domain) = s.split_once('@').ok_or(EmailError::MissingAt)?;
        if local.is_empty() {
            return Err(EmailError::BlankLocal);
        }
        if domain.is_empty() {
            return Err(EmailError::BlankDomain);
        }

        Ok(Self(s.to_owned()))
    }

    /// The address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `Email`, returning the inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Email {
    type Err = EmailError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

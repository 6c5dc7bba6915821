//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `THREADBARE_DATABASE_URL` - `SQLite` connection string (falls back to `DATABASE_URL`)
//! - `THREADBARE_BASE_URL` - Public URL for the storefront
//! - `THREADBARE_SESSION_SECRET` - Session secret (min 32 chars, high entropy)
//!
//! ## Optional
//! - `THREADBARE_HOST` - Bind address (default: 127.0.0.1)
//! - `THREADBARE_PORT` - Listen port (default: 3000)
//! - `THREADBARE_OUTBOX_POLL_SECS` - Outbox worker poll interval (default: 30)
//! - `THREADBARE_OUTBOX_MAX_ATTEMPTS` - Send attempts before a job is parked (default: 5)
//! - `SMTP_HOST` / `SMTP_PORT` / `SMTP_USERNAME` / `SMTP_PASSWORD` - SMTP relay;
//!   when `SMTP_HOST` is unset, order confirmations are logged instead of sent
//! - `EMAIL_FROM_ADDRESS` - From header (default: `T-Shirt Store <orders@tshirtstore.com>`)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment tag
//! - `SENTRY_SAMPLE_RATE` - Error sample rate (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Trace sample rate (default: 0.0)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;

const SESSION_SECRET_MIN_LEN: usize = 32;
const SECRET_MIN_BITS_PER_CHAR: f64 = 3.3;

/// Fragments that betray a copy-pasted placeholder secret (matched lowercase).
const PLACEHOLDER_FRAGMENTS: &[&str] = &[
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "your-",
    "enter-",
    "put-your",
    "add-your",
    "insert",
    "todo",
    "fixme",
    "xxx",
];

/// Configuration errors surfaced at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("environment variable {0} is not set")]
    MissingEnvVar(String),
    #[error("environment variable {0} is invalid: {1}")]
    InvalidEnvVar(String, String),
    #[error("insecure value in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Server application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// `SQLite` database connection URL
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL for the storefront
    pub base_url: String,
    /// Session secret
    pub session_secret: SecretString,
    /// SMTP relay configuration; `None` means log-only email delivery
    pub email: Option<EmailConfig>,
    /// From header for outgoing mail
    pub email_from_address: String,
    /// Notification outbox worker configuration
    pub outbox: OutboxConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment tag (e.g. "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate
    pub sentry_sample_rate: f32,
    /// Sentry trace sample rate
    pub sentry_traces_sample_rate: f32,
}

/// SMTP relay configuration.
///
/// Implements `Debug` manually to redact the password.
#[derive(Clone)]
pub struct EmailConfig {
    /// SMTP relay hostname
    pub smtp_host: String,
    /// SMTP relay port
    pub smtp_port: u16,
    /// SMTP username
    pub smtp_username: String,
    /// SMTP password
    pub smtp_password: SecretString,
}

impl std::fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailConfig")
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("smtp_username", &self.smtp_username)
            .field("smtp_password", &"[REDACTED]")
            .finish()
    }
}

/// Notification outbox worker configuration.
#[derive(Debug, Clone, Copy)]
pub struct OutboxConfig {
    /// How long the worker sleeps between polls when idle.
    pub poll_interval: Duration,
    /// Send attempts before a job is parked as failed.
    pub max_attempts: u32,
}

impl Default for OutboxConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(30),
            max_attempts: 5,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Ok(Self {
            database_url: database_url_from_env()?,
            host: parse_env("THREADBARE_HOST", "127.0.0.1")?,
            port: parse_env("THREADBARE_PORT", "3000")?,
            base_url: require_env("THREADBARE_BASE_URL")?,
            session_secret: session_secret_from_env("THREADBARE_SESSION_SECRET")?,
            email: EmailConfig::from_env()?,
            email_from_address: env_or(
                "EMAIL_FROM_ADDRESS",
                "T-Shirt Store <orders@tshirtstore.com>",
            ),
            outbox: OutboxConfig::from_env()?,
            sentry_dsn: maybe_env("SENTRY_DSN"),
            sentry_environment: maybe_env("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: parse_env("SENTRY_SAMPLE_RATE", "1.0")?,
            sentry_traces_sample_rate: parse_env("SENTRY_TRACES_SAMPLE_RATE", "0.0")?,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl EmailConfig {
    /// Load SMTP configuration, or `None` when `SMTP_HOST` is unset.
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let Some(smtp_host) = maybe_env("SMTP_HOST") else {
            return Ok(None);
        };
        let smtp_password = SecretString::from(require_env("SMTP_PASSWORD")?);

        Ok(Some(Self {
            smtp_host,
            smtp_port: parse_env("SMTP_PORT", "587")?,
            smtp_username: require_env("SMTP_USERNAME")?,
            smtp_password,
        }))
    }
}

impl OutboxConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            poll_interval: Duration::from_secs(parse_env("THREADBARE_OUTBOX_POLL_SECS", "30")?),
            max_attempts: parse_env("THREADBARE_OUTBOX_MAX_ATTEMPTS", "5")?,
        })
    }
}

/// A required environment variable.
fn require_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// An optional environment variable.
fn maybe_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// An environment variable with a fallback default.
fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable, falling back to `default` when unset.
fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    env_or(key, default)
        .parse()
        .map_err(|e: T::Err| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Database URL with the service-specific variable taking precedence over
/// the bare `DATABASE_URL` that sqlx tooling reads.
fn database_url_from_env() -> Result<SecretString, ConfigError> {
    ["THREADBARE_DATABASE_URL", "DATABASE_URL"]
        .iter()
        .find_map(|key| std::env::var(key).ok())
        .map(SecretString::from)
        .ok_or_else(|| ConfigError::MissingEnvVar("THREADBARE_DATABASE_URL".to_string()))
}

fn session_secret_from_env(key: &str) -> Result<SecretString, ConfigError> {
    let value = require_env(key)?;
    vet_session_secret(&value, key)?;
    Ok(SecretString::from(value))
}

/// Reject session secrets that are too short, placeholder-looking, or
/// low-entropy.
fn vet_session_secret(value: &str, key: &str) -> Result<(), ConfigError> {
    if value.len() < SESSION_SECRET_MIN_LEN {
        return Err(ConfigError::InsecureSecret(
            key.to_string(),
            format!(
                "must be at least {SESSION_SECRET_MIN_LEN} characters (got {})",
                value.len()
            ),
        ));
    }
    reject_weak_secret(value, key)
}

fn reject_weak_secret(value: &str, key: &str) -> Result<(), ConfigError> {
    let lower = value.to_lowercase();
    if let Some(fragment) = PLACEHOLDER_FRAGMENTS.iter().find(|f| lower.contains(**f)) {
        return Err(ConfigError::InsecureSecret(
            key.to_string(),
            format!("looks like a placeholder (contains '{fragment}')"),
        ));
    }

    let bits = entropy_bits_per_char(value);
    if bits < SECRET_MIN_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            key.to_string(),
            format!(
                "entropy too low ({bits:.2} bits/char, need >= {SECRET_MIN_BITS_PER_CHAR:.1}); generate a random value"
            ),
        ));
    }
    Ok(())
}

/// Shannon entropy in bits per character.
fn entropy_bits_per_char(value: &str) -> f64 {
    if value.is_empty() {
        return 0.0;
    }

    let mut counts: HashMap<char, f64> = HashMap::new();
    for c in value.chars() {
        *counts.entry(c).or_insert(0.0) += 1.0;
    }
    let total: f64 = counts.values().sum();

    counts
        .values()
        .map(|count| {
            let p = count / total;
            -p * p.log2()
        })
        .sum()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_entropy_of_empty_and_uniform_strings_is_zero() {
        assert!(entropy_bits_per_char("").abs() < f64::EPSILON);
        assert!(entropy_bits_per_char("aaaaaaa").abs() < f64::EPSILON);
    }

    #[test]
    fn test_entropy_of_two_even_symbols_is_one_bit() {
        assert!((entropy_bits_per_char("abab") - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_random_looking_secret_clears_the_entropy_bar() {
        assert!(entropy_bits_per_char("aB3$xY9!mK2@nL5#") > SECRET_MIN_BITS_PER_CHAR);
    }

    #[test]
    fn test_placeholder_secrets_are_rejected() {
        for value in ["your-session-key-here", "changeme123"] {
            let err = reject_weak_secret(value, "TEST_VAR").unwrap_err();
            assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
        }
    }

    #[test]
    fn test_low_entropy_secret_is_rejected() {
        let err = reject_weak_secret("abababababababababababababababab", "TEST_VAR").unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
    }

    #[test]
    fn test_strong_secret_passes_vetting() {
        assert!(reject_weak_secret("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6", "TEST_VAR").is_ok());
    }

    #[test]
    fn test_short_session_secret_is_rejected() {
        let err = vet_session_secret("short", "TEST_SESSION").unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
    }

    #[test]
    fn test_long_random_session_secret_is_accepted() {
        assert!(vet_session_secret("qL8vR2mWkE5tZ7xJ3cN9bA4dF6gH1pYu", "TEST_SESSION").is_ok());
    }

    #[test]
    fn test_socket_addr_combines_host_and_port() {
        let config = Config {
            database_url: SecretString::from("sqlite://threadbare.db"),
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: "http://localhost:3000".to_string(),
            session_secret: SecretString::from("x".repeat(32)),
            email: None,
            email_from_address: "T-Shirt Store <orders@tshirtstore.com>".to_string(),
            outbox: OutboxConfig::default(),
            sentry_dsn: None,
            sentry_environment: None,
            sentry_sample_rate: 1.0,
            sentry_traces_sample_rate: 0.0,
        };

        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 3000);
    }

    #[test]
    fn test_email_config_debug_redacts_password() {
        let config = EmailConfig {
            smtp_host: "smtp.example.com".to_string(),
            smtp_port: 587,
            smtp_username: "mailer".to_string(),
            smtp_password: SecretString::from("super_secret_smtp_password"),
        };

        let debug_output = format!("{config:?}");

        assert!(debug_output.contains("smtp.example.com"));
        assert!(debug_output.contains("mailer"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret_smtp_password"));
    }
}

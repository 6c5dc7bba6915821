//! Integration tests for Threadbare.
//!
//! Each test spawns the full axum application on an ephemeral local port
//! with a fresh in-memory `SQLite` database, then drives it over HTTP the
//! same way the storefront client would. No external services are needed:
//! order confirmations run through the log-only mailer.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p threadbare-integration-tests
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

use threadbare_server::config::{Config, OutboxConfig};
use threadbare_server::db::MIGRATOR;
use threadbare_server::services::email::Mailer;
use threadbare_server::services::outbox;
use threadbare_server::state::AppState;

/// A running application instance under test.
pub struct TestApp {
    /// Address the server is listening on.
    pub address: SocketAddr,
    /// Handle to the application database, for direct fixture setup
    /// and assertions the API does not expose.
    pub pool: SqlitePool,
    /// Shared state the server and outbox worker run on.
    pub state: AppState,
}

impl TestApp {
    /// Spawn the application with a fresh in-memory database.
    ///
    /// The outbox worker is spawned too, so placing an order drives the
    /// confirmation email all the way through the log-only mailer.
    ///
    /// # Panics
    ///
    /// Panics if any part of the stack fails to start; no test can
    /// proceed without it.
    pub async fn spawn() -> Self {
        let pool = memory_pool().await;
        MIGRATOR.run(&pool).await.expect("Failed to run migrations");

        let state = AppState::new(test_config(), pool.clone(), Mailer::Log);

        let app = threadbare_server::app(state.clone())
            .await
            .expect("Failed to assemble application");

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let address = listener
            .local_addr()
            .expect("Failed to read listener address");

        tokio::spawn(async move {
            axum::serve(listener, app)
                .await
                .expect("Test server stopped unexpectedly");
        });
        outbox::spawn(state.clone());

        Self {
            address,
            pool,
            state,
        }
    }

    /// HTTP client with a cookie store, so sessions persist across
    /// requests like they would in a browser.
    ///
    /// # Panics
    ///
    /// Panics if the client cannot be constructed.
    #[must_use]
    pub fn client(&self) -> reqwest::Client {
        reqwest::Client::builder()
            .cookie_store(true)
            .build()
            .expect("Failed to create HTTP client")
    }

    /// Absolute URL for an API path.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.address)
    }
}

/// Poll the outbox until the confirmation job for `order_id` leaves the
/// pending state, returning its final status (`sent` or `failed`).
///
/// # Panics
///
/// Panics if the job does not settle within five seconds, or if no job
/// exists for the order by then.
pub async fn wait_for_confirmation(pool: &SqlitePool, order_id: &str) -> String {
    for _ in 0..100 {
        let status: Option<String> =
            sqlx::query_scalar("SELECT status FROM notification_outbox WHERE order_id = ?1")
                .bind(order_id)
                .fetch_optional(pool)
                .await
                .expect("Failed to query outbox");

        if let Some(status) = status
            && status != "pending"
        {
            return status;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("Confirmation job for order {order_id} did not settle");
}

/// Configuration for a test instance. The port is irrelevant (tests bind
/// their own ephemeral listener) and the plain-HTTP base URL keeps the
/// session cookie usable without TLS.
fn test_config() -> Config {
    Config {
        database_url: SecretString::from("sqlite::memory:"),
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 0,
        base_url: "http://localhost".to_string(),
        session_secret: SecretString::from("qL8vR2mWkE5tZ7xJ3cN9bA4dF6gH1pYu"),
        email: None,
        email_from_address: "T-Shirt Store <orders@tshirtstore.com>".to_string(),
        outbox: OutboxConfig {
            poll_interval: Duration::from_millis(200),
            max_attempts: 5,
        },
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 1.0,
        sentry_traces_sample_rate: 0.0,
    }
}

/// In-memory pool on a single never-recycled connection, which keeps the
/// database alive for the life of the pool.
async fn memory_pool() -> SqlitePool {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .expect("Failed to parse connection options")
        .foreign_keys(true);

    SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await
        .expect("Failed to open in-memory database")
}

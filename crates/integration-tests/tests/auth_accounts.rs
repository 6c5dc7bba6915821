//! Integration tests for account registration, login, and sessions.

use reqwest::{Client, StatusCode};
use serde_json::{json, Value};

use threadbare_integration_tests::TestApp;

async fn register(app: &TestApp, client: &Client, email: &str, password: &str) -> reqwest::Response {
    client
        .post(app.url("/api/auth/register"))
        .json(&json!({ "email": email, "password": password }))
        .send()
        .await
        .expect("Failed to register")
}

async fn login(app: &TestApp, client: &Client, email: &str, password: &str) -> reqwest::Response {
    client
        .post(app.url("/api/auth/login"))
        .json(&json!({ "email": email, "password": password }))
        .send()
        .await
        .expect("Failed to log in")
}

async fn me(app: &TestApp, client: &Client) -> Value {
    let resp = client
        .get(app.url("/api/auth/me"))
        .send()
        .await
        .expect("Failed to fetch current account");
    assert_eq!(resp.status(), StatusCode::OK);
    resp.json().await.expect("Failed to parse me response")
}

// ============================================================================
// Registration
// ============================================================================

#[tokio::test]
async fn test_register_creates_session() {
    let app = TestApp::spawn().await;
    let client = app.client();

    let resp = register(&app, &client, "new@example.com", "hunter2hunter2").await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let account: Value = resp.json().await.expect("Failed to parse account");
    assert_eq!(account["email"], "new@example.com");

    let body = me(&app, &client).await;
    assert_eq!(body["account"]["email"], "new@example.com");
    assert_eq!(body["account"]["id"], account["id"]);
}

#[tokio::test]
async fn test_register_duplicate_email_conflicts() {
    let app = TestApp::spawn().await;
    let client = app.client();

    register(&app, &client, "dup@example.com", "hunter2hunter2").await;
    let resp = register(&app, &app.client(), "dup@example.com", "anotherpassword").await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_register_normalizes_email() {
    let app = TestApp::spawn().await;
    let client = app.client();

    let resp = register(&app, &client, "  Mixed.Case@Example.COM ", "hunter2hunter2").await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let account: Value = resp.json().await.expect("Failed to parse account");
    assert_eq!(account["email"], "mixed.case@example.com");

    // The normalized form logs in
    let other = app.client();
    let resp = login(&app, &other, "mixed.case@example.com", "hunter2hunter2").await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_register_rejects_weak_password() {
    let app = TestApp::spawn().await;
    let resp = register(&app, &app.client(), "weak@example.com", "short").await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_register_rejects_invalid_email() {
    let app = TestApp::spawn().await;
    let resp = register(&app, &app.client(), "not-an-email", "hunter2hunter2").await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// ============================================================================
// Login & Logout
// ============================================================================

#[tokio::test]
async fn test_login_logout_flow() {
    let app = TestApp::spawn().await;
    let client = app.client();
    register(&app, &client, "flow@example.com", "hunter2hunter2").await;

    let resp = client
        .post(app.url("/api/auth/logout"))
        .send()
        .await
        .expect("Failed to log out");
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(me(&app, &client).await["account"].is_null());

    let resp = login(&app, &client, "flow@example.com", "hunter2hunter2").await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        me(&app, &client).await["account"]["email"],
        "flow@example.com"
    );
}

#[tokio::test]
async fn test_login_wrong_password_unauthorized() {
    let app = TestApp::spawn().await;
    let client = app.client();
    register(&app, &client, "victim@example.com", "hunter2hunter2").await;

    let resp = login(&app, &app.client(), "victim@example.com", "wrongpassword").await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_login_unknown_account_unauthorized() {
    let app = TestApp::spawn().await;
    let resp = login(&app, &app.client(), "ghost@example.com", "hunter2hunter2").await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_me_without_session() {
    let app = TestApp::spawn().await;
    let body = me(&app, &app.client()).await;
    assert!(body["account"].is_null());
}

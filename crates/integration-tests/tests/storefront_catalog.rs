//! Integration tests for the public product catalog.

use reqwest::{Client, StatusCode};
use serde_json::Value;

use threadbare_integration_tests::TestApp;

/// Seed the sample catalog and return the active products.
async fn seed_catalog(app: &TestApp, client: &Client) -> Vec<Value> {
    let resp = client
        .post(app.url("/api/products/seed"))
        .send()
        .await
        .expect("Failed to seed catalog");
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = client
        .get(app.url("/api/products"))
        .send()
        .await
        .expect("Failed to list products");
    assert_eq!(resp.status(), StatusCode::OK);
    resp.json().await.expect("Failed to parse product list")
}

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
async fn test_health_endpoints() {
    let app = TestApp::spawn().await;
    let client = app.client();

    let resp = client
        .get(app.url("/health"))
        .send()
        .await
        .expect("Failed to reach health endpoint");
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = client
        .get(app.url("/health/ready"))
        .send()
        .await
        .expect("Failed to reach readiness endpoint");
    assert_eq!(resp.status(), StatusCode::OK);
}

// ============================================================================
// Seeding
// ============================================================================

#[tokio::test]
async fn test_seed_is_idempotent() {
    let app = TestApp::spawn().await;
    let client = app.client();

    let resp = client
        .post(app.url("/api/products/seed"))
        .send()
        .await
        .expect("Failed to seed catalog");
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("Failed to parse seed response");
    assert_eq!(body["seeded"], true);

    let resp = client
        .post(app.url("/api/products/seed"))
        .send()
        .await
        .expect("Failed to re-seed catalog");
    let body: Value = resp.json().await.expect("Failed to parse seed response");
    assert_eq!(body["seeded"], false);

    let products = seed_catalog(&app, &client).await;
    assert_eq!(products.len(), 3);
}

#[tokio::test]
async fn test_sample_catalog_contents() {
    let app = TestApp::spawn().await;
    let client = app.client();

    let products = seed_catalog(&app, &client).await;

    let mut names: Vec<&str> = products
        .iter()
        .map(|p| p["name"].as_str().expect("product name"))
        .collect();
    names.sort_unstable();
    assert_eq!(
        names,
        ["Classic White Tee", "Graphic Print Tee", "V-Neck Basic Tee"]
    );

    for product in &products {
        assert_eq!(product["is_active"], true);
        let price = product["price"].as_str().expect("price is a string");
        match product["name"].as_str().expect("product name") {
            "Classic White Tee" => {
                assert_eq!(price, "15.00");
                assert_eq!(product["category"], "Basic");
            }
            "Graphic Print Tee" => {
                assert_eq!(price, "22.50");
                assert_eq!(product["category"], "Graphic");
            }
            "V-Neck Basic Tee" => {
                assert_eq!(price, "18.00");
                assert_eq!(product["category"], "Basic");
            }
            other => panic!("Unexpected product: {other}"),
        }
    }
}

// ============================================================================
// Product Detail
// ============================================================================

#[tokio::test]
async fn test_product_detail_matches_listing() {
    let app = TestApp::spawn().await;
    let client = app.client();

    let products = seed_catalog(&app, &client).await;
    let first = &products[0];
    let id = first["id"].as_str().expect("product id");

    let resp = client
        .get(app.url(&format!("/api/products/{id}")))
        .send()
        .await
        .expect("Failed to fetch product detail");
    assert_eq!(resp.status(), StatusCode::OK);

    let detail: Value = resp.json().await.expect("Failed to parse product");
    assert_eq!(&detail, first);
}

#[tokio::test]
async fn test_unknown_product_is_not_found() {
    let app = TestApp::spawn().await;
    let client = app.client();

    let resp = client
        .get(app.url(&format!("/api/products/{}", uuid::Uuid::new_v4())))
        .send()
        .await
        .expect("Failed to fetch product detail");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_malformed_product_id_is_rejected() {
    let app = TestApp::spawn().await;
    let client = app.client();

    let resp = client
        .get(app.url("/api/products/not-a-uuid"))
        .send()
        .await
        .expect("Failed to fetch product detail");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// ============================================================================
// Active Flag
// ============================================================================

#[tokio::test]
async fn test_inactive_product_hidden_from_storefront() {
    let app = TestApp::spawn().await;
    let client = app.client();

    let products = seed_catalog(&app, &client).await;
    let hidden_id = products[0]["id"].as_str().expect("product id").to_string();

    sqlx::query("UPDATE products SET is_active = 0 WHERE id = ?1")
        .bind(&hidden_id)
        .execute(&app.pool)
        .await
        .expect("Failed to deactivate product");

    let resp = client
        .get(app.url("/api/products"))
        .send()
        .await
        .expect("Failed to list products");
    let listing: Vec<Value> = resp.json().await.expect("Failed to parse product list");
    assert_eq!(listing.len(), 2);
    assert!(listing.iter().all(|p| p["id"] != hidden_id.as_str()));

    let resp = client
        .get(app.url(&format!("/api/products/{hidden_id}")))
        .send()
        .await
        .expect("Failed to fetch product detail");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

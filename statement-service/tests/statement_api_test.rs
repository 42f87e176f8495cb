//! Integration tests for the /api/statements HTTP surface.

mod common;

use common::TestApp;
use reqwest::{Client, StatusCode};
use serde_json::json;

#[tokio::test]
async fn health_check_works() {
    let app = TestApp::spawn().await;
    let client = Client::new();

    let response = client
        .get(format!("{}/health", app.address))
        .send()
        .await
        .expect("Failed to execute request");

    assert!(response.status().is_success());

    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "statement-service");
}

#[tokio::test]
async fn get_without_id_returns_400() {
    let app = TestApp::spawn().await;
    let client = Client::new();

    let response = client
        .get(format!("{}/api/statements", app.address))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn get_unknown_id_returns_404() {
    let app = TestApp::spawn().await;
    let client = Client::new();

    let response = client
        .get(format!("{}/api/statements", app.address))
        .query(&[("id", "does-not-exist")])
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unsupported_method_returns_405() {
    let app = TestApp::spawn().await;
    let client = Client::new();

    let response = client
        .put(format!("{}/api/statements", app.address))
        .json(&json!({}))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn post_malformed_body_returns_400() {
    let app = TestApp::spawn().await;
    let client = Client::new();

    let response = client
        .post(format!("{}/api/statements", app.address))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn post_invalid_statement_returns_400() {
    let app = TestApp::spawn().await;
    let client = Client::new();

    let response = client
        .post(format!("{}/api/statements", app.address))
        .json(&json!({
            "source_name": "bank",
            "total_amount": 0,
            "currency": "USD"
        }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn post_then_get_round_trips_with_synthetic_transaction() {
    let app = TestApp::spawn().await;
    let client = Client::new();

    let response = client
        .post(format!("{}/api/statements", app.address))
        .json(&json!({
            "source_name": "bank",
            "total_amount": 100.0,
            "currency": "USD"
        }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::CREATED);

    let location = response
        .headers()
        .get("location")
        .expect("Missing Location header")
        .to_str()
        .unwrap()
        .to_string();
    assert!(location.starts_with("/api/statements?id=bank_"));

    let response = client
        .get(format!("{}{}", app.address, location))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::OK);

    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["total_amount"], 100.0);
    assert_eq!(body["currency"], "USD");

    let transactions = body["transactions"].as_array().expect("No transactions");
    assert_eq!(transactions.len(), 1);
    assert_eq!(transactions[0]["amount"], 100.0);
    assert_eq!(transactions[0]["description"], "Total Amount");

    // internal fields never leak into the JSON surface
    assert!(transactions[0].get("statement_id").is_none());
    assert!(transactions[0].get("payment_source").is_none());
}

#[tokio::test]
async fn post_with_expansion_requires_transactions_field() {
    let app = TestApp::spawn().await;
    let client = Client::new();

    let response = client
        .post(format!("{}/api/statements", app.address))
        .query(&[("$expand", "transactions")])
        .json(&json!({
            "source_name": "bank",
            "total_amount": 100.0,
            "currency": "USD"
        }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn reingestion_with_fewer_transactions_shrinks_persisted_set() {
    let app = TestApp::spawn().await;
    let client = Client::new();

    let response = client
        .post(format!("{}/api/statements", app.address))
        .query(&[("$expand", "transactions")])
        .json(&json!({
            "source_name": "bank",
            "source_id": "s1",
            "total_amount": 100.0,
            "currency": "USD",
            "transactions": [
                {"id": "t1", "amount": 40.0},
                {"id": "t2", "amount": 60.0}
            ]
        }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::CREATED);

    // same statement, t2 gone from the source
    let response = client
        .post(format!("{}/api/statements", app.address))
        .query(&[("$expand", "transactions")])
        .json(&json!({
            "source_name": "bank",
            "source_id": "s1",
            "total_amount": 40.0,
            "currency": "USD",
            "transactions": [
                {"id": "t1", "amount": 40.0}
            ]
        }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = client
        .get(format!("{}/api/statements", app.address))
        .query(&[("id", "bank_s1"), ("$expand", "transactions")])
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::OK);

    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    let transactions = body["transactions"].as_array().expect("No transactions");
    assert_eq!(transactions.len(), 1);
    assert_eq!(transactions[0]["id"], "t1");
    assert_eq!(transactions[0]["amount"], 40.0);

    // verify the persisted statement directly
    let stored = app
        .repository
        .get_statement("bank_s1")
        .await
        .unwrap()
        .expect("Statement not found in repository");
    assert_eq!(stored.total_amount, 40.0);
}

#[tokio::test]
async fn expand_fetches_reconciled_transactions_over_snapshot() {
    let app = TestApp::spawn().await;
    let client = Client::new();

    // saved without expansion: nothing reconciled into the transactions store
    let response = client
        .post(format!("{}/api/statements", app.address))
        .json(&json!({
            "source_name": "bank",
            "source_id": "s2",
            "total_amount": 55.0,
            "currency": "USD"
        }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = client
        .get(format!("{}/api/statements", app.address))
        .query(&[("id", "bank_s2"), ("$expand", "transactions")])
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status(), StatusCode::OK);

    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    let transactions = body["transactions"].as_array().expect("No transactions");
    assert!(transactions.is_empty());
}

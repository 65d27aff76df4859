//! Credit balance, spend, and grant integration tests.

mod common;

use common::{TestHarness, TEST_SERVICE_KEY};
use serde_json::json;

// ============================================================================
// Balance
// ============================================================================

#[tokio::test]
async fn get_balance_starts_at_zero() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .get("/v1/credits/balance")
        .add_header("authorization", harness.user_auth_header())
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["balance"], 0);
    assert_eq!(body["total_purchased"], 0);
    assert_eq!(body["total_spent"], 0);
}

#[tokio::test]
async fn get_balance_without_auth_fails() {
    let harness = TestHarness::new();

    let response = harness.server.get("/v1/credits/balance").await;

    response.assert_status_unauthorized();
}

#[tokio::test]
async fn get_balance_with_garbage_token_fails() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .get("/v1/credits/balance")
        .add_header("authorization", "Bearer not-a-jwt")
        .await;

    response.assert_status_unauthorized();
}

// ============================================================================
// Package catalog
// ============================================================================

#[tokio::test]
async fn list_packages_is_public() {
    let harness = TestHarness::new();

    let response = harness.server.get("/v1/credits/packages").await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    let packages = body.as_array().unwrap();
    assert_eq!(packages.len(), 4);

    let ids: Vec<_> = packages.iter().map(|p| p["id"].as_str().unwrap()).collect();
    assert_eq!(ids, ["basic", "popular", "premium", "mega"]);

    let popular = &packages[1];
    assert_eq!(popular["credits"], 25);
    assert_eq!(popular["bonus"], 5);
    assert_eq!(popular["popular"], true);
    assert_eq!(popular["currency"], "ARS");
}

// ============================================================================
// Grant (operator)
// ============================================================================

#[tokio::test]
async fn grant_credits_success() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .post("/v1/credits/grant")
        .add_header("x-api-key", TEST_SERVICE_KEY)
        .add_header("x-service-name", "support-tools")
        .json(&json!({
            "user_id": harness.test_user_id.to_string(),
            "amount": 50,
            "reason": "Compensation for outage"
        }))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["balance"], 50);

    // Grants do not count as purchases
    let response = harness
        .server
        .get("/v1/credits/balance")
        .add_header("authorization", harness.user_auth_header())
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["balance"], 50);
    assert_eq!(body["total_purchased"], 0);
}

#[tokio::test]
async fn grant_credits_without_api_key_fails() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .post("/v1/credits/grant")
        .json(&json!({
            "user_id": harness.test_user_id.to_string(),
            "amount": 50,
            "reason": "Test"
        }))
        .await;

    response.assert_status_unauthorized();
}

#[tokio::test]
async fn grant_credits_with_wrong_api_key_fails() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .post("/v1/credits/grant")
        .add_header("x-api-key", "wrong-key")
        .json(&json!({
            "user_id": harness.test_user_id.to_string(),
            "amount": 50,
            "reason": "Test"
        }))
        .await;

    response.assert_status_unauthorized();
}

#[tokio::test]
async fn grant_credits_invalid_user_fails() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .post("/v1/credits/grant")
        .add_header("x-api-key", TEST_SERVICE_KEY)
        .json(&json!({
            "user_id": "not-a-uuid",
            "amount": 50,
            "reason": "Test"
        }))
        .await;

    response.assert_status_bad_request();
}

// ============================================================================
// Spend
// ============================================================================

async fn grant(harness: &TestHarness, amount: i64) {
    harness
        .server
        .post("/v1/credits/grant")
        .add_header("x-api-key", TEST_SERVICE_KEY)
        .json(&json!({
            "user_id": harness.test_user_id.to_string(),
            "amount": amount,
            "reason": "Test seed"
        }))
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn spend_deducts_and_appends_transaction() {
    let harness = TestHarness::new();
    grant(&harness, 20).await;

    let response = harness
        .server
        .post("/v1/credits/spend")
        .add_header("authorization", harness.user_auth_header())
        .json(&json!({
            "amount": 8,
            "description": "superlike"
        }))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["balance"], 12);

    let response = harness
        .server
        .get("/v1/credits/balance")
        .add_header("authorization", harness.user_auth_header())
        .await;
    let body: serde_json::Value = response.json();
    assert_eq!(body["balance"], 12);
    assert_eq!(body["total_spent"], 8);
}

#[tokio::test]
async fn spend_more_than_balance_fails_with_payment_required() {
    let harness = TestHarness::new();
    grant(&harness, 5).await;

    let response = harness
        .server
        .post("/v1/credits/spend")
        .add_header("authorization", harness.user_auth_header())
        .json(&json!({
            "amount": 10,
            "description": "boost"
        }))
        .await;

    response.assert_status(axum::http::StatusCode::PAYMENT_REQUIRED);
    let body: serde_json::Value = response.json();
    assert_eq!(body["error"]["code"], "insufficient_credits");
    assert_eq!(body["error"]["details"]["balance"], 5);
    assert_eq!(body["error"]["details"]["required"], 10);

    // Balance unchanged, no transaction appended
    let response = harness
        .server
        .get("/v1/credits/balance")
        .add_header("authorization", harness.user_auth_header())
        .await;
    let body: serde_json::Value = response.json();
    assert_eq!(body["balance"], 5);
    assert_eq!(body["total_spent"], 0);

    let response = harness
        .server
        .get("/v1/credits/transactions")
        .add_header("authorization", harness.user_auth_header())
        .await;
    let body: serde_json::Value = response.json();
    // Only the seed grant is present
    assert_eq!(body["transactions"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn spend_exact_balance_reaches_zero() {
    let harness = TestHarness::new();
    grant(&harness, 10).await;

    let response = harness
        .server
        .post("/v1/credits/spend")
        .add_header("authorization", harness.user_auth_header())
        .json(&json!({
            "amount": 10,
            "description": "boost"
        }))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["balance"], 0);

    // The next spend finds nothing left
    let response = harness
        .server
        .post("/v1/credits/spend")
        .add_header("authorization", harness.user_auth_header())
        .json(&json!({
            "amount": 1,
            "description": "boost"
        }))
        .await;

    response.assert_status(axum::http::StatusCode::PAYMENT_REQUIRED);
}

#[tokio::test]
async fn spend_rejects_non_positive_amount() {
    let harness = TestHarness::new();
    grant(&harness, 10).await;

    for amount in [0, -5] {
        let response = harness
            .server
            .post("/v1/credits/spend")
            .add_header("authorization", harness.user_auth_header())
            .json(&json!({
                "amount": amount,
                "description": "boost"
            }))
            .await;

        response.assert_status_bad_request();
    }
}

// ============================================================================
// Transactions
// ============================================================================

#[tokio::test]
async fn list_transactions_empty() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .get("/v1/credits/transactions")
        .add_header("authorization", harness.user_auth_header())
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert!(body["transactions"].as_array().unwrap().is_empty());
    assert_eq!(body["has_more"], false);
}

#[tokio::test]
async fn list_transactions_newest_first_with_pagination() {
    let harness = TestHarness::new();
    grant(&harness, 100).await;

    for i in 1..=3 {
        // ULIDs order the history; space the spends across milliseconds
        tokio::time::sleep(std::time::Duration::from_millis(3)).await;
        harness
            .server
            .post("/v1/credits/spend")
            .add_header("authorization", harness.user_auth_header())
            .json(&json!({
                "amount": i,
                "description": format!("spend {i}")
            }))
            .await
            .assert_status_ok();
    }

    let response = harness
        .server
        .get("/v1/credits/transactions?limit=2")
        .add_header("authorization", harness.user_auth_header())
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    let transactions = body["transactions"].as_array().unwrap();
    assert_eq!(transactions.len(), 2);
    assert_eq!(body["has_more"], true);

    // Newest first: the last spend leads
    assert_eq!(transactions[0]["amount"], -3);
    assert_eq!(transactions[0]["kind"], "spend");
    assert_eq!(transactions[1]["amount"], -2);

    let response = harness
        .server
        .get("/v1/credits/transactions?limit=2&offset=2")
        .add_header("authorization", harness.user_auth_header())
        .await;

    let body: serde_json::Value = response.json();
    let transactions = body["transactions"].as_array().unwrap();
    assert_eq!(transactions.len(), 2);
    assert_eq!(body["has_more"], false);
    assert_eq!(transactions[0]["amount"], -1);
    assert_eq!(transactions[1]["kind"], "bonus");
    assert_eq!(transactions[1]["amount"], 100);
}

#[tokio::test]
async fn transactions_are_isolated_per_user() {
    let harness = TestHarness::new();
    grant(&harness, 30).await;

    let other = gliter_ledger_core::UserId::generate();
    let response = harness
        .server
        .get("/v1/credits/transactions")
        .add_header("authorization", TestHarness::auth_header_for(&other))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert!(body["transactions"].as_array().unwrap().is_empty());
}

// ============================================================================
// Purchase validation (no provider interaction)
// ============================================================================

#[tokio::test]
async fn purchase_unknown_package_fails() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .post("/v1/credits/purchase")
        .add_header("authorization", harness.user_auth_header())
        .json(&json!({ "package_id": "gigantic" }))
        .await;

    response.assert_status_bad_request();
}

#[tokio::test]
async fn purchase_for_another_user_is_forbidden() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .post("/v1/credits/purchase")
        .add_header("authorization", harness.user_auth_header())
        .json(&json!({
            "package_id": "basic",
            "user_id": gliter_ledger_core::UserId::generate().to_string()
        }))
        .await;

    response.assert_status_forbidden();
}

#[tokio::test]
async fn purchase_without_provider_fails_with_bad_gateway() {
    let harness = TestHarness::new();

    let response = harness
        .server
        .post("/v1/credits/purchase")
        .add_header("authorization", harness.user_auth_header())
        .json(&json!({ "package_id": "basic" }))
        .await;

    response.assert_status(axum::http::StatusCode::BAD_GATEWAY);
}

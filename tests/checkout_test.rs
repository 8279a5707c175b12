use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use canteen::api::{self, AppState};
use canteen::config::Config;
use canteen::db::init_db;
use canteen::Repository;
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;
use tower::util::ServiceExt;

async fn setup_test_app() -> (Router, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir
        .path()
        .join("test.db")
        .to_string_lossy()
        .to_string();

    let pool = init_db(&db_path).await.expect("init_db failed");
    let repo = Arc::new(Repository::new(pool));

    let config = Config {
        port: 0,
        database_path: db_path,
        idempotency_stale_ms: 300_000,
    };

    (api::create_router(AppState::new(repo, config)), temp_dir)
}

async fn request(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
    headers: &[(&str, &str)],
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }
    let request = match body {
        Some(v) => builder
            .header("content-type", "application/json")
            .body(Body::from(v.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn post(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    request(app, "POST", uri, Some(body), &[]).await
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    request(app, "GET", uri, None, &[]).await
}

/// Register an account, a stall owned by a second account, and one item.
/// Returns (account_id, stall_id, item_id).
async fn seed_basics(app: &Router, price: f64) -> (String, String, String) {
    let (status, body) = post(app, "/v1/accounts", json!({"name": "Ardi"})).await;
    assert_eq!(status, StatusCode::CREATED);
    let account_id = body["accountId"].as_str().unwrap().to_string();

    let (status, body) = post(app, "/v1/accounts", json!({"name": "Bu Tini"})).await;
    assert_eq!(status, StatusCode::CREATED);
    let owner_id = body["accountId"].as_str().unwrap().to_string();

    let (status, body) = post(
        app,
        "/v1/stalls",
        json!({"ownerAccountId": owner_id, "name": "Warung Tini"}),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let stall_id = body["stallId"].as_str().unwrap().to_string();

    let (status, body) = post(
        app,
        "/v1/catalog/items",
        json!({"stallId": stall_id, "name": "Nasi goreng", "price": price, "category": "food"}),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let item_id = body["itemId"].as_str().unwrap().to_string();

    (account_id, stall_id, item_id)
}

async fn topup(app: &Router, account_id: &str, amount: f64) {
    let (status, _) = post(
        app,
        "/v1/wallet/topup",
        json!({"accountId": account_id, "amount": amount}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

async fn add_discount(app: &Router, item_id: &str, percent: f64) {
    let (status, _) = post(
        app,
        "/v1/catalog/discounts",
        json!({"name": "promo", "percent": percent, "itemIds": [item_id]}),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_discounted_order_totals_and_snapshot() {
    let (app, _temp) = setup_test_app().await;
    let (account_id, _stall_id, item_id) = seed_basics(&app, 15000.0).await;
    add_discount(&app, &item_id, 10.0).await;

    let (status, body) = post(
        &app,
        "/v1/orders",
        json!({
            "accountId": account_id,
            "items": [{"itemId": item_id, "qty": 2}],
            "paymentMethod": "cash",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "awaiting_confirmation");
    assert_eq!(body["total"], "27000");
    let order_id = body["orderId"].as_str().unwrap().to_string();

    let (status, body) = get(&app, &format!("/v1/orders/{}", order_id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["items"].as_array().unwrap().len(), 1);
    assert_eq!(body["items"][0]["unitPrice"], "13500");
    assert_eq!(body["items"][0]["subtotal"], "27000");
    assert_eq!(body["total"], "27000");
}

#[tokio::test]
async fn test_order_total_is_sum_of_rounded_lines() {
    let (app, _temp) = setup_test_app().await;
    let (account_id, stall_id, item_id) = seed_basics(&app, 9.99).await;
    add_discount(&app, &item_id, 12.5).await;

    let (status, body) = post(
        &app,
        "/v1/catalog/items",
        json!({"stallId": stall_id, "name": "Es teh", "price": 5000.0}),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let second_item = body["itemId"].as_str().unwrap().to_string();

    let (status, body) = post(
        &app,
        "/v1/orders",
        json!({
            "accountId": account_id,
            "items": [
                {"itemId": item_id, "qty": 3},
                {"itemId": second_item, "qty": 1},
            ],
            "paymentMethod": "cash",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    // 9.99 at 12.5% off -> 8.74 per unit (rounded once), 3 * 8.74 = 26.22;
    // plus 5000 undiscounted.
    assert_eq!(body["total"], "5026.22");
}

#[tokio::test]
async fn test_wallet_payment_debits_once_with_linked_entry() {
    let (app, _temp) = setup_test_app().await;
    let (account_id, _stall_id, item_id) = seed_basics(&app, 15000.0).await;
    add_discount(&app, &item_id, 10.0).await;
    topup(&app, &account_id, 50000.0).await;

    let (status, body) = post(
        &app,
        "/v1/orders",
        json!({
            "accountId": account_id,
            "items": [{"itemId": item_id, "qty": 2}],
            "paymentMethod": "wallet",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let order_id = body["orderId"].as_str().unwrap().to_string();

    let (status, body) = get(&app, &format!("/v1/wallet/{}", account_id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["balance"], "23000");

    let (status, body) = get(&app, &format!("/v1/wallet/{}/entries", account_id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["entryCount"], 2);
    // Newest first: the debit precedes the topup in the listing.
    assert_eq!(body["entries"][0]["kind"], "debit");
    assert_eq!(body["entries"][0]["amount"], "-27000");
    assert_eq!(body["entries"][0]["orderId"], order_id.as_str());
}

#[tokio::test]
async fn test_insufficient_funds_persists_nothing() {
    let (app, _temp) = setup_test_app().await;
    let (account_id, _stall_id, item_id) = seed_basics(&app, 15000.0).await;
    add_discount(&app, &item_id, 10.0).await;
    topup(&app, &account_id, 10000.0).await;

    let (status, body) = post(
        &app,
        "/v1/orders",
        json!({
            "accountId": account_id,
            "items": [{"itemId": item_id, "qty": 2}],
            "paymentMethod": "wallet",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
    assert!(body["error"].as_str().unwrap().contains("insufficient"));

    let (_, body) = get(&app, &format!("/v1/wallet/{}", account_id)).await;
    assert_eq!(body["balance"], "10000");

    // Only the topup entry exists; the failed debit left no trace.
    let (_, body) = get(&app, &format!("/v1/wallet/{}/entries", account_id)).await;
    assert_eq!(body["entryCount"], 1);
    assert_eq!(body["entries"][0]["kind"], "topup");
}

#[tokio::test]
async fn test_duplicate_token_returns_prior_order_and_debits_once() {
    let (app, _temp) = setup_test_app().await;
    let (account_id, _stall_id, item_id) = seed_basics(&app, 15000.0).await;
    topup(&app, &account_id, 50000.0).await;

    let order_body = json!({
        "accountId": account_id,
        "items": [{"itemId": item_id, "qty": 1}],
        "paymentMethod": "wallet",
    });

    let (status, first) = request(
        &app,
        "POST",
        "/v1/orders",
        Some(order_body.clone()),
        &[("Idempotency-Key", "retry-1")],
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, second) = request(
        &app,
        "POST",
        "/v1/orders",
        Some(order_body),
        &[("Idempotency-Key", "retry-1")],
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(second["orderId"], first["orderId"]);
    assert_eq!(second["total"], first["total"]);

    let (_, body) = get(&app, &format!("/v1/wallet/{}", account_id)).await;
    assert_eq!(body["balance"], "35000");

    let (_, body) = get(&app, &format!("/v1/wallet/{}/entries", account_id)).await;
    let debits = body["entries"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|e| e["kind"] == "debit")
        .count();
    assert_eq!(debits, 1);
}

#[tokio::test]
async fn test_failed_checkout_frees_the_token_for_retry() {
    let (app, _temp) = setup_test_app().await;
    let (account_id, _stall_id, item_id) = seed_basics(&app, 15000.0).await;
    topup(&app, &account_id, 10000.0).await;

    let order_body = json!({
        "accountId": account_id,
        "items": [{"itemId": item_id, "qty": 1}],
        "paymentMethod": "wallet",
    });

    let (status, _) = request(
        &app,
        "POST",
        "/v1/orders",
        Some(order_body.clone()),
        &[("Idempotency-Key", "retry-2")],
    )
    .await;
    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);

    // After a topup the same token goes through as a fresh request rather
    // than reporting the earlier failure as in-progress.
    topup(&app, &account_id, 10000.0).await;
    let (status, _) = request(
        &app,
        "POST",
        "/v1/orders",
        Some(order_body),
        &[("Idempotency-Key", "retry-2")],
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_mixed_stall_order_rejected() {
    let (app, _temp) = setup_test_app().await;
    let (account_id, _stall_id, item_id) = seed_basics(&app, 15000.0).await;

    let (status, body) = post(&app, "/v1/accounts", json!({"name": "Pak Budi"})).await;
    assert_eq!(status, StatusCode::CREATED);
    let other_owner = body["accountId"].as_str().unwrap().to_string();
    let (_, body) = post(
        &app,
        "/v1/stalls",
        json!({"ownerAccountId": other_owner, "name": "Warung Budi"}),
    )
    .await;
    let other_stall = body["stallId"].as_str().unwrap().to_string();
    let (_, body) = post(
        &app,
        "/v1/catalog/items",
        json!({"stallId": other_stall, "name": "Bakso", "price": 12000.0}),
    )
    .await;
    let other_item = body["itemId"].as_str().unwrap().to_string();

    let (status, body) = post(
        &app,
        "/v1/orders",
        json!({
            "accountId": account_id,
            "items": [
                {"itemId": item_id, "qty": 1},
                {"itemId": other_item, "qty": 1},
            ],
            "paymentMethod": "cash",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("stall"));
}

#[tokio::test]
async fn test_validation_rejections() {
    let (app, _temp) = setup_test_app().await;
    let (account_id, _stall_id, item_id) = seed_basics(&app, 15000.0).await;

    // Empty item list.
    let (status, _) = post(
        &app,
        "/v1/orders",
        json!({"accountId": account_id, "items": [], "paymentMethod": "cash"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Non-positive quantity.
    let (status, _) = post(
        &app,
        "/v1/orders",
        json!({
            "accountId": account_id,
            "items": [{"itemId": item_id, "qty": 0}],
            "paymentMethod": "cash",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Unknown payment method.
    let (status, _) = post(
        &app,
        "/v1/orders",
        json!({
            "accountId": account_id,
            "items": [{"itemId": item_id, "qty": 1}],
            "paymentMethod": "card",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_references_are_not_found() {
    let (app, _temp) = setup_test_app().await;
    let (account_id, _stall_id, item_id) = seed_basics(&app, 15000.0).await;

    let (status, _) = post(
        &app,
        "/v1/orders",
        json!({
            "accountId": account_id,
            "items": [{"itemId": "missing-item", "qty": 1}],
            "paymentMethod": "cash",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = post(
        &app,
        "/v1/orders",
        json!({
            "accountId": "missing-account",
            "items": [{"itemId": item_id, "qty": 1}],
            "paymentMethod": "cash",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_cash_order_leaves_wallet_untouched() {
    let (app, _temp) = setup_test_app().await;
    let (account_id, _stall_id, item_id) = seed_basics(&app, 15000.0).await;
    topup(&app, &account_id, 50000.0).await;

    let (status, _) = post(
        &app,
        "/v1/orders",
        json!({
            "accountId": account_id,
            "items": [{"itemId": item_id, "qty": 1}],
            "paymentMethod": "cash",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, body) = get(&app, &format!("/v1/wallet/{}", account_id)).await;
    assert_eq!(body["balance"], "50000");
}

#[tokio::test]
async fn test_line_prices_survive_later_discount_edits() {
    let (app, _temp) = setup_test_app().await;
    let (account_id, _stall_id, item_id) = seed_basics(&app, 15000.0).await;
    add_discount(&app, &item_id, 10.0).await;

    let (status, body) = post(
        &app,
        "/v1/orders",
        json!({
            "accountId": account_id,
            "items": [{"itemId": item_id, "qty": 2}],
            "paymentMethod": "cash",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let order_id = body["orderId"].as_str().unwrap().to_string();

    // A newer, larger discount changes the effective price going forward...
    add_discount(&app, &item_id, 50.0).await;
    let (_, body) = get(&app, &format!("/v1/catalog/items/{}", item_id)).await;
    assert_eq!(body["effectivePrice"], "7500");

    // ...but the existing order keeps the price it was sold at.
    let (_, body) = get(&app, &format!("/v1/orders/{}", order_id)).await;
    assert_eq!(body["items"][0]["unitPrice"], "13500");
    assert_eq!(body["total"], "27000");
}

#[tokio::test]
async fn test_two_lines_same_item_agree_on_discount() {
    let (app, _temp) = setup_test_app().await;
    let (account_id, _stall_id, item_id) = seed_basics(&app, 15000.0).await;
    add_discount(&app, &item_id, 10.0).await;

    let (status, body) = post(
        &app,
        "/v1/orders",
        json!({
            "accountId": account_id,
            "items": [
                {"itemId": item_id, "qty": 1},
                {"itemId": item_id, "qty": 3},
            ],
            "paymentMethod": "cash",
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let order_id = body["orderId"].as_str().unwrap().to_string();
    let (_, body) = get(&app, &format!("/v1/orders/{}", order_id)).await;
    let items = body["items"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["unitPrice"], items[1]["unitPrice"]);
    assert_eq!(body["total"], "54000");
}

//! End-to-end tests of the HTTP API against an in-memory database.

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tally_db::{Database, DbConfig};
use tally_server::{build_router, AppState};
use tower::ServiceExt;

/// Coffee (id 1, 10 left), Croissant (id 2, 5 left), Sandwich (id 3, none).
async fn setup() -> (Router, Database) {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    db.products().seed_samples().await.unwrap();
    (build_router(AppState::new(db.clone())), db)
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

async fn stock_of(db: &Database, id: i64) -> i64 {
    db.products().get(id).await.unwrap().unwrap().stock_quantity
}

// =============================================================================
// Catalog
// =============================================================================

#[tokio::test]
async fn test_liveness_check() {
    let (app, _db) = setup().await;
    let (status, body) = send(&app, Method::GET, "/api/test", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Backend is working!");
}

#[tokio::test]
async fn test_list_products() {
    let (app, _db) = setup().await;
    let (status, body) = send(&app, Method::GET, "/api/products", None).await;

    assert_eq!(status, StatusCode::OK);
    let products = body.as_array().unwrap();
    assert_eq!(products.len(), 3);
    assert_eq!(products[0]["name"], "Coffee");
    assert_eq!(products[0]["price"], 3.5);
    assert_eq!(products[0]["stock_quantity"], 10);
}

#[tokio::test]
async fn test_create_product() {
    let (app, db) = setup().await;
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/products",
        Some(json!({ "name": "Tea", "price": "2.25", "sku": "TE-004", "stock_quantity": 12 })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Product added!");
    let id = body["productId"].as_i64().unwrap();

    let tea = db.products().get(id).await.unwrap().unwrap();
    assert_eq!(tea.price.cents(), 225);
    assert_eq!(tea.stock_quantity, 12);
}

#[tokio::test]
async fn test_create_product_requires_name_and_price() {
    let (app, _db) = setup().await;

    let (status, body) =
        send(&app, Method::POST, "/api/products", Some(json!({ "name": "Tea" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Name and price are required.");

    let (status, _) = send(&app, Method::POST, "/api/products", Some(json!({ "price": 1 }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_product_duplicate_sku_conflicts() {
    let (app, _db) = setup().await;
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/products",
        Some(json!({ "name": "Espresso", "price": 3, "sku": "CF-001" })),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("CF-001"));
}

#[tokio::test]
async fn test_update_product() {
    let (app, _db) = setup().await;
    let (status, body) = send(
        &app,
        Method::PUT,
        "/api/products/2",
        Some(json!({ "name": "Butter Croissant", "price": 3.1, "sku": "CR-002", "stock_quantity": 7 })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], 2);
    assert_eq!(body["name"], "Butter Croissant");
    assert_eq!(body["price"], 3.1);
    assert_eq!(body["stock_quantity"], 7);
}

#[tokio::test]
async fn test_update_unknown_product_is_not_found() {
    let (app, _db) = setup().await;
    let (status, body) = send(
        &app,
        Method::PUT,
        "/api/products/99",
        Some(json!({ "name": "Ghost", "price": 1 })),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Product 99 not found.");
}

#[tokio::test]
async fn test_delete_product() {
    let (app, db) = setup().await;
    let (status, body) = send(&app, Method::DELETE, "/api/products/3", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Product deleted!");
    assert!(db.products().get(3).await.unwrap().is_none());
}

// =============================================================================
// Checkout
// =============================================================================

#[tokio::test]
async fn test_commit_order() {
    let (app, db) = setup().await;
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/sales",
        Some(json!({
            "items": [{ "id": 1, "name": "Coffee", "price": 3.5, "quantity": 2 }],
            "total_amount": "7.00",
            "order_type": "take-out",
            "payment_method": "cash"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Sale completed!");
    assert_eq!(body["saleId"], 1);
    assert_eq!(body["total"], 7.0);
    assert_eq!(body["orderType"], "take-out");
    assert_eq!(stock_of(&db, 1).await, 8);
}

#[tokio::test]
async fn test_commit_insufficient_stock() {
    let (app, db) = setup().await;
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/sales",
        Some(json!({
            "items": [
                { "id": 1, "name": "Coffee", "price": 3.5, "quantity": 1 },
                { "id": 3, "name": "Sandwich", "price": 8.99, "quantity": 1 }
            ],
            "total_amount": 12.49
        })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Not enough stock for Sandwich. Only 0 left.");
    assert_eq!(stock_of(&db, 1).await, 10);
    assert_eq!(db.sales().count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_commit_unknown_product() {
    let (app, db) = setup().await;
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/sales",
        Some(json!({
            "items": [{ "product_id": 42, "name": "Mystery", "price": 1, "quantity": 1 }],
            "total_amount": 1
        })),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Product 42 not found.");
    assert_eq!(db.sales().count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_commit_rejects_total_beyond_money_range() {
    let (app, db) = setup().await;
    let (status, _) = send(
        &app,
        Method::PUT,
        "/api/products/1",
        Some(json!({ "name": "Coffee", "price": 3.5, "sku": "CF-001", "stock_quantity": 100_000_000 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/sales",
        Some(json!({
            "items": [{ "id": 1, "price": 90_000_000_000.0, "quantity": 100_000_000 }],
            "total_amount": 1
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("quantity must be between"));

    assert_eq!(db.sales().count().await.unwrap(), 0);
    assert_eq!(stock_of(&db, 1).await, 100_000_000);
}

#[tokio::test]
async fn test_commit_rejects_bad_input() {
    let (app, _db) = setup().await;

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/sales",
        Some(json!({ "items": [], "total_amount": 0 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/sales",
        Some(json!({
            "items": [{ "id": 1, "price": 3.5, "quantity": 0 }],
            "total_amount": 0
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/sales",
        Some(json!({
            "items": [{ "id": 1, "price": 3.5, "quantity": 1 }],
            "total_amount": "three fifty"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/sales",
        Some(json!({
            "items": [{ "id": 1, "price": 3.5, "quantity": 1 }],
            "total_amount": 3.5,
            "order_type": "delivery"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("order_type"));
}

// =============================================================================
// Orders
// =============================================================================

async fn commit_coffee(app: &Router, quantity: i64) -> i64 {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/sales",
        Some(json!({
            "items": [{ "id": 1, "name": "Coffee", "price": 3.5, "quantity": quantity }],
            "total_amount": 3.5 * quantity as f64
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["saleId"].as_i64().unwrap()
}

#[tokio::test]
async fn test_list_orders_newest_first() {
    let (app, _db) = setup().await;
    let first = commit_coffee(&app, 1).await;
    let second = commit_coffee(&app, 2).await;

    let (status, body) = send(&app, Method::GET, "/api/orders", None).await;
    assert_eq!(status, StatusCode::OK);

    let orders = body.as_array().unwrap();
    assert_eq!(orders.len(), 2);
    assert_eq!(orders[0]["id"], second);
    assert_eq!(orders[1]["id"], first);
    assert_eq!(orders[0]["total_amount"], 7.0);
    assert_eq!(orders[0]["order_type"], "dine-in");
    assert_eq!(orders[0]["items"][0]["name"], "Coffee");
    assert_eq!(orders[0]["items"][0]["quantity"], 2);
}

#[tokio::test]
async fn test_update_order() {
    let (app, db) = setup().await;
    let id = commit_coffee(&app, 1).await;

    let (status, body) = send(
        &app,
        Method::PUT,
        &format!("/api/orders/{id}"),
        Some(json!({ "total_amount": "3.00", "order_type": "take-out" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Order updated!");

    let sale = db.sales().get(id).await.unwrap().unwrap();
    assert_eq!(sale.total_amount.cents(), 300);

    let (status, _) = send(
        &app,
        Method::PUT,
        "/api/orders/99",
        Some(json!({ "total_amount": 1, "order_type": "dine-in" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_order_keeps_stock() {
    let (app, db) = setup().await;
    let id = commit_coffee(&app, 3).await;

    let (status, body) = send(&app, Method::DELETE, &format!("/api/orders/{id}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Order deleted!");

    assert_eq!(db.sales().count().await.unwrap(), 0);
    assert!(db.sales().items(id).await.unwrap().is_empty());
    assert_eq!(stock_of(&db, 1).await, 7);
}

#[tokio::test]
async fn test_order_numbering_restarts_when_ledger_empty() {
    let (app, _db) = setup().await;
    let id = commit_coffee(&app, 1).await;
    assert_eq!(id, 1);
    let _ = send(&app, Method::DELETE, "/api/orders/1", None).await;

    assert_eq!(commit_coffee(&app, 1).await, 1);
}

// =============================================================================
// Stats
// =============================================================================

#[tokio::test]
async fn test_day_stats() {
    let (app, _db) = setup().await;
    commit_coffee(&app, 1).await;
    commit_coffee(&app, 2).await;

    let (status, body) = send(&app, Method::GET, "/api/daystats?period=7days", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalSales"], 10.5);
    assert_eq!(body["orderCount"], 2);
}

#[tokio::test]
async fn test_day_stats_unknown_period_means_today() {
    let (app, _db) = setup().await;
    commit_coffee(&app, 1).await;

    let (status, body) = send(&app, Method::GET, "/api/daystats?period=fortnight", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["orderCount"], 1);

    let (_, body) = send(&app, Method::GET, "/api/daystats", None).await;
    assert_eq!(body["orderCount"], 1);
}

#[tokio::test]
async fn test_day_stats_reports_zeros_when_store_fails() {
    let (app, db) = setup().await;
    commit_coffee(&app, 1).await;
    db.close().await;

    let (status, body) = send(&app, Method::GET, "/api/daystats?period=today", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalSales"], 0.0);
    assert_eq!(body["orderCount"], 0);

    // Other reads surface the failure instead
    let (status, body) = send(&app, Method::GET, "/api/products", None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!body["error"].as_str().unwrap().is_empty());
}

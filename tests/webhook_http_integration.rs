//! HTTP integration tests for the orders surface.
//!
//! Drives the axum router with `tower::ServiceExt::oneshot` over in-memory
//! adapters, checking the external contract: status codes, the
//! `{"error": "<reason>"}` body shape, and that rejected deliveries leave no
//! trace on any order.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use secrecy::SecretString;
use tower::ServiceExt;

use orderflow::adapters::http::orders::{api_router, OrdersAppState};
use orderflow::adapters::memory::{
    MemoryAuditLog, MemoryOrderRepository, MemoryWebhookEventRepository,
};
use orderflow::adapters::notifications::NoopDispatcher;
use orderflow::adapters::provider::MockPaymentProvider;
use orderflow::domain::foundation::OrderId;
use orderflow::domain::orders::{CheckoutRetryPolicy, OrderStatus};
use orderflow::domain::payments::{compute_signature_hex, WebhookVerifier};
use orderflow::ports::OrderRepository;

const SECRET: &str = "whsec_http_secret";

struct TestApp {
    app: Router,
    orders: Arc<MemoryOrderRepository>,
}

fn test_app() -> TestApp {
    let audit = Arc::new(MemoryAuditLog::new());
    let orders = Arc::new(MemoryOrderRepository::new(audit.clone()));
    let state = OrdersAppState {
        orders: orders.clone(),
        webhook_events: Arc::new(MemoryWebhookEventRepository::new()),
        audit,
        payment_provider: Arc::new(MockPaymentProvider::new()),
        notifier: Arc::new(NoopDispatcher),
        verifier: Arc::new(WebhookVerifier::new(SecretString::new(SECRET.to_string()))),
        retry_policy: CheckoutRetryPolicy::default(),
    };

    TestApp {
        app: api_router().with_state(state),
        orders,
    }
}

fn checkout_body() -> String {
    serde_json::json!({
        "customer_id": uuid::Uuid::new_v4(),
        "currency": "USD",
        "items": [
            { "product_ref": "prod-keyboard", "quantity": 1, "unit_price_minor": 3000 },
            { "product_ref": "prod-cable", "quantity": 2, "unit_price_minor": 600 }
        ],
        "success_url": "https://shop.example/order/success",
        "cancel_url": "https://shop.example/order/cancel"
    })
    .to_string()
}

fn webhook_payload(event_type: &str, event_id: &str, order_id: &OrderId) -> Vec<u8> {
    serde_json::json!({
        "id": event_id,
        "type": event_type,
        "created": chrono::Utc::now().timestamp(),
        "data": {
            "object": {
                "id": "cs_http",
                "metadata": { "order_id": order_id.to_string() }
            }
        },
        "livemode": false
    })
    .to_string()
    .into_bytes()
}

fn signature_for(payload: &[u8]) -> String {
    let timestamp = chrono::Utc::now().timestamp();
    format!(
        "t={},v1={}",
        timestamp,
        compute_signature_hex(SECRET, timestamp, payload)
    )
}

async fn post_json(app: &Router, uri: &str, body: String) -> (StatusCode, serde_json::Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

async fn post_webhook(app: &Router, payload: Vec<u8>, signature: &str) -> (StatusCode, serde_json::Value) {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/webhooks/payment")
                .header("Payment-Signature", signature)
                .body(Body::from(payload))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap();
    (status, json)
}

async fn get(app: &Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let response = app
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap();
    (status, json)
}

async fn checkout(test: &TestApp) -> OrderId {
    let (status, body) = post_json(&test.app, "/api/checkout", checkout_body()).await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body["checkout_url"].as_str().unwrap().starts_with("https://"));
    body["order_id"].as_str().unwrap().parse().unwrap()
}

// =============================================================================
// Checkout endpoint
// =============================================================================

#[tokio::test]
async fn checkout_returns_session_url_and_created_order() {
    let test = test_app();
    let order_id = checkout(&test).await;

    let (status, body) = get(&test.app, &format!("/api/orders/{}", order_id)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "awaiting_payment");
    assert_eq!(body["amount_minor"], 4200);
    assert_eq!(body["currency"], "USD");
}

#[tokio::test]
async fn checkout_with_empty_cart_is_a_400_error_body() {
    let test = test_app();
    let body = serde_json::json!({
        "customer_id": uuid::Uuid::new_v4(),
        "currency": "USD",
        "items": [],
        "success_url": "https://shop.example/s",
        "cancel_url": "https://shop.example/c"
    })
    .to_string();

    let (status, body) = post_json(&test.app, "/api/checkout", body).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

// =============================================================================
// Webhook endpoint
// =============================================================================

#[tokio::test]
async fn valid_webhook_is_acknowledged_and_applied() {
    let test = test_app();
    let order_id = checkout(&test).await;

    let payload = webhook_payload("payment.succeeded", "evt_1", &order_id);
    let signature = signature_for(&payload);
    let (status, body) = post_webhook(&test.app, payload, &signature).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["received"], true);

    let order = test.orders.find_by_id(&order_id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Paid);
}

#[tokio::test]
async fn duplicate_webhook_still_answers_200() {
    let test = test_app();
    let order_id = checkout(&test).await;

    let payload = webhook_payload("payment.succeeded", "evt_1", &order_id);
    let signature = signature_for(&payload);

    let (first, _) = post_webhook(&test.app, payload.clone(), &signature).await;
    let (second, _) = post_webhook(&test.app, payload, &signature).await;

    assert_eq!(first, StatusCode::OK);
    assert_eq!(second, StatusCode::OK);
}

#[tokio::test]
async fn malformed_signature_is_400_with_error_body_and_no_order_change() {
    let test = test_app();
    let order_id = checkout(&test).await;

    let payload = webhook_payload("payment.succeeded", "evt_1", &order_id);
    let bogus = format!("t={},v1={}", chrono::Utc::now().timestamp(), "00".repeat(32));
    let (status, body) = post_webhook(&test.app, payload, &bogus).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid signature");

    let order = test.orders.find_by_id(&order_id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::AwaitingPayment);
    assert_eq!(order.version, 1);
}

#[tokio::test]
async fn stale_timestamp_is_400() {
    let test = test_app();
    let order_id = checkout(&test).await;

    let payload = webhook_payload("payment.succeeded", "evt_1", &order_id);
    let stale = chrono::Utc::now().timestamp() - 900;
    let signature = format!(
        "t={},v1={}",
        stale,
        compute_signature_hex(SECRET, stale, &payload)
    );
    let (status, body) = post_webhook(&test.app, payload, &signature).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("Stale"));
}

#[tokio::test]
async fn missing_signature_header_is_400() {
    let test = test_app();
    let order_id = checkout(&test).await;
    let payload = webhook_payload("payment.succeeded", "evt_1", &order_id);

    let response = test
        .app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/webhooks/payment")
                .body(Body::from(payload))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn illegal_transition_is_400_rejected_state() {
    let test = test_app();
    let order_id = checkout(&test).await;

    // Refund before payment.
    let payload = webhook_payload("refund.issued", "evt_refund", &order_id);
    let signature = signature_for(&payload);
    let (status, body) = post_webhook(&test.app, payload, &signature).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("Invalid transition"));
}

#[tokio::test]
async fn unknown_event_type_is_acknowledged() {
    let test = test_app();
    let order_id = checkout(&test).await;

    let payload = webhook_payload("customer.created", "evt_misc", &order_id);
    let signature = signature_for(&payload);
    let (status, _) = post_webhook(&test.app, payload, &signature).await;

    assert_eq!(status, StatusCode::OK);
}

// =============================================================================
// Order lifecycle endpoints
// =============================================================================

#[tokio::test]
async fn fulfillment_and_history_flow() {
    let test = test_app();
    let order_id = checkout(&test).await;

    let payload = webhook_payload("payment.succeeded", "evt_1", &order_id);
    let signature = signature_for(&payload);
    post_webhook(&test.app, payload, &signature).await;

    let (status, body) = post_json(
        &test.app,
        &format!("/api/orders/{}/fulfillment/start", order_id),
        String::new(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "fulfilling");

    let (status, body) = post_json(
        &test.app,
        &format!("/api/orders/{}/fulfillment/complete", order_id),
        String::new(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "fulfilled");

    let (status, body) = get(&test.app, &format!("/api/orders/{}/history", order_id)).await;
    assert_eq!(status, StatusCode::OK);
    let entries = body["entries"].as_array().unwrap();
    // awaiting_payment, paid, fulfilling, fulfilled - all applied.
    assert_eq!(entries.len(), 4);
    assert!(entries.iter().all(|e| e["outcome"] == "applied"));
    assert_eq!(entries[3]["to_state"], "fulfilled");
}

#[tokio::test]
async fn cancel_of_terminal_order_is_409() {
    let test = test_app();
    let order_id = checkout(&test).await;

    let payload = webhook_payload("payment.succeeded", "evt_1", &order_id);
    let signature = signature_for(&payload);
    post_webhook(&test.app, payload, &signature).await;

    let refund = webhook_payload("refund.issued", "evt_2", &order_id);
    let signature = signature_for(&refund);
    post_webhook(&test.app, refund, &signature).await;

    let (status, body) = post_json(
        &test.app,
        &format!("/api/orders/{}/cancel", order_id),
        String::new(),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn missing_order_is_404() {
    let test = test_app();
    let (status, body) = get(&test.app, &format!("/api/orders/{}", OrderId::new())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());
}

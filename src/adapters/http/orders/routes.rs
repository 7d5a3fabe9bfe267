//! Axum router for the orders surface.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{
    cancel_order, complete_fulfillment, create_checkout, get_order, get_order_history,
    handle_payment_webhook, retry_checkout, start_fulfillment, OrdersAppState,
};

/// Checkout and order endpoints.
///
/// # Routes
///
/// - `POST /checkout` - Create an order and provider checkout session
/// - `GET /orders/{id}` - Order view
/// - `GET /orders/{id}/history` - Audit history
/// - `POST /orders/{id}/cancel` - Explicit cancellation
/// - `POST /orders/{id}/fulfillment/start` - Begin fulfillment
/// - `POST /orders/{id}/fulfillment/complete` - Finish fulfillment
/// - `POST /orders/{id}/checkout/retry` - Policy-guarded checkout retry
pub fn orders_routes() -> Router<OrdersAppState> {
    Router::new()
        .route("/checkout", post(create_checkout))
        .route("/orders/:id", get(get_order))
        .route("/orders/:id/history", get(get_order_history))
        .route("/orders/:id/cancel", post(cancel_order))
        .route("/orders/:id/fulfillment/start", post(start_fulfillment))
        .route("/orders/:id/fulfillment/complete", post(complete_fulfillment))
        .route("/orders/:id/checkout/retry", post(retry_checkout))
}

/// Webhook endpoints.
///
/// Separate from the order routes because webhooks carry no user
/// authentication; they are verified by signature.
///
/// # Routes
/// - `POST /payment` - Inbound payment-provider webhook
pub fn webhook_routes() -> Router<OrdersAppState> {
    Router::new().route("/payment", post(handle_payment_webhook))
}

/// The complete API router, mounted at the application root.
pub fn api_router() -> Router<OrdersAppState> {
    Router::new()
        .nest("/api", orders_routes())
        .nest("/api/webhooks", webhook_routes())
}

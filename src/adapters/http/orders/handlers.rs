//! HTTP handlers for the orders surface.
//!
//! These handlers connect axum routes to the application layer command and
//! query handlers.

use std::sync::Arc;

use axum::extract::{Json, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use crate::application::handlers::orders::{
    CancelOrderCommand, CancelOrderHandler, CompleteFulfillmentCommand,
    CompleteFulfillmentHandler, CreateCheckoutCommand, CreateCheckoutHandler, GetOrderHandler,
    GetOrderHistoryHandler, GetOrderHistoryQuery, GetOrderQuery, ProcessWebhookCommand,
    ProcessWebhookHandler, RetryCheckoutCommand, RetryCheckoutHandler, StartFulfillmentCommand,
    StartFulfillmentHandler, WebhookDisposition,
};
use crate::domain::foundation::OrderId;
use crate::domain::orders::{CheckoutRetryPolicy, LineItem, OrderError};
use crate::domain::payments::{WebhookError, WebhookVerifier};
use crate::ports::{
    AuditLog, NotificationDispatcher, OrderRepository, PaymentProvider, WebhookEventRepository,
};

use super::dto::{
    AuditEntryResponse, CheckoutResponse, CreateCheckoutRequest, ErrorResponse, HistoryResponse,
    OrderResponse, WebhookAckResponse,
};

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared application state containing all dependencies.
///
/// Cloned per request; everything inside is Arc-wrapped.
#[derive(Clone)]
pub struct OrdersAppState {
    pub orders: Arc<dyn OrderRepository>,
    pub webhook_events: Arc<dyn WebhookEventRepository>,
    pub audit: Arc<dyn AuditLog>,
    pub payment_provider: Arc<dyn PaymentProvider>,
    pub notifier: Arc<dyn NotificationDispatcher>,
    pub verifier: Arc<WebhookVerifier>,
    pub retry_policy: CheckoutRetryPolicy,
}

impl OrdersAppState {
    /// Create handlers on demand from the shared state.
    pub fn create_checkout_handler(&self) -> CreateCheckoutHandler {
        CreateCheckoutHandler::new(self.orders.clone(), self.payment_provider.clone())
    }

    pub fn webhook_handler(&self) -> ProcessWebhookHandler {
        ProcessWebhookHandler::new(
            self.verifier.clone(),
            self.orders.clone(),
            self.webhook_events.clone(),
            self.audit.clone(),
            self.notifier.clone(),
        )
    }

    pub fn get_order_handler(&self) -> GetOrderHandler {
        GetOrderHandler::new(self.orders.clone())
    }

    pub fn history_handler(&self) -> GetOrderHistoryHandler {
        GetOrderHistoryHandler::new(self.audit.clone())
    }

    pub fn cancel_handler(&self) -> CancelOrderHandler {
        CancelOrderHandler::new(self.orders.clone(), self.notifier.clone())
    }

    pub fn start_fulfillment_handler(&self) -> StartFulfillmentHandler {
        StartFulfillmentHandler::new(self.orders.clone())
    }

    pub fn complete_fulfillment_handler(&self) -> CompleteFulfillmentHandler {
        CompleteFulfillmentHandler::new(self.orders.clone(), self.notifier.clone())
    }

    pub fn retry_checkout_handler(&self) -> RetryCheckoutHandler {
        RetryCheckoutHandler::new(self.orders.clone(), self.retry_policy)
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Checkout and Webhook Endpoints
// ════════════════════════════════════════════════════════════════════════════════

/// POST /api/checkout - Create an order and its provider checkout session.
pub async fn create_checkout(
    State(state): State<OrdersAppState>,
    Json(request): Json<CreateCheckoutRequest>,
) -> Result<impl IntoResponse, OrderApiError> {
    let items = request
        .items
        .into_iter()
        .map(|item| LineItem::new(item.product_ref, item.quantity, item.unit_price_minor))
        .collect::<Result<Vec<_>, _>>()?;

    let handler = state.create_checkout_handler();
    let result = handler
        .handle(CreateCheckoutCommand {
            customer_id: request.customer_id,
            currency: request.currency,
            items,
            success_url: request.success_url,
            cancel_url: request.cancel_url,
        })
        .await?;

    let response = CheckoutResponse {
        order_id: result.order.id,
        checkout_url: result.checkout_url,
    };
    Ok((StatusCode::CREATED, Json(response)))
}

/// POST /api/webhooks/payment - The inbound webhook endpoint.
///
/// Takes the exact raw body bytes plus the `Payment-Signature` header.
/// Answers 200 for applied, duplicate, and ignored deliveries (the provider
/// must not retry), 400 for rejected ones, and 5xx only for infrastructure
/// failure.
pub async fn handle_payment_webhook(
    State(state): State<OrdersAppState>,
    headers: axum::http::HeaderMap,
    body: axum::body::Bytes,
) -> Result<impl IntoResponse, WebhookApiError> {
    let signature = headers
        .get("Payment-Signature")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            WebhookApiError(WebhookError::ParseError(
                "missing Payment-Signature header".to_string(),
            ))
        })?;

    let handler = state.webhook_handler();
    // Applied, duplicate, and ignored all acknowledge with 200.
    let _disposition: WebhookDisposition = handler
        .handle(ProcessWebhookCommand {
            payload: body.to_vec(),
            signature: signature.to_string(),
        })
        .await?;

    Ok((StatusCode::OK, Json(WebhookAckResponse { received: true })))
}

// ════════════════════════════════════════════════════════════════════════════════
// Order Endpoints
// ════════════════════════════════════════════════════════════════════════════════

/// GET /api/orders/{id} - Order view.
pub async fn get_order(
    State(state): State<OrdersAppState>,
    Path(order_id): Path<OrderId>,
) -> Result<impl IntoResponse, OrderApiError> {
    let order = state
        .get_order_handler()
        .handle(GetOrderQuery { order_id })
        .await?;
    Ok(Json(OrderResponse::from(&order)))
}

/// GET /api/orders/{id}/history - Audit history, oldest first.
pub async fn get_order_history(
    State(state): State<OrdersAppState>,
    Path(order_id): Path<OrderId>,
) -> Result<impl IntoResponse, OrderApiError> {
    let entries = state
        .history_handler()
        .handle(GetOrderHistoryQuery { order_id })
        .await?;

    let response = HistoryResponse {
        order_id,
        entries: entries.iter().map(AuditEntryResponse::from).collect(),
    };
    Ok(Json(response))
}

/// POST /api/orders/{id}/cancel - Explicit cancellation.
pub async fn cancel_order(
    State(state): State<OrdersAppState>,
    Path(order_id): Path<OrderId>,
) -> Result<impl IntoResponse, OrderApiError> {
    let order = state
        .cancel_handler()
        .handle(CancelOrderCommand { order_id })
        .await?;
    Ok(Json(OrderResponse::from(&order)))
}

/// POST /api/orders/{id}/fulfillment/start - Begin fulfillment.
pub async fn start_fulfillment(
    State(state): State<OrdersAppState>,
    Path(order_id): Path<OrderId>,
) -> Result<impl IntoResponse, OrderApiError> {
    let order = state
        .start_fulfillment_handler()
        .handle(StartFulfillmentCommand { order_id })
        .await?;
    Ok(Json(OrderResponse::from(&order)))
}

/// POST /api/orders/{id}/fulfillment/complete - Finish fulfillment.
pub async fn complete_fulfillment(
    State(state): State<OrdersAppState>,
    Path(order_id): Path<OrderId>,
) -> Result<impl IntoResponse, OrderApiError> {
    let order = state
        .complete_fulfillment_handler()
        .handle(CompleteFulfillmentCommand { order_id })
        .await?;
    Ok(Json(OrderResponse::from(&order)))
}

/// POST /api/orders/{id}/checkout/retry - Policy-guarded checkout retry.
pub async fn retry_checkout(
    State(state): State<OrdersAppState>,
    Path(order_id): Path<OrderId>,
) -> Result<impl IntoResponse, OrderApiError> {
    let order = state
        .retry_checkout_handler()
        .handle(RetryCheckoutCommand { order_id })
        .await?;
    Ok(Json(OrderResponse::from(&order)))
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error wrapper mapping `OrderError` to HTTP responses.
pub struct OrderApiError(OrderError);

impl From<OrderError> for OrderApiError {
    fn from(err: OrderError) -> Self {
        Self(err)
    }
}

impl IntoResponse for OrderApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self.0 {
            OrderError::NotFound(_) => StatusCode::NOT_FOUND,
            OrderError::EmptyOrder | OrderError::InvalidLineItem(_) => StatusCode::BAD_REQUEST,
            OrderError::InvalidTransition { .. }
            | OrderError::ProviderReferenceAlreadySet
            | OrderError::RetryNotEligible(_) => StatusCode::CONFLICT,
            OrderError::ConcurrentModification => StatusCode::SERVICE_UNAVAILABLE,
            OrderError::ProviderUnavailable(_) => StatusCode::BAD_GATEWAY,
            OrderError::Infrastructure(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        // Internal details stay in the log, not in the response.
        let message = match &self.0 {
            OrderError::Infrastructure(_) => "internal error".to_string(),
            other => other.to_string(),
        };
        (status, Json(ErrorResponse::new(message))).into_response()
    }
}

/// API error wrapper mapping `WebhookError` to HTTP responses.
pub struct WebhookApiError(pub WebhookError);

impl From<WebhookError> for WebhookApiError {
    fn from(err: WebhookError) -> Self {
        Self(err)
    }
}

impl IntoResponse for WebhookApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.0.status_code();
        let message = if status.is_server_error() {
            "internal error".to_string()
        } else {
            self.0.to_string()
        };
        (status, Json(ErrorResponse::new(message))).into_response()
    }
}

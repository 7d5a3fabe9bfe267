//! Request and response DTOs for the orders HTTP surface.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{CustomerId, OrderId, Timestamp};
use crate::domain::orders::{AuditEntry, LineItem, Order};

/// One cart line in a checkout request.
#[derive(Debug, Clone, Deserialize)]
pub struct LineItemRequest {
    pub product_ref: String,
    pub quantity: u32,
    pub unit_price_minor: i64,
}

/// POST /api/checkout request body: a cart snapshot.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCheckoutRequest {
    pub customer_id: CustomerId,
    pub currency: String,
    pub items: Vec<LineItemRequest>,
    pub success_url: String,
    pub cancel_url: String,
}

/// Response carrying the provider-hosted session URL.
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutResponse {
    pub order_id: OrderId,
    pub checkout_url: String,
}

/// One order line in a response.
#[derive(Debug, Clone, Serialize)]
pub struct LineItemResponse {
    pub product_ref: String,
    pub quantity: u32,
    pub unit_price_minor: i64,
}

impl From<&LineItem> for LineItemResponse {
    fn from(item: &LineItem) -> Self {
        Self {
            product_ref: item.product_ref.clone(),
            quantity: item.quantity,
            unit_price_minor: item.unit_price_minor,
        }
    }
}

/// Full order view.
#[derive(Debug, Clone, Serialize)]
pub struct OrderResponse {
    pub id: OrderId,
    pub customer_id: CustomerId,
    pub status: String,
    pub provider_reference: Option<String>,
    pub amount_minor: i64,
    pub currency: String,
    pub items: Vec<LineItemResponse>,
    pub checkout_attempts: u32,
    pub version: i64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<&Order> for OrderResponse {
    fn from(order: &Order) -> Self {
        Self {
            id: order.id,
            customer_id: order.customer_id,
            status: order.status.as_str().to_string(),
            provider_reference: order.provider_reference.clone(),
            amount_minor: order.amount_minor,
            currency: order.currency.clone(),
            items: order.items.iter().map(LineItemResponse::from).collect(),
            checkout_attempts: order.checkout_attempts,
            version: order.version,
            created_at: order.created_at,
            updated_at: order.updated_at,
        }
    }
}

/// One audit entry in a history response.
#[derive(Debug, Clone, Serialize)]
pub struct AuditEntryResponse {
    pub seq: i64,
    pub from_state: Option<String>,
    pub to_state: Option<String>,
    pub triggering_event_id: Option<String>,
    pub actor: &'static str,
    pub outcome: &'static str,
    pub recorded_at: Timestamp,
}

impl From<&AuditEntry> for AuditEntryResponse {
    fn from(entry: &AuditEntry) -> Self {
        Self {
            seq: entry.seq,
            from_state: entry.from_state.map(|s| s.as_str().to_string()),
            to_state: entry.to_state.map(|s| s.as_str().to_string()),
            triggering_event_id: entry.triggering_event_id.clone(),
            actor: entry.actor.as_str(),
            outcome: entry.outcome.as_str(),
            recorded_at: entry.recorded_at,
        }
    }
}

/// GET /api/orders/{id}/history response.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryResponse {
    pub order_id: OrderId,
    pub entries: Vec<AuditEntryResponse>,
}

/// Acknowledgement body of the webhook endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct WebhookAckResponse {
    pub received: bool,
}

/// Error body: `{"error": "<reason>"}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            error: reason.into(),
        }
    }
}

//! Provider event wire types.
//!
//! Parses the JSON payload of a (signature-verified) webhook delivery into
//! the domain vocabulary. The provider stores our order id in the checkout
//! session metadata at creation time and echoes it back in every event for
//! that session.

use serde::Deserialize;

use crate::domain::foundation::OrderId;
use crate::domain::orders::OrderStatus;

use super::webhook_errors::WebhookError;

/// Semantic kind of a provider event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderEventType {
    /// Checkout session confirmed by the provider.
    CheckoutSessionConfirmed,

    /// Payment captured.
    PaymentSucceeded,

    /// Payment attempt failed.
    PaymentFailed,

    /// Refund issued by the provider.
    RefundIssued,

    /// Event type this core does not process.
    Unknown(String),
}

impl ProviderEventType {
    /// Parses the provider's event type string.
    pub fn parse(s: &str) -> Self {
        match s {
            "checkout.session.confirmed" => ProviderEventType::CheckoutSessionConfirmed,
            "payment.succeeded" => ProviderEventType::PaymentSucceeded,
            "payment.failed" => ProviderEventType::PaymentFailed,
            "refund.issued" => ProviderEventType::RefundIssued,
            other => ProviderEventType::Unknown(other.to_string()),
        }
    }

    /// The order status this event drives the state machine towards.
    ///
    /// `None` for event types the core does not process.
    pub fn target_status(&self) -> Option<OrderStatus> {
        match self {
            ProviderEventType::CheckoutSessionConfirmed => Some(OrderStatus::AwaitingPayment),
            ProviderEventType::PaymentSucceeded => Some(OrderStatus::Paid),
            ProviderEventType::PaymentFailed => Some(OrderStatus::PaymentFailed),
            ProviderEventType::RefundIssued => Some(OrderStatus::Refunded),
            ProviderEventType::Unknown(_) => None,
        }
    }

    /// The provider's name for this event type.
    pub fn as_str(&self) -> &str {
        match self {
            ProviderEventType::CheckoutSessionConfirmed => "checkout.session.confirmed",
            ProviderEventType::PaymentSucceeded => "payment.succeeded",
            ProviderEventType::PaymentFailed => "payment.failed",
            ProviderEventType::RefundIssued => "refund.issued",
            ProviderEventType::Unknown(s) => s,
        }
    }
}

/// One parsed provider event.
#[derive(Debug, Clone)]
pub struct ProviderEvent {
    /// Provider-assigned id, globally unique per logical event. The same id
    /// may be delivered multiple times.
    pub id: String,

    /// Semantic kind.
    pub event_type: ProviderEventType,

    /// Provider-side creation time (Unix seconds).
    pub created: i64,

    /// Our order id, echoed back from the session metadata.
    pub order_id: Option<OrderId>,

    /// The provider-side object reference (checkout session, payment,
    /// refund).
    pub provider_reference: Option<String>,

    /// Whether the event originated from the provider's live environment.
    pub livemode: bool,
}

impl ProviderEvent {
    /// Parses a verified payload into a provider event.
    ///
    /// # Errors
    ///
    /// Returns `WebhookError::ParseError` for malformed JSON and
    /// `WebhookError::MissingMetadata` when a processable event carries no
    /// order reference.
    pub fn from_payload(payload: &[u8]) -> Result<Self, WebhookError> {
        let raw: RawEvent = serde_json::from_slice(payload)
            .map_err(|e| WebhookError::ParseError(e.to_string()))?;

        let event_type = ProviderEventType::parse(&raw.event_type);

        let order_id = raw
            .data
            .object
            .metadata
            .as_ref()
            .and_then(|m| m.order_id.as_deref())
            .map(|s| {
                s.parse::<OrderId>().map_err(|_| {
                    WebhookError::ParseError(format!("metadata.order_id is not a UUID: {}", s))
                })
            })
            .transpose()?;

        // Events this core processes must say which order they concern.
        if order_id.is_none() && event_type.target_status().is_some() {
            return Err(WebhookError::MissingMetadata("order_id"));
        }

        Ok(Self {
            id: raw.id,
            event_type,
            created: raw.created,
            order_id,
            provider_reference: raw.data.object.id,
            livemode: raw.livemode,
        })
    }
}

// ══════════════════════════════════════════════════════════════════════════
// Raw wire shapes
// ══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Deserialize)]
struct RawEvent {
    id: String,
    #[serde(rename = "type")]
    event_type: String,
    #[serde(default)]
    created: i64,
    data: RawEventData,
    #[serde(default)]
    livemode: bool,
}

#[derive(Debug, Deserialize)]
struct RawEventData {
    object: RawEventObject,
}

#[derive(Debug, Deserialize)]
struct RawEventObject {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    metadata: Option<RawMetadata>,
}

#[derive(Debug, Deserialize)]
struct RawMetadata {
    #[serde(default)]
    order_id: Option<String>,
}

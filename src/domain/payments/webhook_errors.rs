//! Webhook error types.
//!
//! Defines all error conditions that can occur during webhook processing,
//! with HTTP status code mapping and retryability semantics. The status code
//! decides whether the provider retries: 2xx acknowledges, 4xx is final,
//! 5xx invites redelivery.

use axum::http::StatusCode;
use thiserror::Error;

use crate::domain::foundation::OrderId;
use crate::domain::orders::OrderStatus;

/// Errors that occur during webhook processing.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// Signature verification failed.
    #[error("Invalid signature")]
    InvalidSignature,

    /// Signed timestamp is older than the replay tolerance window.
    #[error("Stale timestamp")]
    StaleTimestamp,

    /// Signed timestamp is in the future beyond clock skew tolerance.
    #[error("Timestamp in the future")]
    FutureTimestamp,

    /// Failed to parse the signature header or the payload.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Required metadata field missing from the event payload.
    #[error("Missing metadata: {0}")]
    MissingMetadata(&'static str),

    /// Referenced order could not be found. Possibly eventual consistency,
    /// so the provider is invited to retry.
    #[error("Order {0} not found")]
    OrderNotFound(OrderId),

    /// The event demanded a transition the state machine refuses.
    #[error("Invalid transition from {from} to {to}")]
    RejectedState { from: OrderStatus, to: OrderStatus },

    /// The version-conditioned write kept losing; retries exhausted.
    #[error("Concurrent modification retries exhausted")]
    ConcurrencyExhausted,

    /// Persistence failure.
    #[error("Database error: {0}")]
    Database(String),
}

impl WebhookError {
    /// Returns true if the provider should retry delivering this webhook.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            WebhookError::OrderNotFound(_)
                | WebhookError::ConcurrencyExhausted
                | WebhookError::Database(_)
        )
    }

    /// Maps the error to the HTTP status code of the webhook endpoint.
    pub fn status_code(&self) -> StatusCode {
        match self {
            // Authenticity and semantic rejections are final: 400, no retry.
            WebhookError::InvalidSignature
            | WebhookError::StaleTimestamp
            | WebhookError::FutureTimestamp
            | WebhookError::ParseError(_)
            | WebhookError::MissingMetadata(_)
            | WebhookError::RejectedState { .. } => StatusCode::BAD_REQUEST,

            // Infrastructure failures invite a provider retry.
            WebhookError::OrderNotFound(_)
            | WebhookError::ConcurrencyExhausted
            | WebhookError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

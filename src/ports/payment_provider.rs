//! PaymentProvider port - Checkout session creation.
//!
//! The provider is the source of truth for monetary events but communicates
//! asynchronously; the only synchronous call the core makes is creating a
//! checkout session. Implementations must bound the call with a timeout.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::OrderId;

/// One line of a checkout session, mirroring the order's snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionLineItem {
    pub product_ref: String,
    pub quantity: u32,
    pub unit_price_minor: i64,
}

/// Request to create a provider-hosted checkout session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSessionRequest {
    /// Our order id; stored in the session metadata so webhook events can be
    /// routed back to the order.
    pub order_id: OrderId,

    /// Total in minor currency units.
    pub amount_minor: i64,

    /// ISO 4217 currency code.
    pub currency: String,

    /// Line items for the provider-hosted page.
    pub line_items: Vec<SessionLineItem>,

    /// Where the provider redirects after a completed payment.
    pub success_url: String,

    /// Where the provider redirects after an abandoned payment.
    pub cancel_url: String,
}

/// A provider-hosted checkout session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutSession {
    /// Provider's session id; becomes the order's `provider_reference`.
    pub id: String,

    /// URL for the customer to complete payment.
    pub url: String,

    /// When the session expires (Unix seconds).
    pub expires_at: i64,
}

/// Port for the payment provider.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Creates a checkout session for a pending order.
    async fn create_checkout_session(
        &self,
        request: CreateSessionRequest,
    ) -> Result<CheckoutSession, PaymentError>;
}

/// Errors from payment provider calls.
#[derive(Debug, Clone)]
pub struct PaymentError {
    /// Error category.
    pub code: PaymentErrorCode,

    /// Human-readable message.
    pub message: String,

    /// Whether the call may be retried.
    pub retryable: bool,
}

impl PaymentError {
    /// Creates a new payment error.
    pub fn new(code: PaymentErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            retryable: code.is_retryable(),
        }
    }

    /// Creates a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(PaymentErrorCode::NetworkError, message)
    }

    /// Creates an authentication error.
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(PaymentErrorCode::AuthenticationError, message)
    }

    /// Creates a provider-side error.
    pub fn provider(message: impl Into<String>) -> Self {
        Self::new(PaymentErrorCode::ProviderError, message)
    }
}

impl std::fmt::Display for PaymentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for PaymentError {}

/// Payment error categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentErrorCode {
    /// Network connectivity issue or timeout.
    NetworkError,

    /// API authentication failed.
    AuthenticationError,

    /// Rate limit exceeded.
    RateLimitExceeded,

    /// The provider rejected the request.
    InvalidRequest,

    /// Provider-side API error.
    ProviderError,
}

impl PaymentErrorCode {
    /// Check if this error category is typically retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PaymentErrorCode::NetworkError | PaymentErrorCode::RateLimitExceeded
        )
    }
}

impl std::fmt::Display for PaymentErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PaymentErrorCode::NetworkError => "network_error",
            PaymentErrorCode::AuthenticationError => "authentication_error",
            PaymentErrorCode::RateLimitExceeded => "rate_limit_exceeded",
            PaymentErrorCode::InvalidRequest => "invalid_request",
            PaymentErrorCode::ProviderError => "provider_error",
        };
        write!(f, "{}", s)
    }
}

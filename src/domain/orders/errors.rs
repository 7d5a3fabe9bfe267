//! Error types for order operations.

use thiserror::Error;

use crate::domain::foundation::{DomainError, OrderId};
use crate::domain::orders::OrderStatus;

/// Errors that occur when creating or mutating orders.
#[derive(Debug, Error)]
pub enum OrderError {
    /// Order does not exist.
    #[error("Order {0} not found")]
    NotFound(OrderId),

    /// Order has no line items.
    #[error("Order must contain at least one line item")]
    EmptyOrder,

    /// A line item carries an invalid quantity or price.
    #[error("Invalid line item: {0}")]
    InvalidLineItem(String),

    /// Attempted state transition is not in the legal transition table.
    #[error("Invalid transition from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    /// The version-conditioned write lost to a concurrent mutation.
    #[error("Order was modified concurrently")]
    ConcurrentModification,

    /// The provider reference is assigned once and never reassigned.
    #[error("Provider reference already assigned")]
    ProviderReferenceAlreadySet,

    /// Checkout retry refused by the configured retry policy.
    #[error("Checkout retry not eligible: {0}")]
    RetryNotEligible(String),

    /// The payment provider could not be reached or answered with an error.
    #[error("Payment provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// Persistence or other infrastructure failure.
    #[error("Infrastructure error: {0}")]
    Infrastructure(String),
}

impl OrderError {
    /// Creates an invalid transition error.
    pub fn invalid_transition(from: OrderStatus, to: OrderStatus) -> Self {
        OrderError::InvalidTransition { from, to }
    }

    /// Creates an infrastructure error.
    pub fn infrastructure(message: impl Into<String>) -> Self {
        OrderError::Infrastructure(message.into())
    }
}

impl From<DomainError> for OrderError {
    fn from(err: DomainError) -> Self {
        OrderError::Infrastructure(err.to_string())
    }
}

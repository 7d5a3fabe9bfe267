//! Order status state machine.
//!
//! Defines all order lifecycle states and the legal transitions between
//! them. Illegal transitions are rejected and recorded in the audit log,
//! never applied.

use crate::domain::foundation::StateMachine;
use serde::{Deserialize, Serialize};

/// Lifecycle state of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Order created, provider checkout session not yet confirmed.
    Pending,

    /// Checkout session confirmed by the provider; payment outstanding.
    AwaitingPayment,

    /// Payment captured by the provider.
    Paid,

    /// Fulfillment in progress.
    Fulfilling,

    /// Fulfillment complete.
    Fulfilled,

    /// Provider reported a failed payment. Checkout may be retried.
    PaymentFailed,

    /// Explicitly cancelled (admin action or timeout).
    Canceled,

    /// Payment returned to the customer.
    Refunded,
}

impl OrderStatus {
    /// Returns every status, in lifecycle order.
    ///
    /// Used by exhaustive transition tests.
    pub fn all() -> [OrderStatus; 8] {
        use OrderStatus::*;
        [
            Pending,
            AwaitingPayment,
            Paid,
            Fulfilling,
            Fulfilled,
            PaymentFailed,
            Canceled,
            Refunded,
        ]
    }

    /// Returns true if an explicit cancellation is still permitted.
    ///
    /// `Fulfilled`, `Refunded`, and `Canceled` are terminal for automated
    /// transitions; everything else can be cancelled.
    pub fn is_cancelable(&self) -> bool {
        self.can_transition_to(&OrderStatus::Canceled)
    }

    /// Returns true if a committed transition into this status should be
    /// pushed to the notification dispatcher.
    ///
    /// Intermediate states (`awaiting_payment`, `fulfilling`) stay quiet.
    pub fn triggers_notification(&self) -> bool {
        matches!(
            self,
            OrderStatus::Paid
                | OrderStatus::PaymentFailed
                | OrderStatus::Fulfilled
                | OrderStatus::Canceled
                | OrderStatus::Refunded
        )
    }

    /// Stable wire/database name for this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::AwaitingPayment => "awaiting_payment",
            OrderStatus::Paid => "paid",
            OrderStatus::Fulfilling => "fulfilling",
            OrderStatus::Fulfilled => "fulfilled",
            OrderStatus::PaymentFailed => "payment_failed",
            OrderStatus::Canceled => "canceled",
            OrderStatus::Refunded => "refunded",
        }
    }

    /// Parses the stable wire/database name.
    pub fn parse(s: &str) -> Option<OrderStatus> {
        match s {
            "pending" => Some(OrderStatus::Pending),
            "awaiting_payment" => Some(OrderStatus::AwaitingPayment),
            "paid" => Some(OrderStatus::Paid),
            "fulfilling" => Some(OrderStatus::Fulfilling),
            "fulfilled" => Some(OrderStatus::Fulfilled),
            "payment_failed" => Some(OrderStatus::PaymentFailed),
            "canceled" => Some(OrderStatus::Canceled),
            "refunded" => Some(OrderStatus::Refunded),
            _ => None,
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl StateMachine for OrderStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use OrderStatus::*;
        matches!(
            (self, target),
            // From PENDING
            (Pending, AwaitingPayment)
            // From AWAITING_PAYMENT
                | (AwaitingPayment, Paid)
                | (AwaitingPayment, PaymentFailed)
            // From PAID
                | (Paid, Fulfilling)
                | (Paid, Refunded)
            // From FULFILLING
                | (Fulfilling, Fulfilled)
            // From FULFILLED (refund is the sole exception to terminality)
                | (Fulfilled, Refunded)
            // From PAYMENT_FAILED (retry checkout)
                | (PaymentFailed, AwaitingPayment)
            // Explicit cancellation from any non-terminal state
                | (Pending, Canceled)
                | (AwaitingPayment, Canceled)
                | (Paid, Canceled)
                | (Fulfilling, Canceled)
                | (PaymentFailed, Canceled)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use OrderStatus::*;
        match self {
            Pending => vec![AwaitingPayment, Canceled],
            AwaitingPayment => vec![Paid, PaymentFailed, Canceled],
            Paid => vec![Fulfilling, Refunded, Canceled],
            Fulfilling => vec![Fulfilled, Canceled],
            Fulfilled => vec![Refunded],
            PaymentFailed => vec![AwaitingPayment, Canceled],
            Canceled => vec![],
            Refunded => vec![],
        }
    }
}

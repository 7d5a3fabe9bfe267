//! Order aggregate.
//!
//! One `Order` represents one customer purchase attempt. Monetary fields and
//! line-item price snapshots are immutable after creation; the status moves
//! only through the state machine; the `version` counter backs optimistic
//! concurrency.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{CustomerId, OrderId, StateMachine, Timestamp};
use crate::domain::orders::{OrderError, OrderStatus};

/// One purchased product with its price snapshotted at checkout time.
///
/// The snapshot never changes afterwards, even if the catalog price does.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// Catalog reference of the purchased product.
    pub product_ref: String,

    /// Units purchased.
    pub quantity: u32,

    /// Unit price in minor currency units at checkout time.
    pub unit_price_minor: i64,
}

impl LineItem {
    /// Creates a validated line item.
    pub fn new(
        product_ref: impl Into<String>,
        quantity: u32,
        unit_price_minor: i64,
    ) -> Result<Self, OrderError> {
        let product_ref = product_ref.into();
        if product_ref.is_empty() {
            return Err(OrderError::InvalidLineItem(
                "product reference cannot be empty".to_string(),
            ));
        }
        if quantity == 0 {
            return Err(OrderError::InvalidLineItem(
                "quantity must be at least 1".to_string(),
            ));
        }
        if unit_price_minor < 0 {
            return Err(OrderError::InvalidLineItem(
                "unit price cannot be negative".to_string(),
            ));
        }
        Ok(Self {
            product_ref,
            quantity,
            unit_price_minor,
        })
    }

    /// Line subtotal in minor units.
    pub fn subtotal_minor(&self) -> i64 {
        self.unit_price_minor * i64::from(self.quantity)
    }
}

/// One customer purchase attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Stable internal identity.
    pub id: OrderId,

    /// Customer who placed the order.
    pub customer_id: CustomerId,

    /// Current lifecycle state. A cache of the audit log.
    pub status: OrderStatus,

    /// External checkout-session identifier. Assigned once, never reassigned.
    pub provider_reference: Option<String>,

    /// Total amount in minor currency units. Immutable after creation.
    pub amount_minor: i64,

    /// ISO 4217 currency code. Immutable after creation.
    pub currency: String,

    /// Line items with snapshotted prices.
    pub items: Vec<LineItem>,

    /// Number of checkout attempts, counting the initial one.
    pub checkout_attempts: u32,

    /// When the provider last reported a failed payment.
    pub last_payment_failure_at: Option<Timestamp>,

    /// Optimistic concurrency token, incremented on every committed
    /// transition.
    pub version: i64,

    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Order {
    /// Creates a new order in `pending` from a cart snapshot.
    ///
    /// The total is computed from the snapshotted line items and frozen.
    pub fn create(
        id: OrderId,
        customer_id: CustomerId,
        items: Vec<LineItem>,
        currency: impl Into<String>,
        now: Timestamp,
    ) -> Result<Self, OrderError> {
        if items.is_empty() {
            return Err(OrderError::EmptyOrder);
        }
        let currency = currency.into();
        if currency.len() != 3 {
            return Err(OrderError::InvalidLineItem(format!(
                "currency must be an ISO 4217 code, got '{}'",
                currency
            )));
        }

        let amount_minor = items.iter().map(LineItem::subtotal_minor).sum();

        Ok(Self {
            id,
            customer_id,
            status: OrderStatus::Pending,
            provider_reference: None,
            amount_minor,
            currency,
            items,
            checkout_attempts: 1,
            last_payment_failure_at: None,
            version: 0,
            created_at: now,
            updated_at: now,
        })
    }

    /// Assigns the provider checkout-session reference. Set once.
    pub fn assign_provider_reference(
        &mut self,
        reference: impl Into<String>,
    ) -> Result<(), OrderError> {
        if self.provider_reference.is_some() {
            return Err(OrderError::ProviderReferenceAlreadySet);
        }
        self.provider_reference = Some(reference.into());
        Ok(())
    }

    /// Applies a state transition through the state machine.
    ///
    /// On success the status changes, the version is incremented, and the
    /// retry bookkeeping is updated. The caller must persist the result with
    /// a write conditioned on the previous version.
    pub fn transition(&mut self, target: OrderStatus, now: Timestamp) -> Result<(), OrderError> {
        if !self.status.can_transition_to(&target) {
            return Err(OrderError::invalid_transition(self.status, target));
        }

        if target == OrderStatus::PaymentFailed {
            self.last_payment_failure_at = Some(now);
        }
        if self.status == OrderStatus::PaymentFailed && target == OrderStatus::AwaitingPayment {
            self.checkout_attempts += 1;
        }

        self.status = target;
        self.version += 1;
        self.updated_at = now;
        Ok(())
    }
}

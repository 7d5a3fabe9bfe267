//! RetryCheckoutHandler - Policy-guarded checkout retry after a failed
//! payment.
//!
//! The order keeps its original provider session reference; the transition
//! back to `awaiting_payment` re-opens the order for payment.

use std::sync::Arc;

use crate::domain::foundation::{OrderId, Timestamp};
use crate::domain::orders::{CheckoutRetryPolicy, Order, OrderError, OrderStatus, TransitionActor};
use crate::ports::OrderRepository;

use super::commit_transition_with_retry;

/// Command to retry checkout for a failed payment.
#[derive(Debug, Clone)]
pub struct RetryCheckoutCommand {
    pub order_id: OrderId,
}

/// Handler for the `payment_failed -> awaiting_payment` retry.
pub struct RetryCheckoutHandler {
    orders: Arc<dyn OrderRepository>,
    policy: CheckoutRetryPolicy,
}

impl RetryCheckoutHandler {
    pub fn new(orders: Arc<dyn OrderRepository>, policy: CheckoutRetryPolicy) -> Self {
        Self { orders, policy }
    }

    pub async fn handle(&self, cmd: RetryCheckoutCommand) -> Result<Order, OrderError> {
        let order = self
            .orders
            .find_by_id(&cmd.order_id)
            .await?
            .ok_or(OrderError::NotFound(cmd.order_id))?;

        self.policy.check_eligible(&order, Timestamp::now())?;

        let order = commit_transition_with_retry(
            self.orders.as_ref(),
            &cmd.order_id,
            OrderStatus::AwaitingPayment,
            TransitionActor::Admin,
            None,
        )
        .await?;

        tracing::info!(
            order_id = %order.id,
            attempt = order.checkout_attempts,
            "Checkout retry opened"
        );
        Ok(order)
    }
}

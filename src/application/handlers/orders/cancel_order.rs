//! CancelOrderHandler - Explicit cancellation (admin action or timeout).

use std::sync::Arc;

use crate::domain::foundation::OrderId;
use crate::domain::orders::{Order, OrderError, OrderStatus, TransitionActor};
use crate::ports::{NotificationDispatcher, OrderRepository};

use super::commit_transition_with_retry;

/// Command to cancel an order.
#[derive(Debug, Clone)]
pub struct CancelOrderCommand {
    pub order_id: OrderId,
}

/// Handler for explicit cancellation from any non-terminal state.
pub struct CancelOrderHandler {
    orders: Arc<dyn OrderRepository>,
    notifier: Arc<dyn NotificationDispatcher>,
}

impl CancelOrderHandler {
    pub fn new(orders: Arc<dyn OrderRepository>, notifier: Arc<dyn NotificationDispatcher>) -> Self {
        Self { orders, notifier }
    }

    pub async fn handle(&self, cmd: CancelOrderCommand) -> Result<Order, OrderError> {
        let order = commit_transition_with_retry(
            self.orders.as_ref(),
            &cmd.order_id,
            OrderStatus::Canceled,
            TransitionActor::Admin,
            None,
        )
        .await?;

        tracing::info!(order_id = %order.id, "Order canceled");
        self.notifier.order_transitioned(order.id, order.status).await;
        Ok(order)
    }
}

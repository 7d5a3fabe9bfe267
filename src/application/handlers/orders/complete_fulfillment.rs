//! CompleteFulfillmentHandler - Internal trigger marking fulfillment done.

use std::sync::Arc;

use crate::domain::foundation::OrderId;
use crate::domain::orders::{Order, OrderError, OrderStatus, TransitionActor};
use crate::ports::{NotificationDispatcher, OrderRepository};

use super::commit_transition_with_retry;

/// Command to mark an order's fulfillment complete.
#[derive(Debug, Clone)]
pub struct CompleteFulfillmentCommand {
    pub order_id: OrderId,
}

/// Handler for the `fulfilling -> fulfilled` trigger.
pub struct CompleteFulfillmentHandler {
    orders: Arc<dyn OrderRepository>,
    notifier: Arc<dyn NotificationDispatcher>,
}

impl CompleteFulfillmentHandler {
    pub fn new(orders: Arc<dyn OrderRepository>, notifier: Arc<dyn NotificationDispatcher>) -> Self {
        Self { orders, notifier }
    }

    pub async fn handle(&self, cmd: CompleteFulfillmentCommand) -> Result<Order, OrderError> {
        let order = commit_transition_with_retry(
            self.orders.as_ref(),
            &cmd.order_id,
            OrderStatus::Fulfilled,
            TransitionActor::System,
            None,
        )
        .await?;

        tracing::info!(order_id = %order.id, "Fulfillment complete");
        self.notifier.order_transitioned(order.id, order.status).await;
        Ok(order)
    }
}

//! StartFulfillmentHandler - Internal trigger moving a paid order into
//! fulfillment.

use std::sync::Arc;

use crate::domain::foundation::OrderId;
use crate::domain::orders::{Order, OrderError, OrderStatus, TransitionActor};
use crate::ports::OrderRepository;

use super::commit_transition_with_retry;

/// Command to begin fulfilling a paid order.
#[derive(Debug, Clone)]
pub struct StartFulfillmentCommand {
    pub order_id: OrderId,
}

/// Handler for the `paid -> fulfilling` trigger.
pub struct StartFulfillmentHandler {
    orders: Arc<dyn OrderRepository>,
}

impl StartFulfillmentHandler {
    pub fn new(orders: Arc<dyn OrderRepository>) -> Self {
        Self { orders }
    }

    pub async fn handle(&self, cmd: StartFulfillmentCommand) -> Result<Order, OrderError> {
        let order = commit_transition_with_retry(
            self.orders.as_ref(),
            &cmd.order_id,
            OrderStatus::Fulfilling,
            TransitionActor::System,
            None,
        )
        .await?;

        tracing::info!(order_id = %order.id, "Fulfillment started");
        Ok(order)
    }
}

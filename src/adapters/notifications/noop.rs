//! No-op notification dispatcher.

use async_trait::async_trait;

use crate::domain::foundation::OrderId;
use crate::domain::orders::OrderStatus;
use crate::ports::NotificationDispatcher;

/// Dispatcher for deployments without a notification gateway.
pub struct NoopDispatcher;

#[async_trait]
impl NotificationDispatcher for NoopDispatcher {
    async fn order_transitioned(&self, order_id: OrderId, new_state: OrderStatus) {
        tracing::debug!(
            order_id = %order_id,
            new_state = %new_state,
            "Notification dispatch disabled"
        );
    }
}

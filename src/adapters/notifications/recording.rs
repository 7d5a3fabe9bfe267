//! Recording notification dispatcher for tests.

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::foundation::OrderId;
use crate::domain::orders::OrderStatus;
use crate::ports::NotificationDispatcher;

/// Dispatcher that records every announcement for later assertions.
pub struct RecordingDispatcher {
    notifications: Mutex<Vec<(OrderId, OrderStatus)>>,
}

impl RecordingDispatcher {
    pub fn new() -> Self {
        Self {
            notifications: Mutex::new(Vec::new()),
        }
    }

    /// Every recorded announcement, in dispatch order.
    pub async fn notifications(&self) -> Vec<(OrderId, OrderStatus)> {
        self.notifications.lock().await.clone()
    }
}

impl Default for RecordingDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NotificationDispatcher for RecordingDispatcher {
    async fn order_transitioned(&self, order_id: OrderId, new_state: OrderStatus) {
        self.notifications.lock().await.push((order_id, new_state));
    }
}

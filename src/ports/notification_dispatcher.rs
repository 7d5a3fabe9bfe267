//! NotificationDispatcher port - Fire-and-forget transition announcements.
//!
//! The dispatcher is told about committed terminal-ish transitions so the
//! notification subsystem can inform customers and admins. It is invoked
//! strictly after the transition is durable; a dispatch failure must never
//! roll the transition back, so the method returns nothing and
//! implementations log their own failures.

use async_trait::async_trait;

use crate::domain::foundation::OrderId;
use crate::domain::orders::OrderStatus;

/// Port for the notification collaborator.
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    /// Announces a committed transition. Best effort; never fails the caller.
    async fn order_transitioned(&self, order_id: OrderId, new_state: OrderStatus);
}

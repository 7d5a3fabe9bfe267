//! CreateCheckoutHandler - Creates an order and its provider checkout session.
//!
//! The counterpart of the webhook receiver: this is where the events it
//! later consumes are set in motion. The order is persisted in `pending`,
//! the provider session is created with the order id in its metadata, and
//! the `pending -> awaiting_payment` transition is routed through the same
//! audited commit path as webhook-driven transitions.

use std::sync::Arc;

use crate::domain::foundation::{CustomerId, OrderId, Timestamp};
use crate::domain::orders::{
    LineItem, NewAuditEntry, Order, OrderError, OrderStatus, TransitionActor,
};
use crate::ports::{
    CommitOutcome, CreateSessionRequest, OrderRepository, PaymentProvider, SessionLineItem,
};

/// Command to start a checkout from a cart snapshot.
#[derive(Debug, Clone)]
pub struct CreateCheckoutCommand {
    pub customer_id: CustomerId,
    pub currency: String,
    pub items: Vec<LineItem>,
    pub success_url: String,
    pub cancel_url: String,
}

/// Result of a started checkout.
#[derive(Debug, Clone)]
pub struct CreateCheckoutResult {
    pub order: Order,
    pub checkout_url: String,
}

/// Handler for checkout creation.
pub struct CreateCheckoutHandler {
    orders: Arc<dyn OrderRepository>,
    payment_provider: Arc<dyn PaymentProvider>,
}

impl CreateCheckoutHandler {
    pub fn new(orders: Arc<dyn OrderRepository>, payment_provider: Arc<dyn PaymentProvider>) -> Self {
        Self {
            orders,
            payment_provider,
        }
    }

    pub async fn handle(&self, cmd: CreateCheckoutCommand) -> Result<CreateCheckoutResult, OrderError> {
        let now = Timestamp::now();
        let mut order = Order::create(OrderId::new(), cmd.customer_id, cmd.items, cmd.currency, now)?;

        self.orders.insert(&order).await?;

        let session = self
            .payment_provider
            .create_checkout_session(CreateSessionRequest {
                order_id: order.id,
                amount_minor: order.amount_minor,
                currency: order.currency.clone(),
                line_items: order
                    .items
                    .iter()
                    .map(|item| SessionLineItem {
                        product_ref: item.product_ref.clone(),
                        quantity: item.quantity,
                        unit_price_minor: item.unit_price_minor,
                    })
                    .collect(),
                success_url: cmd.success_url,
                cancel_url: cmd.cancel_url,
            })
            .await
            .map_err(|e| {
                tracing::warn!(order_id = %order.id, error = %e, "Checkout session creation failed");
                // The pending order stays behind so checkout can be retried.
                OrderError::ProviderUnavailable(e.to_string())
            })?;

        order.assign_provider_reference(session.id.clone())?;

        // The session-confirmed transition goes through the state machine
        // like any other, so it is audited identically.
        let from = order.status;
        let expected_version = order.version;
        order.transition(OrderStatus::AwaitingPayment, Timestamp::now())?;

        let entry = NewAuditEntry::applied(
            order.id,
            from,
            OrderStatus::AwaitingPayment,
            None,
            TransitionActor::System,
        );
        match self.orders.commit_transition(&order, expected_version, entry).await? {
            CommitOutcome::Committed => {}
            CommitOutcome::VersionConflict => return Err(OrderError::ConcurrentModification),
        }

        tracing::info!(
            order_id = %order.id,
            provider_reference = %session.id,
            amount_minor = order.amount_minor,
            currency = %order.currency,
            "Checkout session created"
        );

        Ok(CreateCheckoutResult {
            order,
            checkout_url: session.url,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{MemoryAuditLog, MemoryOrderRepository};
    use crate::adapters::provider::MockPaymentProvider;
    use crate::domain::orders::AuditOutcome;

    fn cmd() -> CreateCheckoutCommand {
        CreateCheckoutCommand {
            customer_id: CustomerId::new(),
            currency: "USD".to_string(),
            items: vec![LineItem::new("prod-a", 2, 2100).unwrap()],
            success_url: "https://shop.example/order/success".to_string(),
            cancel_url: "https://shop.example/order/cancel".to_string(),
        }
    }

    #[tokio::test]
    async fn checkout_creates_awaiting_payment_order() {
        let audit = Arc::new(MemoryAuditLog::new());
        let orders = Arc::new(MemoryOrderRepository::new(audit.clone()));
        let handler = CreateCheckoutHandler::new(orders.clone(), Arc::new(MockPaymentProvider::new()));

        let result = handler.handle(cmd()).await.unwrap();

        assert_eq!(result.order.status, OrderStatus::AwaitingPayment);
        assert_eq!(result.order.amount_minor, 4200);
        assert!(result.order.provider_reference.is_some());
        assert!(!result.checkout_url.is_empty());

        let stored = orders.find_by_id(&result.order.id).await.unwrap().unwrap();
        assert_eq!(stored.status, OrderStatus::AwaitingPayment);
        assert_eq!(stored.version, 1);
    }

    #[tokio::test]
    async fn checkout_transition_is_audited() {
        let audit = Arc::new(MemoryAuditLog::new());
        let orders = Arc::new(MemoryOrderRepository::new(audit.clone()));
        let handler = CreateCheckoutHandler::new(orders, Arc::new(MockPaymentProvider::new()));

        let result = handler.handle(cmd()).await.unwrap();

        let history = crate::ports::AuditLog::history(audit.as_ref(), &result.order.id)
            .await
            .unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].outcome, AuditOutcome::Applied);
        assert_eq!(history[0].from_state, Some(OrderStatus::Pending));
        assert_eq!(history[0].to_state, Some(OrderStatus::AwaitingPayment));
        assert_eq!(history[0].actor, TransitionActor::System);
    }

    #[tokio::test]
    async fn provider_failure_leaves_pending_order() {
        let audit = Arc::new(MemoryAuditLog::new());
        let orders = Arc::new(MemoryOrderRepository::new(audit));
        let handler =
            CreateCheckoutHandler::new(orders.clone(), Arc::new(MockPaymentProvider::failing()));

        let result = handler.handle(cmd()).await;
        assert!(matches!(result, Err(OrderError::ProviderUnavailable(_))));

        // The pending order survives for a later retry.
        let all = orders.all().await;
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].status, OrderStatus::Pending);
        assert!(all[0].provider_reference.is_none());
    }

    #[tokio::test]
    async fn empty_cart_is_rejected_before_any_side_effect() {
        let audit = Arc::new(MemoryAuditLog::new());
        let orders = Arc::new(MemoryOrderRepository::new(audit));
        let handler = CreateCheckoutHandler::new(orders.clone(), Arc::new(MockPaymentProvider::new()));

        let mut command = cmd();
        command.items = vec![];

        let result = handler.handle(command).await;
        assert!(matches!(result, Err(OrderError::EmptyOrder)));
        assert!(orders.all().await.is_empty());
    }
}

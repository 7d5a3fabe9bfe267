//! ProcessWebhookHandler - Verified, idempotent webhook application.
//!
//! Each delivery flows Verifier -> Deduplicator -> State Machine -> Audit
//! Log, with the notification dispatcher invoked best-effort after a
//! committed transition. Deliveries for different orders proceed in
//! parallel; deliveries for the same order are serialized only by the
//! version-conditioned write; duplicate deliveries of the same event are
//! serialized only by the dedup admission insert.

use std::sync::Arc;

use crate::domain::foundation::{DomainError, OrderId, Timestamp};
use crate::domain::orders::{NewAuditEntry, OrderError, OrderStatus, TransitionActor};
use crate::domain::payments::{ProviderEvent, WebhookError, WebhookVerifier};
use crate::ports::{
    Admission, AuditLog, NotificationDispatcher, OrderRepository, WebhookDeliveryRecord,
    WebhookEventRepository,
};

use super::commit_transition_with_retry;

/// Command carrying one raw webhook delivery.
#[derive(Debug, Clone)]
pub struct ProcessWebhookCommand {
    /// Exact raw request body bytes; the signature covers these, not a
    /// re-serialized form.
    pub payload: Vec<u8>,

    /// Value of the `Payment-Signature` header.
    pub signature: String,
}

/// Successful dispositions of a delivery. All of these acknowledge with 200
/// so the provider stops retrying.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookDisposition {
    /// Event applied; the order moved to `new_status`.
    Applied {
        order_id: OrderId,
        new_status: OrderStatus,
    },

    /// Event id was already admitted; nothing changed.
    Duplicate,

    /// Verified event of a type this core does not process.
    Ignored,
}

/// Handler for inbound provider webhooks.
pub struct ProcessWebhookHandler {
    verifier: Arc<WebhookVerifier>,
    orders: Arc<dyn OrderRepository>,
    webhook_events: Arc<dyn WebhookEventRepository>,
    audit: Arc<dyn AuditLog>,
    notifier: Arc<dyn NotificationDispatcher>,
}

impl ProcessWebhookHandler {
    pub fn new(
        verifier: Arc<WebhookVerifier>,
        orders: Arc<dyn OrderRepository>,
        webhook_events: Arc<dyn WebhookEventRepository>,
        audit: Arc<dyn AuditLog>,
        notifier: Arc<dyn NotificationDispatcher>,
    ) -> Self {
        Self {
            verifier,
            orders,
            webhook_events,
            audit,
            notifier,
        }
    }

    /// Processes one delivery end to end.
    ///
    /// Either the transition commits (with its audit entry) or nothing
    /// commits; there is no partial-apply state. Every delivery leaves a
    /// journal record, and every rejection leaves an audit entry.
    pub async fn handle(
        &self,
        cmd: ProcessWebhookCommand,
    ) -> Result<WebhookDisposition, WebhookError> {
        let received_at = Timestamp::now();

        // 1. Authenticity. Failures are logged loudly and never retried;
        //    they indicate misconfiguration or an attack. The forensic trace
        //    deliberately omits the payload, which cannot be trusted.
        if let Err(err) = self.verifier.verify(&cmd.payload, &cmd.signature) {
            tracing::error!(error = %err, "Webhook signature verification failed");
            self.audit.append(NewAuditEntry::rejected_signature()).await?;
            self.webhook_events
                .record_delivery(WebhookDeliveryRecord::rejected_signature(received_at))
                .await?;
            return Err(err);
        }

        // 2. Parse the now-trusted payload.
        let event = match ProviderEvent::from_payload(&cmd.payload) {
            Ok(event) => event,
            Err(err) => {
                tracing::warn!(error = %err, "Verified webhook payload failed to parse");
                self.webhook_events
                    .record_delivery(WebhookDeliveryRecord::ignored(None, None, received_at))
                    .await?;
                return Err(err);
            }
        };

        // 3. Event types outside the reconciliation contract are
        //    acknowledged so the provider stops retrying them.
        let Some(target) = event.event_type.target_status() else {
            tracing::debug!(event_id = %event.id, event_type = %event.event_type.as_str(), "Ignoring unhandled event type");
            self.webhook_events
                .record_delivery(WebhookDeliveryRecord::ignored(
                    Some(event.id.clone()),
                    Some(event.event_type.as_str().to_string()),
                    received_at,
                ))
                .await?;
            return Ok(WebhookDisposition::Ignored);
        };

        // 4. Dedup admission: the unique insert is the serialization point.
        match self.webhook_events.admit(&event.id).await? {
            Admission::AlreadySeen => {
                tracing::info!(event_id = %event.id, "Duplicate webhook delivery");
                self.webhook_events
                    .record_delivery(WebhookDeliveryRecord::duplicate(
                        event.id.clone(),
                        event.event_type.as_str().to_string(),
                        received_at,
                    ))
                    .await?;
                return Ok(WebhookDisposition::Duplicate);
            }
            Admission::FirstSeen => {}
        }

        let order_id = event
            .order_id
            .ok_or(WebhookError::MissingMetadata("order_id"))?;

        // 5. Apply through the state machine.
        match commit_transition_with_retry(
            self.orders.as_ref(),
            &order_id,
            target,
            TransitionActor::Provider,
            Some(&event.id),
        )
        .await
        {
            Ok(order) => {
                self.webhook_events
                    .record_delivery(WebhookDeliveryRecord::applied(
                        event.id.clone(),
                        event.event_type.as_str().to_string(),
                        received_at,
                    ))
                    .await?;

                tracing::info!(
                    event_id = %event.id,
                    order_id = %order.id,
                    new_status = %order.status,
                    "Webhook event applied"
                );

                // Dispatch strictly after the durable commit; failures are
                // the adapter's to log, never ours to propagate.
                if order.status.triggers_notification() {
                    self.notifier.order_transitioned(order.id, order.status).await;
                }

                Ok(WebhookDisposition::Applied {
                    order_id: order.id,
                    new_status: order.status,
                })
            }

            Err(OrderError::InvalidTransition { from, to }) => {
                // Terminal rejection: the admission is kept, the provider
                // must not retry.
                tracing::warn!(
                    event_id = %event.id,
                    order_id = %order_id,
                    from = %from,
                    to = %to,
                    "Webhook event rejected by state machine"
                );
                self.audit
                    .append(NewAuditEntry::rejected_state(
                        order_id,
                        from,
                        to,
                        Some(event.id.clone()),
                        TransitionActor::Provider,
                    ))
                    .await?;
                self.webhook_events
                    .record_delivery(WebhookDeliveryRecord::rejected_state(
                        event.id.clone(),
                        event.event_type.as_str().to_string(),
                        received_at,
                    ))
                    .await?;
                Err(WebhookError::RejectedState { from, to })
            }

            Err(err) => {
                // Transient failure after admission: release the admission
                // so the provider's retry is re-admitted, journal the
                // attempt, and answer 5xx.
                self.abandon_admission(&event, received_at).await;

                let webhook_err = match err {
                    OrderError::NotFound(id) => WebhookError::OrderNotFound(id),
                    OrderError::ConcurrentModification => WebhookError::ConcurrencyExhausted,
                    other => WebhookError::Database(other.to_string()),
                };
                tracing::error!(
                    event_id = %event.id,
                    order_id = %order_id,
                    error = %webhook_err,
                    "Webhook processing failed, inviting provider retry"
                );
                Err(webhook_err)
            }
        }
    }

    /// Best-effort compensation after a post-admission failure. The request
    /// is already failing, so these writes only log on error.
    async fn abandon_admission(&self, event: &ProviderEvent, received_at: Timestamp) {
        if let Err(e) = self.webhook_events.release(&event.id).await {
            tracing::error!(event_id = %event.id, error = %e, "Failed to release webhook admission");
        }
        if let Err(e) = self
            .webhook_events
            .record_delivery(WebhookDeliveryRecord::failed(
                event.id.clone(),
                event.event_type.as_str().to_string(),
                received_at,
            ))
            .await
        {
            tracing::error!(event_id = %event.id, error = %e, "Failed to journal webhook delivery");
        }
    }
}

impl From<DomainError> for WebhookError {
    fn from(err: DomainError) -> Self {
        WebhookError::Database(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{
        MemoryAuditLog, MemoryOrderRepository, MemoryWebhookEventRepository,
    };
    use crate::adapters::notifications::RecordingDispatcher;
    use crate::domain::foundation::CustomerId;
    use crate::domain::orders::{AuditOutcome, LineItem, Order};
    use crate::domain::payments::compute_signature_hex;
    use crate::ports::DeliveryOutcome;
    use secrecy::SecretString;

    const SECRET: &str = "whsec_test_secret";

    struct Fixture {
        handler: ProcessWebhookHandler,
        orders: Arc<MemoryOrderRepository>,
        webhook_events: Arc<MemoryWebhookEventRepository>,
        audit: Arc<MemoryAuditLog>,
        notifier: Arc<RecordingDispatcher>,
    }

    fn fixture() -> Fixture {
        let audit = Arc::new(MemoryAuditLog::new());
        let orders = Arc::new(MemoryOrderRepository::new(audit.clone()));
        let webhook_events = Arc::new(MemoryWebhookEventRepository::new());
        let notifier = Arc::new(RecordingDispatcher::new());
        let verifier = Arc::new(WebhookVerifier::new(SecretString::new(SECRET.to_string())));

        let handler = ProcessWebhookHandler::new(
            verifier,
            orders.clone(),
            webhook_events.clone(),
            audit.clone(),
            notifier.clone(),
        );

        Fixture {
            handler,
            orders,
            webhook_events,
            audit,
            notifier,
        }
    }

    async fn seeded_order(fixture: &Fixture, status: OrderStatus) -> Order {
        let mut order = Order::create(
            OrderId::new(),
            CustomerId::new(),
            vec![LineItem::new("prod-a", 1, 4200).unwrap()],
            "USD",
            Timestamp::now(),
        )
        .unwrap();
        order.assign_provider_reference("cs_test").unwrap();
        let now = Timestamp::now();
        if status != OrderStatus::Pending {
            order.transition(OrderStatus::AwaitingPayment, now).unwrap();
        }
        if status == OrderStatus::Paid {
            order.transition(OrderStatus::Paid, now).unwrap();
        }
        fixture.orders.insert(&order).await.unwrap();
        order
    }

    fn signed_command(event_type: &str, event_id: &str, order_id: &OrderId) -> ProcessWebhookCommand {
        let payload = serde_json::json!({
            "id": event_id,
            "type": event_type,
            "created": chrono::Utc::now().timestamp(),
            "data": {
                "object": {
                    "id": "cs_test",
                    "metadata": { "order_id": order_id.to_string() }
                }
            },
            "livemode": false
        })
        .to_string()
        .into_bytes();

        let timestamp = chrono::Utc::now().timestamp();
        let signature = format!(
            "t={},v1={}",
            timestamp,
            compute_signature_hex(SECRET, timestamp, &payload)
        );
        ProcessWebhookCommand {
            payload,
            signature,
        }
    }

    #[tokio::test]
    async fn applies_payment_succeeded() {
        let f = fixture();
        let order = seeded_order(&f, OrderStatus::AwaitingPayment).await;

        let disposition = f
            .handler
            .handle(signed_command("payment.succeeded", "evt_1", &order.id))
            .await
            .unwrap();

        assert_eq!(
            disposition,
            WebhookDisposition::Applied {
                order_id: order.id,
                new_status: OrderStatus::Paid
            }
        );
        let stored = f.orders.find_by_id(&order.id).await.unwrap().unwrap();
        assert_eq!(stored.status, OrderStatus::Paid);
    }

    #[tokio::test]
    async fn redelivery_is_duplicate_and_state_unchanged() {
        let f = fixture();
        let order = seeded_order(&f, OrderStatus::AwaitingPayment).await;

        let first = f
            .handler
            .handle(signed_command("payment.succeeded", "evt_1", &order.id))
            .await
            .unwrap();
        assert!(matches!(first, WebhookDisposition::Applied { .. }));

        let second = f
            .handler
            .handle(signed_command("payment.succeeded", "evt_1", &order.id))
            .await
            .unwrap();
        assert_eq!(second, WebhookDisposition::Duplicate);

        let stored = f.orders.find_by_id(&order.id).await.unwrap().unwrap();
        assert_eq!(stored.status, OrderStatus::Paid);
        assert_eq!(stored.version, 2);
    }

    #[tokio::test]
    async fn invalid_signature_is_rejected_and_traced() {
        let f = fixture();
        let order = seeded_order(&f, OrderStatus::AwaitingPayment).await;

        let mut cmd = signed_command("payment.succeeded", "evt_1", &order.id);
        cmd.signature = format!("t={},v1={}", chrono::Utc::now().timestamp(), "ab".repeat(32));

        let result = f.handler.handle(cmd).await;
        assert!(matches!(result, Err(WebhookError::InvalidSignature)));

        // No order change.
        let stored = f.orders.find_by_id(&order.id).await.unwrap().unwrap();
        assert_eq!(stored.status, OrderStatus::AwaitingPayment);

        // Forensic trace without payload data.
        let entries = f.audit.all().await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].outcome, AuditOutcome::RejectedSignature);
        assert!(entries[0].order_id.is_none());

        let journal = f.webhook_events.all_deliveries().await;
        assert_eq!(journal.len(), 1);
        assert_eq!(journal[0].outcome, DeliveryOutcome::RejectedSignature);
        assert!(journal[0].event_id.is_none());
    }

    #[tokio::test]
    async fn stale_timestamp_is_rejected() {
        let f = fixture();
        let order = seeded_order(&f, OrderStatus::AwaitingPayment).await;

        let payload = signed_command("payment.succeeded", "evt_1", &order.id).payload;
        let stale = chrono::Utc::now().timestamp() - 600;
        let cmd = ProcessWebhookCommand {
            signature: format!(
                "t={},v1={}",
                stale,
                compute_signature_hex(SECRET, stale, &payload)
            ),
            payload,
        };

        let result = f.handler.handle(cmd).await;
        assert!(matches!(result, Err(WebhookError::StaleTimestamp)));
    }

    #[tokio::test]
    async fn illegal_transition_is_rejected_state() {
        let f = fixture();
        // Refund of an order that was never paid.
        let order = seeded_order(&f, OrderStatus::AwaitingPayment).await;

        let result = f
            .handler
            .handle(signed_command("refund.issued", "evt_refund", &order.id))
            .await;

        assert!(matches!(result, Err(WebhookError::RejectedState { .. })));

        let stored = f.orders.find_by_id(&order.id).await.unwrap().unwrap();
        assert_eq!(stored.status, OrderStatus::AwaitingPayment);

        let entries = f.audit.all().await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].outcome, AuditOutcome::RejectedState);
        assert_eq!(entries[0].from_state, Some(OrderStatus::AwaitingPayment));
        assert_eq!(entries[0].to_state, Some(OrderStatus::Refunded));
    }

    #[tokio::test]
    async fn unknown_event_type_is_acknowledged() {
        let f = fixture();
        let order = seeded_order(&f, OrderStatus::AwaitingPayment).await;

        let disposition = f
            .handler
            .handle(signed_command("customer.created", "evt_misc", &order.id))
            .await
            .unwrap();

        assert_eq!(disposition, WebhookDisposition::Ignored);
        let journal = f.webhook_events.all_deliveries().await;
        assert_eq!(journal[0].outcome, DeliveryOutcome::Ignored);
    }

    #[tokio::test]
    async fn unknown_order_releases_admission_for_retry() {
        let f = fixture();
        let missing = OrderId::new();

        let result = f
            .handler
            .handle(signed_command("payment.succeeded", "evt_orphan", &missing))
            .await;
        assert!(matches!(result, Err(WebhookError::OrderNotFound(_))));

        // The admission was released, so a later retry of the same event id
        // can still apply once the order exists.
        let order = seeded_order(&f, OrderStatus::AwaitingPayment).await;
        let retry = f
            .handler
            .handle(signed_command("payment.succeeded", "evt_orphan", &order.id))
            .await
            .unwrap();
        assert!(matches!(retry, WebhookDisposition::Applied { .. }));
    }

    #[tokio::test]
    async fn applied_paid_transition_notifies() {
        let f = fixture();
        let order = seeded_order(&f, OrderStatus::AwaitingPayment).await;

        f.handler
            .handle(signed_command("payment.succeeded", "evt_1", &order.id))
            .await
            .unwrap();

        let notified = f.notifier.notifications().await;
        assert_eq!(notified, vec![(order.id, OrderStatus::Paid)]);
    }

    #[tokio::test]
    async fn checkout_confirmation_does_not_notify() {
        let f = fixture();
        let order = seeded_order(&f, OrderStatus::Pending).await;

        f.handler
            .handle(signed_command("checkout.session.confirmed", "evt_cs", &order.id))
            .await
            .unwrap();

        assert!(f.notifier.notifications().await.is_empty());
    }

    #[tokio::test]
    async fn concurrent_duplicate_deliveries_apply_once() {
        let f = fixture();
        let order = seeded_order(&f, OrderStatus::AwaitingPayment).await;

        let handler = Arc::new(f.handler);
        let mut tasks = Vec::new();
        for _ in 0..8 {
            let handler = handler.clone();
            let cmd = signed_command("payment.succeeded", "evt_burst", &order.id);
            tasks.push(tokio::spawn(async move { handler.handle(cmd).await }));
        }

        let mut applied = 0;
        let mut duplicates = 0;
        for task in tasks {
            match task.await.unwrap().unwrap() {
                WebhookDisposition::Applied { .. } => applied += 1,
                WebhookDisposition::Duplicate => duplicates += 1,
                WebhookDisposition::Ignored => panic!("unexpected ignore"),
            }
        }

        assert_eq!(applied, 1);
        assert_eq!(duplicates, 7);

        let stored = f.orders.find_by_id(&order.id).await.unwrap().unwrap();
        assert_eq!(stored.status, OrderStatus::Paid);
        assert_eq!(stored.version, 2);
    }
}

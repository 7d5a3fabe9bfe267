//! Ports - Interfaces between the domain and the outside world.
//!
//! Every external collaborator (persistent store, payment provider,
//! notification sink) is reached through a trait defined here, so the
//! reconciliation core can be exercised against in-memory fakes.

mod audit_log;
mod notification_dispatcher;
mod order_repository;
mod payment_provider;
mod webhook_event_repository;

pub use audit_log::AuditLog;
pub use notification_dispatcher::NotificationDispatcher;
pub use order_repository::{CommitOutcome, OrderRepository};
pub use payment_provider::{
    CheckoutSession, CreateSessionRequest, PaymentError, PaymentErrorCode, PaymentProvider,
    SessionLineItem,
};
pub use webhook_event_repository::{
    Admission, DeliveryOutcome, WebhookDeliveryRecord, WebhookEventRepository,
};

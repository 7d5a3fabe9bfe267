//! WebhookEventRepository port - Dedup admission and the delivery journal.
//!
//! The provider may deliver the same event several times: network timeouts,
//! a 5xx from our endpoint, or a lost acknowledgement all trigger retries.
//! At-most-once effect is guaranteed by `admit`: a unique-constrained insert
//! of the event id. The insert itself is the serialization point, so two
//! near-simultaneous deliveries of the same event cannot both be classified
//! as first-seen, and the state survives process restarts.
//!
//! Independently of admission, every delivery attempt is journaled as an
//! immutable `WebhookDeliveryRecord`; redeliveries append new records for
//! the same event id.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, Timestamp};

/// Result of attempting to admit an event id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// This process won the insert; the event must now be applied.
    FirstSeen,

    /// The event id was admitted before (possibly by a concurrent request).
    AlreadySeen,
}

/// Disposition of one delivery attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// Event applied to the order state machine.
    Applied,

    /// Event id had already been admitted; no effect.
    Duplicate,

    /// Signature or signed timestamp failed verification.
    RejectedSignature,

    /// The state machine refused the requested transition.
    RejectedState,

    /// Verified but not processable (unknown event type, unparseable body).
    Ignored,

    /// Processing failed after admission; the admission was released and the
    /// provider invited to retry.
    Failed,
}

impl DeliveryOutcome {
    /// Stable wire/database name for this outcome.
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryOutcome::Applied => "applied",
            DeliveryOutcome::Duplicate => "duplicate",
            DeliveryOutcome::RejectedSignature => "rejected_signature",
            DeliveryOutcome::RejectedState => "rejected_state",
            DeliveryOutcome::Ignored => "ignored",
            DeliveryOutcome::Failed => "failed",
        }
    }

    /// Parses the stable wire/database name.
    pub fn parse(s: &str) -> Option<DeliveryOutcome> {
        match s {
            "applied" => Some(DeliveryOutcome::Applied),
            "duplicate" => Some(DeliveryOutcome::Duplicate),
            "rejected_signature" => Some(DeliveryOutcome::RejectedSignature),
            "rejected_state" => Some(DeliveryOutcome::RejectedState),
            "ignored" => Some(DeliveryOutcome::Ignored),
            "failed" => Some(DeliveryOutcome::Failed),
            _ => None,
        }
    }
}

/// Journal record of one webhook delivery attempt. Immutable once written.
#[derive(Debug, Clone)]
pub struct WebhookDeliveryRecord {
    /// Provider event id. `None` when the payload failed verification and
    /// cannot be trusted.
    pub event_id: Option<String>,

    /// Provider event type, when parseable.
    pub event_type: Option<String>,

    /// When the delivery arrived.
    pub received_at: Timestamp,

    /// When processing finished applying the event, if it did.
    pub processed_at: Option<Timestamp>,

    /// Disposition of this delivery.
    pub outcome: DeliveryOutcome,
}

impl WebhookDeliveryRecord {
    /// Record for an applied event.
    pub fn applied(
        event_id: impl Into<String>,
        event_type: impl Into<String>,
        received_at: Timestamp,
    ) -> Self {
        Self {
            event_id: Some(event_id.into()),
            event_type: Some(event_type.into()),
            received_at,
            processed_at: Some(Timestamp::now()),
            outcome: DeliveryOutcome::Applied,
        }
    }

    /// Record for a redelivered, already-admitted event.
    pub fn duplicate(
        event_id: impl Into<String>,
        event_type: impl Into<String>,
        received_at: Timestamp,
    ) -> Self {
        Self {
            event_id: Some(event_id.into()),
            event_type: Some(event_type.into()),
            received_at,
            processed_at: None,
            outcome: DeliveryOutcome::Duplicate,
        }
    }

    /// Record for a delivery that failed signature verification. No payload
    /// data is retained.
    pub fn rejected_signature(received_at: Timestamp) -> Self {
        Self {
            event_id: None,
            event_type: None,
            received_at,
            processed_at: None,
            outcome: DeliveryOutcome::RejectedSignature,
        }
    }

    /// Record for a delivery the state machine refused.
    pub fn rejected_state(
        event_id: impl Into<String>,
        event_type: impl Into<String>,
        received_at: Timestamp,
    ) -> Self {
        Self {
            event_id: Some(event_id.into()),
            event_type: Some(event_type.into()),
            received_at,
            processed_at: None,
            outcome: DeliveryOutcome::RejectedState,
        }
    }

    /// Record for a verified delivery this core does not process.
    pub fn ignored(event_id: Option<String>, event_type: Option<String>, received_at: Timestamp) -> Self {
        Self {
            event_id,
            event_type,
            received_at,
            processed_at: None,
            outcome: DeliveryOutcome::Ignored,
        }
    }

    /// Record for a delivery whose processing failed after admission.
    pub fn failed(
        event_id: impl Into<String>,
        event_type: impl Into<String>,
        received_at: Timestamp,
    ) -> Self {
        Self {
            event_id: Some(event_id.into()),
            event_type: Some(event_type.into()),
            received_at,
            processed_at: None,
            outcome: DeliveryOutcome::Failed,
        }
    }
}

/// Port for webhook event dedup and the delivery journal.
#[async_trait]
pub trait WebhookEventRepository: Send + Sync {
    /// Attempts to admit an event id for processing.
    ///
    /// Implementations must make the underlying insert atomic under
    /// concurrency (unique constraint in a database, a single guarded set in
    /// memory).
    async fn admit(&self, event_id: &str) -> Result<Admission, DomainError>;

    /// Releases a previously won admission.
    ///
    /// Compensating action for processing that failed after `admit` returned
    /// `FirstSeen`: the delivery answers 5xx and the provider's retry must be
    /// admitted again.
    async fn release(&self, event_id: &str) -> Result<(), DomainError>;

    /// Appends a delivery record to the journal.
    async fn record_delivery(&self, record: WebhookDeliveryRecord) -> Result<(), DomainError>;

    /// Lists all delivery records for an event id, in arrival order.
    async fn deliveries_for(
        &self,
        event_id: &str,
    ) -> Result<Vec<WebhookDeliveryRecord>, DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn applied_record_has_processed_timestamp() {
        let record = WebhookDeliveryRecord::applied("evt_1", "payment.succeeded", Timestamp::now());
        assert_eq!(record.outcome, DeliveryOutcome::Applied);
        assert!(record.processed_at.is_some());
    }

    #[test]
    fn duplicate_record_has_no_processed_timestamp() {
        let record = WebhookDeliveryRecord::duplicate("evt_1", "payment.succeeded", Timestamp::now());
        assert_eq!(record.outcome, DeliveryOutcome::Duplicate);
        assert!(record.processed_at.is_none());
    }

    #[test]
    fn rejected_signature_record_retains_nothing_untrusted() {
        let record = WebhookDeliveryRecord::rejected_signature(Timestamp::now());
        assert!(record.event_id.is_none());
        assert!(record.event_type.is_none());
        assert_eq!(record.outcome, DeliveryOutcome::RejectedSignature);
    }

    #[test]
    fn outcome_names_round_trip() {
        for outcome in [
            DeliveryOutcome::Applied,
            DeliveryOutcome::Duplicate,
            DeliveryOutcome::RejectedSignature,
            DeliveryOutcome::RejectedState,
            DeliveryOutcome::Ignored,
            DeliveryOutcome::Failed,
        ] {
            assert_eq!(DeliveryOutcome::parse(outcome.as_str()), Some(outcome));
        }
        assert_eq!(DeliveryOutcome::parse("lost"), None);
    }
}

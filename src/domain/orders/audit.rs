//! Audit ledger vocabulary.
//!
//! Every attempted transition leaves an entry: committed transitions are
//! written in the same atomic unit as the order update, rejections are
//! appended standalone. Entries are never mutated or deleted; the mutable
//! `Order.status` is a cache of this log, never an independent source of
//! truth.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{OrderId, Timestamp};
use crate::domain::orders::OrderStatus;

/// Who drove a transition attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionActor {
    /// A verified payment-provider webhook event.
    Provider,

    /// An internal trigger (checkout initiator, fulfillment pipeline).
    System,

    /// An administrative action (cancellation, checkout retry).
    Admin,
}

impl TransitionActor {
    /// Stable wire/database name for this actor.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransitionActor::Provider => "provider",
            TransitionActor::System => "system",
            TransitionActor::Admin => "admin",
        }
    }

    /// Parses the stable wire/database name.
    pub fn parse(s: &str) -> Option<TransitionActor> {
        match s {
            "provider" => Some(TransitionActor::Provider),
            "system" => Some(TransitionActor::System),
            "admin" => Some(TransitionActor::Admin),
            _ => None,
        }
    }
}

/// Disposition of one audited transition attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditOutcome {
    /// Transition validated and committed.
    Applied,

    /// Transition rejected by the state machine; order unchanged.
    RejectedState,

    /// Delivery rejected before any order was resolved. No payload is
    /// retained for these entries.
    RejectedSignature,
}

impl AuditOutcome {
    /// Stable wire/database name for this outcome.
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditOutcome::Applied => "applied",
            AuditOutcome::RejectedState => "rejected_state",
            AuditOutcome::RejectedSignature => "rejected_signature",
        }
    }

    /// Parses the stable wire/database name.
    pub fn parse(s: &str) -> Option<AuditOutcome> {
        match s {
            "applied" => Some(AuditOutcome::Applied),
            "rejected_state" => Some(AuditOutcome::RejectedState),
            "rejected_signature" => Some(AuditOutcome::RejectedSignature),
            _ => None,
        }
    }
}

/// An audit entry before the store assigns sequence and timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAuditEntry {
    pub order_id: Option<OrderId>,
    pub from_state: Option<OrderStatus>,
    pub to_state: Option<OrderStatus>,
    pub triggering_event_id: Option<String>,
    pub actor: TransitionActor,
    pub outcome: AuditOutcome,
}

impl NewAuditEntry {
    /// Entry for a committed transition.
    pub fn applied(
        order_id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
        triggering_event_id: Option<String>,
        actor: TransitionActor,
    ) -> Self {
        Self {
            order_id: Some(order_id),
            from_state: Some(from),
            to_state: Some(to),
            triggering_event_id,
            actor,
            outcome: AuditOutcome::Applied,
        }
    }

    /// Entry for a transition the state machine refused.
    pub fn rejected_state(
        order_id: OrderId,
        from: OrderStatus,
        attempted: OrderStatus,
        triggering_event_id: Option<String>,
        actor: TransitionActor,
    ) -> Self {
        Self {
            order_id: Some(order_id),
            from_state: Some(from),
            to_state: Some(attempted),
            triggering_event_id,
            actor,
            outcome: AuditOutcome::RejectedState,
        }
    }

    /// Entry for a delivery whose signature (or signed timestamp) failed
    /// verification. The payload is untrusted and deliberately not recorded.
    pub fn rejected_signature() -> Self {
        Self {
            order_id: None,
            from_state: None,
            to_state: None,
            triggering_event_id: None,
            actor: TransitionActor::Provider,
            outcome: AuditOutcome::RejectedSignature,
        }
    }
}

/// A persisted audit entry.
///
/// `seq` is the store-assigned insertion sequence and breaks ties between
/// entries sharing a timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub seq: i64,
    pub order_id: Option<OrderId>,
    pub from_state: Option<OrderStatus>,
    pub to_state: Option<OrderStatus>,
    pub triggering_event_id: Option<String>,
    pub actor: TransitionActor,
    pub outcome: AuditOutcome,
    pub recorded_at: Timestamp,
}

/// Replays an ordered history, folding applied transitions, and returns the
/// final status.
///
/// Returns `None` for an empty (or applied-free) history. This is the
/// reconciliation primitive: for any order, replaying its history must
/// reproduce `Order.status` exactly.
pub fn replay_status(entries: &[AuditEntry]) -> Option<OrderStatus> {
    entries
        .iter()
        .filter(|e| e.outcome == AuditOutcome::Applied)
        .fold(None, |_, e| e.to_state)
}

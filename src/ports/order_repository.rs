//! OrderRepository port - Persistence for the order aggregate.
//!
//! The store must offer one primitive beyond plain reads and inserts: an
//! atomic conditional write. `commit_transition` persists a mutated order
//! only if the stored version still matches the version the caller read, and
//! writes the paired audit entry in the same atomic unit. Both succeed or
//! both fail; there are no orphaned audit entries and no un-audited state
//! changes.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, OrderId};
use crate::domain::orders::{NewAuditEntry, Order};

/// Result of a version-conditioned commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    /// The conditional write succeeded; order and audit entry are durable.
    Committed,

    /// The stored version no longer matched. Nothing was written; the caller
    /// must re-read and retry.
    VersionConflict,
}

/// Port for order persistence.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    /// Inserts a newly created order.
    async fn insert(&self, order: &Order) -> Result<(), DomainError>;

    /// Finds an order by its internal id.
    async fn find_by_id(&self, id: &OrderId) -> Result<Option<Order>, DomainError>;

    /// Finds an order by its provider checkout-session reference.
    async fn find_by_provider_reference(
        &self,
        reference: &str,
    ) -> Result<Option<Order>, DomainError>;

    /// Persists `order` (already transitioned in memory, so its `version` is
    /// `expected_version + 1`) together with the audit entry for the
    /// transition, conditioned on the stored version still being
    /// `expected_version`.
    async fn commit_transition(
        &self,
        order: &Order,
        expected_version: i64,
        entry: NewAuditEntry,
    ) -> Result<CommitOutcome, DomainError>;
}

//! AuditLog port - The append-only transition ledger.
//!
//! Committed transitions reach the ledger through
//! `OrderRepository::commit_transition` (same atomic unit as the order
//! update). This port covers the remaining writes, rejected attempts, and
//! the read side used for reconciliation, dispute resolution, and
//! replay-based state reconstruction.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, OrderId};
use crate::domain::orders::{AuditEntry, NewAuditEntry};

/// Port for the audit ledger.
#[async_trait]
pub trait AuditLog: Send + Sync {
    /// Appends an entry outside any transition transaction.
    ///
    /// Used for rejected attempts; the store assigns the sequence number and
    /// timestamp.
    async fn append(&self, entry: NewAuditEntry) -> Result<AuditEntry, DomainError>;

    /// Returns the full history of an order, ordered by timestamp and, for
    /// same-timestamp entries, by insertion sequence.
    async fn history(&self, order_id: &OrderId) -> Result<Vec<AuditEntry>, DomainError>;
}

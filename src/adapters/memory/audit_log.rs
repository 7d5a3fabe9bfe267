//! In-memory audit ledger.

use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, OrderId, Timestamp};
use crate::domain::orders::{AuditEntry, NewAuditEntry};
use crate::ports::AuditLog;

/// Append-only in-memory ledger.
pub struct MemoryAuditLog {
    entries: RwLock<Vec<AuditEntry>>,
    next_seq: AtomicI64,
}

impl MemoryAuditLog {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
            next_seq: AtomicI64::new(1),
        }
    }

    /// Materializes an entry with its store-assigned sequence and timestamp.
    fn materialize(&self, entry: NewAuditEntry) -> AuditEntry {
        AuditEntry {
            seq: self.next_seq.fetch_add(1, Ordering::SeqCst),
            order_id: entry.order_id,
            from_state: entry.from_state,
            to_state: entry.to_state,
            triggering_event_id: entry.triggering_event_id,
            actor: entry.actor,
            outcome: entry.outcome,
            recorded_at: Timestamp::now(),
        }
    }

    /// Every entry in the ledger, for assertions in tests.
    pub async fn all(&self) -> Vec<AuditEntry> {
        self.entries.read().await.clone()
    }
}

impl Default for MemoryAuditLog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuditLog for MemoryAuditLog {
    async fn append(&self, entry: NewAuditEntry) -> Result<AuditEntry, DomainError> {
        let entry = self.materialize(entry);
        self.entries.write().await.push(entry.clone());
        Ok(entry)
    }

    async fn history(&self, order_id: &OrderId) -> Result<Vec<AuditEntry>, DomainError> {
        let entries = self.entries.read().await;
        let mut history: Vec<AuditEntry> = entries
            .iter()
            .filter(|e| e.order_id.as_ref() == Some(order_id))
            .cloned()
            .collect();
        history.sort_by_key(|e| (e.recorded_at, e.seq));
        Ok(history)
    }
}

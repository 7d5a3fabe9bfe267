//! In-memory webhook event store.

use std::collections::HashSet;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::foundation::DomainError;
use crate::ports::{Admission, WebhookDeliveryRecord, WebhookEventRepository};

/// Dedup admission set plus the delivery journal.
pub struct MemoryWebhookEventRepository {
    admitted: RwLock<HashSet<String>>,
    deliveries: RwLock<Vec<WebhookDeliveryRecord>>,
}

impl MemoryWebhookEventRepository {
    pub fn new() -> Self {
        Self {
            admitted: RwLock::new(HashSet::new()),
            deliveries: RwLock::new(Vec::new()),
        }
    }

    /// Every journaled delivery, for assertions in tests.
    pub async fn all_deliveries(&self) -> Vec<WebhookDeliveryRecord> {
        self.deliveries.read().await.clone()
    }
}

impl Default for MemoryWebhookEventRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WebhookEventRepository for MemoryWebhookEventRepository {
    async fn admit(&self, event_id: &str) -> Result<Admission, DomainError> {
        // Single write-locked insert: the serialization point for duplicate
        // deliveries of the same event.
        let mut admitted = self.admitted.write().await;
        if admitted.insert(event_id.to_string()) {
            Ok(Admission::FirstSeen)
        } else {
            Ok(Admission::AlreadySeen)
        }
    }

    async fn release(&self, event_id: &str) -> Result<(), DomainError> {
        self.admitted.write().await.remove(event_id);
        Ok(())
    }

    async fn record_delivery(&self, record: WebhookDeliveryRecord) -> Result<(), DomainError> {
        self.deliveries.write().await.push(record);
        Ok(())
    }

    async fn deliveries_for(
        &self,
        event_id: &str,
    ) -> Result<Vec<WebhookDeliveryRecord>, DomainError> {
        Ok(self
            .deliveries
            .read()
            .await
            .iter()
            .filter(|r| r.event_id.as_deref() == Some(event_id))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::Timestamp;
    use crate::ports::DeliveryOutcome;
    use std::sync::Arc;

    #[tokio::test]
    async fn first_admit_wins_second_loses() {
        let repo = MemoryWebhookEventRepository::new();

        assert_eq!(repo.admit("evt_1").await.unwrap(), Admission::FirstSeen);
        assert_eq!(repo.admit("evt_1").await.unwrap(), Admission::AlreadySeen);
        assert_eq!(repo.admit("evt_2").await.unwrap(), Admission::FirstSeen);
    }

    #[tokio::test]
    async fn release_reopens_admission() {
        let repo = MemoryWebhookEventRepository::new();

        repo.admit("evt_1").await.unwrap();
        repo.release("evt_1").await.unwrap();
        assert_eq!(repo.admit("evt_1").await.unwrap(), Admission::FirstSeen);
    }

    #[tokio::test]
    async fn concurrent_admissions_yield_exactly_one_first_seen() {
        let repo = Arc::new(MemoryWebhookEventRepository::new());

        let mut tasks = Vec::new();
        for _ in 0..16 {
            let repo = repo.clone();
            tasks.push(tokio::spawn(async move { repo.admit("evt_race").await }));
        }

        let mut first_seen = 0;
        for task in tasks {
            if task.await.unwrap().unwrap() == Admission::FirstSeen {
                first_seen += 1;
            }
        }
        assert_eq!(first_seen, 1);
    }

    #[tokio::test]
    async fn journal_keeps_every_delivery_for_an_event() {
        let repo = MemoryWebhookEventRepository::new();
        let now = Timestamp::now();

        repo.record_delivery(WebhookDeliveryRecord::applied("evt_1", "payment.succeeded", now))
            .await
            .unwrap();
        repo.record_delivery(WebhookDeliveryRecord::duplicate("evt_1", "payment.succeeded", now))
            .await
            .unwrap();
        repo.record_delivery(WebhookDeliveryRecord::applied("evt_2", "refund.issued", now))
            .await
            .unwrap();

        let records = repo.deliveries_for("evt_1").await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].outcome, DeliveryOutcome::Applied);
        assert_eq!(records[1].outcome, DeliveryOutcome::Duplicate);
    }
}

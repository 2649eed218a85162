//! In-memory webhook idempotency store.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::domain::foundation::{DomainError, ErrorCode, Timestamp};
use crate::ports::{ClaimResult, WebhookEventRecord, WebhookEventRepository, WebhookEventStatus};

/// Claim records keyed by idempotency key.
#[derive(Debug, Clone, Default)]
pub struct InMemoryWebhookEventRepository {
    records: Arc<Mutex<HashMap<String, WebhookEventRecord>>>,
}

impl InMemoryWebhookEventRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.lock().await.len()
    }
}

fn missing(event_id: &str) -> DomainError {
    DomainError::new(
        ErrorCode::NotFound,
        format!("Webhook event not claimed: {}", event_id),
    )
}

#[async_trait]
impl WebhookEventRepository for InMemoryWebhookEventRepository {
    async fn try_claim(
        &self,
        event_id: &str,
        event_type: &str,
        stale_before: Timestamp,
    ) -> Result<ClaimResult, DomainError> {
        let mut records = self.records.lock().await;

        let outcome = records
            .get(event_id)
            .map(|existing| existing.claim_outcome(stale_before))
            .unwrap_or(ClaimResult::Claimed);

        if outcome == ClaimResult::Claimed {
            records.insert(
                event_id.to_string(),
                WebhookEventRecord::claim(event_id, event_type),
            );
        }
        Ok(outcome)
    }

    async fn complete(
        &self,
        event_id: &str,
        status: WebhookEventStatus,
        message: Option<&str>,
    ) -> Result<(), DomainError> {
        let mut records = self.records.lock().await;
        let record = records.get_mut(event_id).ok_or_else(|| missing(event_id))?;
        record.status = status;
        record.completed_at = Some(Timestamp::now());
        record.message = message.map(str::to_string);
        Ok(())
    }

    async fn release(&self, event_id: &str, error: &str) -> Result<(), DomainError> {
        let mut records = self.records.lock().await;
        let record = records.get_mut(event_id).ok_or_else(|| missing(event_id))?;
        record.status = WebhookEventStatus::Failed;
        record.completed_at = Some(Timestamp::now());
        record.message = Some(error.to_string());
        Ok(())
    }

    async fn find_by_event_id(
        &self,
        event_id: &str,
    ) -> Result<Option<WebhookEventRecord>, DomainError> {
        Ok(self.records.lock().await.get(event_id).cloned())
    }

    async fn delete_before(&self, before: Timestamp) -> Result<u64, DomainError> {
        let mut records = self.records.lock().await;
        let count = records.len();
        records.retain(|_, r| !(r.status.is_final() && r.claimed_at.is_before(&before)));
        Ok((count - records.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn cutoff() -> Timestamp {
        Timestamp::now().minus(Duration::minutes(5))
    }

    #[tokio::test]
    async fn first_claim_wins_and_second_is_in_flight() {
        let repo = InMemoryWebhookEventRepository::new();

        let first = repo.try_claim("evt_1", "subscription.charged", cutoff()).await.unwrap();
        let second = repo.try_claim("evt_1", "subscription.charged", cutoff()).await.unwrap();

        assert_eq!(first, ClaimResult::Claimed);
        assert_eq!(second, ClaimResult::InFlight);
    }

    #[tokio::test]
    async fn completed_event_reports_already_processed() {
        let repo = InMemoryWebhookEventRepository::new();
        repo.try_claim("evt_1", "payment.authorized", cutoff()).await.unwrap();
        repo.complete("evt_1", WebhookEventStatus::Succeeded, None).await.unwrap();

        let again = repo.try_claim("evt_1", "payment.authorized", cutoff()).await.unwrap();
        assert_eq!(again, ClaimResult::AlreadyProcessed);
    }

    #[tokio::test]
    async fn released_event_can_be_claimed_again() {
        let repo = InMemoryWebhookEventRepository::new();
        repo.try_claim("evt_1", "subscription.charged", cutoff()).await.unwrap();
        repo.release("evt_1", "database down").await.unwrap();

        let record = repo.find_by_event_id("evt_1").await.unwrap().unwrap();
        assert_eq!(record.status, WebhookEventStatus::Failed);
        assert_eq!(record.message.as_deref(), Some("database down"));

        let again = repo.try_claim("evt_1", "subscription.charged", cutoff()).await.unwrap();
        assert_eq!(again, ClaimResult::Claimed);
    }

    #[tokio::test]
    async fn stale_claim_is_taken_over() {
        let repo = InMemoryWebhookEventRepository::new();
        repo.try_claim("evt_1", "subscription.charged", cutoff()).await.unwrap();

        // Anything claimed before "the future" counts as abandoned.
        let future = Timestamp::now().add_months(1);
        let again = repo.try_claim("evt_1", "subscription.charged", future).await.unwrap();
        assert_eq!(again, ClaimResult::Claimed);
    }

    #[tokio::test]
    async fn complete_without_claim_fails() {
        let repo = InMemoryWebhookEventRepository::new();
        let err = repo
            .complete("evt_404", WebhookEventStatus::Succeeded, None)
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn delete_before_purges_only_finished_records() {
        let repo = InMemoryWebhookEventRepository::new();
        repo.try_claim("done", "payment.authorized", cutoff()).await.unwrap();
        repo.complete("done", WebhookEventStatus::Succeeded, None).await.unwrap();
        repo.try_claim("busy", "payment.authorized", cutoff()).await.unwrap();

        let purged = repo.delete_before(Timestamp::now().add_months(1)).await.unwrap();

        assert_eq!(purged, 1);
        assert!(repo.find_by_event_id("busy").await.unwrap().is_some());
    }
}

//! In-memory implementation of SubscriptionRepository.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::billing::Subscription;
use crate::domain::foundation::{DomainError, ErrorCode, SubscriptionId, Timestamp, UserId};
use crate::ports::SubscriptionRepository;

/// Subscription storage backed by a shared vector.
///
/// The superseding insert deactivates and inserts under one write lock.
#[derive(Debug, Clone, Default)]
pub struct InMemorySubscriptionRepository {
    records: Arc<RwLock<Vec<Subscription>>>,
}

impl InMemorySubscriptionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// All records for every owner, in insertion order.
    pub async fn all(&self) -> Vec<Subscription> {
        self.records.read().await.clone()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl SubscriptionRepository for InMemorySubscriptionRepository {
    async fn insert_superseding(&self, subscription: &Subscription) -> Result<u64, DomainError> {
        let mut records = self.records.write().await;
        if records.iter().any(|r| r.id == subscription.id) {
            return Err(DomainError::conflict(format!(
                "Subscription already exists: {}",
                subscription.id
            )));
        }

        let now = Timestamp::now();
        let mut superseded = 0;
        for record in records
            .iter_mut()
            .filter(|r| r.owner_id == subscription.owner_id && r.is_active)
        {
            record.is_active = false;
            record.updated_at = now;
            superseded += 1;
        }

        records.push(subscription.clone());
        Ok(superseded)
    }

    async fn find_by_id(&self, id: &SubscriptionId) -> Result<Option<Subscription>, DomainError> {
        Ok(self.records.read().await.iter().find(|r| &r.id == id).cloned())
    }

    async fn find_active_by_owner(
        &self,
        owner_id: &UserId,
    ) -> Result<Option<Subscription>, DomainError> {
        Ok(self
            .records
            .read()
            .await
            .iter()
            .find(|r| &r.owner_id == owner_id && r.is_active)
            .cloned())
    }

    async fn find_by_owner(&self, owner_id: &UserId) -> Result<Vec<Subscription>, DomainError> {
        let records = self.records.read().await;
        let mut owned: Vec<Subscription> = records
            .iter()
            .filter(|r| &r.owner_id == owner_id)
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(owned)
    }

    async fn find_by_gateway_order_id(
        &self,
        order_id: &str,
    ) -> Result<Option<Subscription>, DomainError> {
        Ok(self
            .records
            .read()
            .await
            .iter()
            .find(|r| r.gateway_order_id.as_deref() == Some(order_id))
            .cloned())
    }

    async fn find_latest_by_gateway_subscription_id(
        &self,
        gateway_subscription_id: &str,
    ) -> Result<Option<Subscription>, DomainError> {
        Ok(self
            .records
            .read()
            .await
            .iter()
            .filter(|r| r.gateway_subscription_id.as_deref() == Some(gateway_subscription_id))
            .max_by_key(|r| r.created_at)
            .cloned())
    }

    async fn update_gateway_linkage(&self, subscription: &Subscription) -> Result<(), DomainError> {
        let mut records = self.records.write().await;
        let stored = records
            .iter_mut()
            .find(|r| r.id == subscription.id)
            .ok_or_else(|| {
                DomainError::new(
                    ErrorCode::NotFound,
                    format!("Subscription not found: {}", subscription.id),
                )
            })?;

        stored.gateway_order_id = subscription.gateway_order_id.clone();
        stored.gateway_payment_id = subscription.gateway_payment_id.clone();
        stored.gateway_subscription_id = subscription.gateway_subscription_id.clone();
        stored.updated_at = Timestamp::now();
        Ok(())
    }

    async fn deactivate(&self, id: &SubscriptionId) -> Result<bool, DomainError> {
        let mut records = self.records.write().await;
        match records.iter_mut().find(|r| &r.id == id && r.is_active) {
            Some(record) => {
                record.is_active = false;
                record.updated_at = Timestamp::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

//! Subscription queries, enriched for display.

use std::sync::Arc;

use crate::domain::billing::{SubscriptionDetails, SubscriptionError};
use crate::domain::foundation::{OwnedByUser, SubscriptionId, UserId};
use crate::ports::{CardRepository, PlanCatalog, SubscriptionRepository};

use super::enrich;

#[derive(Debug, Clone)]
pub struct GetActiveSubscriptionQuery {
    pub owner_id: UserId,
}

/// Returns the owner's active subscription, if any.
pub struct GetActiveSubscriptionHandler {
    subscriptions: Arc<dyn SubscriptionRepository>,
    cards: Arc<dyn CardRepository>,
    catalog: Arc<dyn PlanCatalog>,
}

impl GetActiveSubscriptionHandler {
    pub fn new(
        subscriptions: Arc<dyn SubscriptionRepository>,
        cards: Arc<dyn CardRepository>,
        catalog: Arc<dyn PlanCatalog>,
    ) -> Self {
        Self {
            subscriptions,
            cards,
            catalog,
        }
    }

    pub async fn handle(
        &self,
        query: GetActiveSubscriptionQuery,
    ) -> Result<Option<SubscriptionDetails>, SubscriptionError> {
        match self.subscriptions.find_active_by_owner(&query.owner_id).await? {
            Some(subscription) => Ok(Some(enrich(subscription, &self.catalog, &self.cards).await?)),
            None => Ok(None),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GetSubscriptionHistoryQuery {
    pub owner_id: UserId,
}

/// Every record the owner has had, newest first.
pub struct GetSubscriptionHistoryHandler {
    subscriptions: Arc<dyn SubscriptionRepository>,
    cards: Arc<dyn CardRepository>,
    catalog: Arc<dyn PlanCatalog>,
}

impl GetSubscriptionHistoryHandler {
    pub fn new(
        subscriptions: Arc<dyn SubscriptionRepository>,
        cards: Arc<dyn CardRepository>,
        catalog: Arc<dyn PlanCatalog>,
    ) -> Self {
        Self {
            subscriptions,
            cards,
            catalog,
        }
    }

    pub async fn handle(
        &self,
        query: GetSubscriptionHistoryQuery,
    ) -> Result<Vec<SubscriptionDetails>, SubscriptionError> {
        let mut records = self.subscriptions.find_by_owner(&query.owner_id).await?;
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let mut history = Vec::with_capacity(records.len());
        for record in records {
            history.push(enrich(record, &self.catalog, &self.cards).await?);
        }
        Ok(history)
    }
}

#[derive(Debug, Clone)]
pub struct GetSubscriptionQuery {
    pub subscription_id: SubscriptionId,
    pub owner_id: UserId,
}

pub struct GetSubscriptionHandler {
    subscriptions: Arc<dyn SubscriptionRepository>,
    cards: Arc<dyn CardRepository>,
    catalog: Arc<dyn PlanCatalog>,
}

impl GetSubscriptionHandler {
    pub fn new(
        subscriptions: Arc<dyn SubscriptionRepository>,
        cards: Arc<dyn CardRepository>,
        catalog: Arc<dyn PlanCatalog>,
    ) -> Self {
        Self {
            subscriptions,
            cards,
            catalog,
        }
    }

    pub async fn handle(
        &self,
        query: GetSubscriptionQuery,
    ) -> Result<SubscriptionDetails, SubscriptionError> {
        let subscription = self
            .subscriptions
            .find_by_id(&query.subscription_id)
            .await?
            .ok_or(SubscriptionError::NotFound(query.subscription_id))?;

        if !subscription.is_owner(&query.owner_id) {
            return Err(SubscriptionError::Unauthorized(query.subscription_id));
        }

        enrich(subscription, &self.catalog, &self.cards).await
    }
}

//! RenewSubscriptionHandler - Owner-requested renewal.
//!
//! Renewal is a local continuation: the gateway is not contacted. The new
//! record always runs for one month, whatever the original cadence was, and
//! keeps any gateway subscription link so a later stop still cancels it.

use std::sync::Arc;

use crate::domain::billing::{SubscriptionDetails, SubscriptionError};
use crate::domain::foundation::{OwnedByUser, SubscriptionId, Timestamp, UserId};
use crate::ports::{CardRepository, PlanCatalog, SubscriptionRepository};

use super::enrich_persisted;

#[derive(Debug, Clone)]
pub struct RenewSubscriptionCommand {
    pub subscription_id: SubscriptionId,
    pub owner_id: UserId,
}

#[derive(Debug, Clone)]
pub struct RenewSubscriptionResult {
    /// The new active record.
    pub subscription: SubscriptionDetails,
    pub renewed_from: SubscriptionId,
}

pub struct RenewSubscriptionHandler {
    subscriptions: Arc<dyn SubscriptionRepository>,
    cards: Arc<dyn CardRepository>,
    catalog: Arc<dyn PlanCatalog>,
}

impl RenewSubscriptionHandler {
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
        cmd: RenewSubscriptionCommand,
    ) -> Result<RenewSubscriptionResult, SubscriptionError> {
        // 1. Find and authorize
        let current = self
            .subscriptions
            .find_by_id(&cmd.subscription_id)
            .await?
            .ok_or(SubscriptionError::NotFound(cmd.subscription_id))?;

        if !current.is_owner(&cmd.owner_id) {
            return Err(SubscriptionError::Unauthorized(cmd.subscription_id));
        }

        // 2. Build the continuation and supersede
        let renewed = current.manual_renewal(Timestamp::now());
        self.subscriptions.insert_superseding(&renewed).await?;

        tracing::info!(
            owner_id = %cmd.owner_id,
            subscription_id = %renewed.id,
            renewed_from = %current.id,
            "subscription renewed"
        );

        let details = enrich_persisted(renewed, &self.catalog, &self.cards).await;
        Ok(RenewSubscriptionResult {
            subscription: details,
            renewed_from: current.id,
        })
    }
}

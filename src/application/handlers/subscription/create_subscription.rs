//! CreateSubscriptionHandler - Starts a subscription for an owner.
//!
//! Local checks (payment type, card, plan, gateway plan mapping) all run
//! before the first gateway call. A failed gateway call aborts without
//! writing anything; the local record is only persisted once the gateway
//! side exists.

use std::sync::Arc;

use crate::domain::billing::{
    NewSubscription, PaymentType, Subscription, SubscriptionDetails, SubscriptionError,
};
use crate::domain::foundation::{CardId, OwnedByUser, PlanId, Timestamp};
use crate::ports::{
    CardRepository, CreateGatewaySubscriptionRequest, CreateOrderRequest, GatewayErrorKind,
    OwnerProfile, PaymentGateway, PlanCatalog, SubscriptionRepository,
};

use super::{call_gateway, enrich_persisted, GatewayCallSettings};

/// Command to create a subscription.
#[derive(Debug, Clone)]
pub struct CreateSubscriptionCommand {
    /// Owner and contact details for the gateway customer.
    pub owner: OwnerProfile,
    pub plan_id: PlanId,
    pub card_id: CardId,
    /// `monthly` or `yearly`.
    pub payment_type: String,
    pub auto_renewal: bool,
    /// Let the gateway email the customer about recurring charges.
    pub notify_customer: bool,
}

#[derive(Debug, Clone)]
pub struct CreateSubscriptionResult {
    pub subscription: SubscriptionDetails,
    /// Number of previously active records this one replaced.
    pub superseded: u64,
    /// Gateway customer used for a recurring subscription, for the host to
    /// link to the owner. `None` for one-time orders.
    pub gateway_customer_id: Option<String>,
}

pub struct CreateSubscriptionHandler {
    subscriptions: Arc<dyn SubscriptionRepository>,
    cards: Arc<dyn CardRepository>,
    catalog: Arc<dyn PlanCatalog>,
    gateway: Arc<dyn PaymentGateway>,
    settings: GatewayCallSettings,
}

impl CreateSubscriptionHandler {
    pub fn new(
        subscriptions: Arc<dyn SubscriptionRepository>,
        cards: Arc<dyn CardRepository>,
        catalog: Arc<dyn PlanCatalog>,
        gateway: Arc<dyn PaymentGateway>,
        settings: GatewayCallSettings,
    ) -> Self {
        Self {
            subscriptions,
            cards,
            catalog,
            gateway,
            settings,
        }
    }

    pub async fn handle(
        &self,
        cmd: CreateSubscriptionCommand,
    ) -> Result<CreateSubscriptionResult, SubscriptionError> {
        let owner_id = cmd.owner.owner_id.clone();

        // 1. Payment type
        let payment_type: PaymentType = cmd
            .payment_type
            .parse()
            .map_err(|_| SubscriptionError::InvalidPaymentType(cmd.payment_type.clone()))?;

        // 2. Card must exist and belong to the owner
        let card = self
            .cards
            .find_by_id(&cmd.card_id)
            .await?
            .filter(|card| card.is_owner(&owner_id))
            .ok_or(SubscriptionError::InvalidCard(cmd.card_id))?;

        // 3. Plan must exist
        let plan = self
            .catalog
            .find_plan(&cmd.plan_id)
            .await?
            .ok_or_else(|| SubscriptionError::InvalidPlan(cmd.plan_id.clone()))?;

        // 4. Price and first period
        let subscription = Subscription::start(
            NewSubscription {
                owner_id: owner_id.clone(),
                product_id: plan.product_id.clone(),
                plan_id: plan.id.clone(),
                card_id: card.id,
                payment_type,
                amount: plan.price_for(payment_type),
                auto_renewal: cmd.auto_renewal,
            },
            Timestamp::now(),
        );

        // 5. Gateway side
        let (subscription, gateway_customer_id) = if cmd.auto_renewal {
            let (subscription, customer_id) = self
                .start_recurring(subscription, &cmd.owner, cmd.notify_customer)
                .await?;
            (subscription, Some(customer_id))
        } else {
            (self.place_order(subscription).await?, None)
        };

        // 6. Persist, replacing any active record
        let superseded = self.subscriptions.insert_superseding(&subscription).await?;

        tracing::info!(
            owner_id = %owner_id,
            subscription_id = %subscription.id,
            plan_id = %subscription.plan_id,
            payment_type = %payment_type,
            auto_renewal = subscription.auto_renewal,
            superseded,
            "subscription created"
        );

        let details = enrich_persisted(subscription, &self.catalog, &self.cards).await;
        Ok(CreateSubscriptionResult {
            subscription: details,
            superseded,
            gateway_customer_id,
        })
    }

    async fn start_recurring(
        &self,
        subscription: Subscription,
        owner: &OwnerProfile,
        notify_customer: bool,
    ) -> Result<(Subscription, String), SubscriptionError> {
        let gateway_plan_id = self
            .gateway
            .resolve_plan(&subscription.plan_id, subscription.payment_type)
            .map_err(|e| match e.kind {
                GatewayErrorKind::UnknownPlan => SubscriptionError::UnknownPlan {
                    plan_id: subscription.plan_id.clone(),
                    payment_type: subscription.payment_type,
                },
                _ => SubscriptionError::from(e),
            })?;

        let customer = call_gateway(
            self.settings.timeout,
            "get_or_create_customer",
            self.gateway.get_or_create_customer(owner),
        )
        .await?;

        let gateway_subscription = call_gateway(
            self.settings.timeout,
            "create_subscription",
            self.gateway
                .create_subscription(CreateGatewaySubscriptionRequest {
                    gateway_plan_id,
                    customer_id: customer.id.clone(),
                    total_count: subscription.payment_type.gateway_billing_cycles(),
                    notify_customer,
                }),
        )
        .await?;

        Ok((
            subscription.with_gateway_subscription(gateway_subscription.id),
            customer.id,
        ))
    }

    async fn place_order(&self, subscription: Subscription) -> Result<Subscription, SubscriptionError> {
        let order = call_gateway(
            self.settings.timeout,
            "create_order",
            self.gateway.create_order(CreateOrderRequest {
                amount: subscription.amount,
                currency: self.settings.currency.clone(),
                receipt: subscription.id.to_string(),
            }),
        )
        .await?;

        Ok(subscription.with_gateway_order(order.id))
    }
}

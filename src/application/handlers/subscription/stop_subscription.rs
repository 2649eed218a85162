//! StopSubscriptionHandler - Owner-requested termination.
//!
//! When the record is linked to a gateway-side recurring subscription, that
//! is cancelled first. Only after the gateway confirms is the local record
//! deactivated, so billing never continues behind an inactive record.

use std::sync::Arc;

use crate::domain::billing::SubscriptionError;
use crate::domain::foundation::{OwnedByUser, SubscriptionId, UserId};
use crate::ports::{PaymentGateway, SubscriptionRepository};

use super::{call_gateway, GatewayCallSettings};

#[derive(Debug, Clone)]
pub struct StopSubscriptionCommand {
    pub subscription_id: SubscriptionId,
    pub owner_id: UserId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopSubscriptionResult {
    pub subscription_id: SubscriptionId,
    /// True if a gateway-side subscription was cancelled.
    pub gateway_cancelled: bool,
}

pub struct StopSubscriptionHandler {
    subscriptions: Arc<dyn SubscriptionRepository>,
    gateway: Arc<dyn PaymentGateway>,
    settings: GatewayCallSettings,
}

impl StopSubscriptionHandler {
    pub fn new(
        subscriptions: Arc<dyn SubscriptionRepository>,
        gateway: Arc<dyn PaymentGateway>,
        settings: GatewayCallSettings,
    ) -> Self {
        Self {
            subscriptions,
            gateway,
            settings,
        }
    }

    pub async fn handle(
        &self,
        cmd: StopSubscriptionCommand,
    ) -> Result<StopSubscriptionResult, SubscriptionError> {
        // 1. Find, authorize, require active
        let subscription = self
            .subscriptions
            .find_by_id(&cmd.subscription_id)
            .await?
            .ok_or(SubscriptionError::NotFound(cmd.subscription_id))?;

        if !subscription.is_owner(&cmd.owner_id) {
            return Err(SubscriptionError::Unauthorized(cmd.subscription_id));
        }
        if !subscription.is_active {
            return Err(SubscriptionError::NotActive(cmd.subscription_id));
        }

        // 2. Gateway first
        let gateway_cancelled = match subscription.gateway_subscription_id.as_deref() {
            Some(gateway_id) => {
                call_gateway(
                    self.settings.timeout,
                    "cancel_subscription",
                    self.gateway.cancel_subscription(gateway_id),
                )
                .await?;
                true
            }
            None => false,
        };

        // 3. Conditional deactivation; a concurrent writer may have won
        if !self.subscriptions.deactivate(&subscription.id).await? {
            tracing::info!(
                subscription_id = %subscription.id,
                "subscription was already inactive when stop landed"
            );
        }

        tracing::info!(
            owner_id = %cmd.owner_id,
            subscription_id = %subscription.id,
            gateway_cancelled,
            "subscription stopped"
        );

        Ok(StopSubscriptionResult {
            subscription_id: subscription.id,
            gateway_cancelled,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::domain::billing::{NewSubscription, PaymentType, Subscription};
    use crate::domain::foundation::{CardId, PlanId, ProductId, Timestamp};
    use crate::ports::GatewayError;

    fn handler(fx: &Fixture) -> StopSubscriptionHandler {
        StopSubscriptionHandler::new(
            fx.subscriptions.clone(),
            Arc::new(fx.gateway.clone()),
            GatewayCallSettings::default(),
        )
    }

    async fn stored(fx: &Fixture, owner_id: &str, gateway_id: Option<&str>) -> Subscription {
        let mut sub = Subscription::start(
            NewSubscription {
                owner_id: owner(owner_id),
                product_id: ProductId::new("prod-1").unwrap(),
                plan_id: PlanId::new("plan-001").unwrap(),
                card_id: CardId::new(),
                payment_type: PaymentType::Monthly,
                amount: 49_900,
                auto_renewal: gateway_id.is_some(),
            },
            Timestamp::now(),
        );
        if let Some(id) = gateway_id {
            sub = sub.with_gateway_subscription(id);
        }
        fx.subscriptions.insert_superseding(&sub).await.unwrap();
        sub
    }

    fn command(sub: &Subscription, owner_id: &str) -> StopSubscriptionCommand {
        StopSubscriptionCommand {
            subscription_id: sub.id,
            owner_id: owner(owner_id),
        }
    }

    #[tokio::test]
    async fn stops_recurring_subscription_after_gateway_cancel() {
        let fx = Fixture::new();
        let sub = stored(&fx, "user-1", Some("sub_abc")).await;

        let result = handler(&fx).handle(command(&sub, "user-1")).await.unwrap();

        assert!(result.gateway_cancelled);
        assert_eq!(fx.gateway.cancelled(), vec!["sub_abc".to_string()]);
        let stored = fx.subscriptions.find_by_id(&sub.id).await.unwrap().unwrap();
        assert!(!stored.is_active);
    }

    #[tokio::test]
    async fn stops_one_time_subscription_without_gateway() {
        let fx = Fixture::new();
        let sub = stored(&fx, "user-1", None).await;

        let result = handler(&fx).handle(command(&sub, "user-1")).await.unwrap();

        assert!(!result.gateway_cancelled);
        assert_eq!(fx.gateway.total_calls(), 0);
        assert!(fx
            .subscriptions
            .find_active_by_owner(&owner("user-1"))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn gateway_failure_leaves_record_active() {
        let fx = Fixture::new();
        let sub = stored(&fx, "user-1", Some("sub_abc")).await;
        fx.gateway
            .set_method_error("cancel_subscription", GatewayError::unavailable("HTTP 502"));

        let err = handler(&fx).handle(command(&sub, "user-1")).await.unwrap_err();

        assert!(matches!(err, SubscriptionError::GatewayUnavailable(_)));
        let stored = fx.subscriptions.find_by_id(&sub.id).await.unwrap().unwrap();
        assert!(stored.is_active);
    }

    #[tokio::test]
    async fn stopping_inactive_subscription_is_not_active() {
        let fx = Fixture::new();
        let sub = stored(&fx, "user-1", Some("sub_abc")).await;
        fx.subscriptions.deactivate(&sub.id).await.unwrap();

        let err = handler(&fx).handle(command(&sub, "user-1")).await.unwrap_err();

        assert_eq!(err, SubscriptionError::NotActive(sub.id));
        assert!(!fx.gateway.was_called("cancel_subscription"));
    }

    #[tokio::test]
    async fn other_owner_is_unauthorized() {
        let fx = Fixture::new();
        let sub = stored(&fx, "user-1", Some("sub_abc")).await;

        let err = handler(&fx).handle(command(&sub, "user-2")).await.unwrap_err();

        assert_eq!(err, SubscriptionError::Unauthorized(sub.id));
        assert_eq!(fx.gateway.total_calls(), 0);
    }

    #[tokio::test]
    async fn missing_subscription_is_not_found() {
        let fx = Fixture::new();
        let missing = SubscriptionId::new();

        let err = handler(&fx)
            .handle(StopSubscriptionCommand {
                subscription_id: missing,
                owner_id: owner("user-1"),
            })
            .await
            .unwrap_err();

        assert_eq!(err, SubscriptionError::NotFound(missing));
    }
}

//! Per-event reconciliation handlers.
//!
//! Each handler applies one gateway event to local subscription records.
//! All of them are safe under redelivery on their own, in addition to the
//! delivery-level idempotency of the processor.

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::billing::{GatewayEvent, GatewayEventType, WebhookError, WebhookEventHandler};
use crate::domain::foundation::Timestamp;
use crate::ports::SubscriptionRepository;

fn unexpected(event: &GatewayEvent) -> WebhookError {
    WebhookError::Ignored(format!("unexpected event '{}'", event.name()))
}

// ════════════════════════════════════════════════════════════════════════════
// payment.authorized
// ════════════════════════════════════════════════════════════════════════════

/// Links the authorized payment to the subscription that placed the order.
pub struct PaymentAuthorizedHandler {
    subscriptions: Arc<dyn SubscriptionRepository>,
}

impl PaymentAuthorizedHandler {
    pub fn new(subscriptions: Arc<dyn SubscriptionRepository>) -> Self {
        Self { subscriptions }
    }
}

#[async_trait]
impl WebhookEventHandler for PaymentAuthorizedHandler {
    fn handles(&self) -> Vec<GatewayEventType> {
        vec![GatewayEventType::PaymentAuthorized]
    }

    async fn handle(&self, event: &GatewayEvent) -> Result<(), WebhookError> {
        let GatewayEvent::PaymentAuthorized { payment_id, order_id } = event else {
            return Err(unexpected(event));
        };

        let mut subscription = self
            .subscriptions
            .find_by_gateway_order_id(order_id)
            .await?
            .ok_or_else(|| WebhookError::SubscriptionNotFound(order_id.clone()))?;

        if !subscription.attach_payment(payment_id.clone()) {
            tracing::debug!(
                subscription_id = %subscription.id,
                payment_id = %payment_id,
                "payment already linked"
            );
            return Ok(());
        }

        self.subscriptions.update_gateway_linkage(&subscription).await?;

        tracing::info!(
            subscription_id = %subscription.id,
            order_id = %order_id,
            payment_id = %payment_id,
            "payment linked to subscription"
        );
        Ok(())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// subscription.charged
// ════════════════════════════════════════════════════════════════════════════

/// Creates the next period after the gateway charges a recurring subscription.
pub struct SubscriptionChargedHandler {
    subscriptions: Arc<dyn SubscriptionRepository>,
}

impl SubscriptionChargedHandler {
    pub fn new(subscriptions: Arc<dyn SubscriptionRepository>) -> Self {
        Self { subscriptions }
    }
}

#[async_trait]
impl WebhookEventHandler for SubscriptionChargedHandler {
    fn handles(&self) -> Vec<GatewayEventType> {
        vec![GatewayEventType::SubscriptionCharged]
    }

    async fn handle(&self, event: &GatewayEvent) -> Result<(), WebhookError> {
        let GatewayEvent::SubscriptionCharged {
            subscription_id,
            payment_id,
        } = event
        else {
            return Err(unexpected(event));
        };

        let current = self
            .subscriptions
            .find_latest_by_gateway_subscription_id(subscription_id)
            .await?
            .ok_or_else(|| WebhookError::SubscriptionNotFound(subscription_id.clone()))?;

        // The latest record already carries this charge.
        if payment_id.is_some() && current.gateway_payment_id == *payment_id {
            tracing::debug!(
                subscription_id = %current.id,
                gateway_subscription_id = %subscription_id,
                "charge already applied"
            );
            return Ok(());
        }

        let mut renewed = current.gateway_renewal(Timestamp::now());
        if let Some(payment_id) = payment_id {
            renewed.attach_payment(payment_id.clone());
        }

        self.subscriptions.insert_superseding(&renewed).await?;

        tracing::info!(
            owner_id = %renewed.owner_id,
            subscription_id = %renewed.id,
            renewed_from = %current.id,
            gateway_subscription_id = %subscription_id,
            "subscription renewed by gateway charge"
        );
        Ok(())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// subscription.cancelled
// ════════════════════════════════════════════════════════════════════════════

/// Deactivates the local record when the gateway cancels.
pub struct SubscriptionCancelledHandler {
    subscriptions: Arc<dyn SubscriptionRepository>,
}

impl SubscriptionCancelledHandler {
    pub fn new(subscriptions: Arc<dyn SubscriptionRepository>) -> Self {
        Self { subscriptions }
    }
}

#[async_trait]
impl WebhookEventHandler for SubscriptionCancelledHandler {
    fn handles(&self) -> Vec<GatewayEventType> {
        vec![GatewayEventType::SubscriptionCancelled]
    }

    async fn handle(&self, event: &GatewayEvent) -> Result<(), WebhookError> {
        let GatewayEvent::SubscriptionCancelled { subscription_id } = event else {
            return Err(unexpected(event));
        };

        let current = self
            .subscriptions
            .find_latest_by_gateway_subscription_id(subscription_id)
            .await?
            .ok_or_else(|| WebhookError::SubscriptionNotFound(subscription_id.clone()))?;

        if self.subscriptions.deactivate(&current.id).await? {
            tracing::info!(
                owner_id = %current.owner_id,
                subscription_id = %current.id,
                gateway_subscription_id = %subscription_id,
                "subscription cancelled by gateway"
            );
        } else {
            tracing::debug!(subscription_id = %current.id, "subscription already inactive");
        }
        Ok(())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// payment.failed
// ════════════════════════════════════════════════════════════════════════════

/// Records a failed payment in the logs. Local state is left alone.
#[derive(Default)]
pub struct PaymentFailedHandler;

#[async_trait]
impl WebhookEventHandler for PaymentFailedHandler {
    fn handles(&self) -> Vec<GatewayEventType> {
        vec![GatewayEventType::PaymentFailed]
    }

    async fn handle(&self, event: &GatewayEvent) -> Result<(), WebhookError> {
        let GatewayEvent::PaymentFailed {
            payment_id,
            order_id,
            subscription_id,
        } = event
        else {
            return Err(unexpected(event));
        };

        tracing::warn!(
            payment_id = payment_id.as_deref().unwrap_or("-"),
            order_id = order_id.as_deref().unwrap_or("-"),
            gateway_subscription_id = subscription_id.as_deref().unwrap_or("-"),
            "gateway reported a failed payment"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemorySubscriptionRepository;
    use crate::domain::billing::{NewSubscription, PaymentType, Subscription};
    use crate::domain::foundation::{CardId, PlanId, ProductId, UserId};

    fn new_subscription(owner: &str, payment_type: PaymentType) -> Subscription {
        Subscription::start(
            NewSubscription {
                owner_id: UserId::new(owner).unwrap(),
                product_id: ProductId::new("prod-1").unwrap(),
                plan_id: PlanId::new("plan-001").unwrap(),
                card_id: CardId::new(),
                payment_type,
                amount: 49_900,
                auto_renewal: true,
            },
            Timestamp::now(),
        )
    }

    async fn seeded(sub: Subscription) -> Arc<InMemorySubscriptionRepository> {
        let repo = Arc::new(InMemorySubscriptionRepository::new());
        repo.insert_superseding(&sub).await.unwrap();
        repo
    }

    // ════════════════════════════════════════════════════════════════════════════
    // payment.authorized
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn authorized_payment_is_attached_by_order() {
        let sub = new_subscription("user-1", PaymentType::Monthly).with_gateway_order("order_1");
        let repo = seeded(sub.clone()).await;
        let handler = PaymentAuthorizedHandler::new(repo.clone());

        handler
            .handle(&GatewayEvent::PaymentAuthorized {
                payment_id: "pay_1".to_string(),
                order_id: "order_1".to_string(),
            })
            .await
            .unwrap();

        let stored = repo.find_by_id(&sub.id).await.unwrap().unwrap();
        assert_eq!(stored.gateway_payment_id.as_deref(), Some("pay_1"));
        assert!(stored.is_active);
        assert_eq!(repo.len().await, 1);
    }

    #[tokio::test]
    async fn authorized_payment_for_unknown_order_is_not_found() {
        let repo = Arc::new(InMemorySubscriptionRepository::new());
        let handler = PaymentAuthorizedHandler::new(repo);

        let err = handler
            .handle(&GatewayEvent::PaymentAuthorized {
                payment_id: "pay_1".to_string(),
                order_id: "order_missing".to_string(),
            })
            .await
            .unwrap_err();

        assert_eq!(err, WebhookError::SubscriptionNotFound("order_missing".to_string()));
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn repeated_authorization_is_a_no_op() {
        let sub = new_subscription("user-1", PaymentType::Monthly).with_gateway_order("order_1");
        let repo = seeded(sub.clone()).await;
        let handler = PaymentAuthorizedHandler::new(repo.clone());
        let event = GatewayEvent::PaymentAuthorized {
            payment_id: "pay_1".to_string(),
            order_id: "order_1".to_string(),
        };

        handler.handle(&event).await.unwrap();
        let first = repo.find_by_id(&sub.id).await.unwrap().unwrap();
        handler.handle(&event).await.unwrap();
        let second = repo.find_by_id(&sub.id).await.unwrap().unwrap();

        assert_eq!(first, second);
    }

    // ════════════════════════════════════════════════════════════════════════════
    // subscription.charged
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn charge_creates_superseding_renewal_with_original_cadence() {
        let sub = new_subscription("user-1", PaymentType::Yearly).with_gateway_subscription("sub_1");
        let repo = seeded(sub.clone()).await;
        let handler = SubscriptionChargedHandler::new(repo.clone());

        handler
            .handle(&GatewayEvent::SubscriptionCharged {
                subscription_id: "sub_1".to_string(),
                payment_id: Some("pay_9".to_string()),
            })
            .await
            .unwrap();

        let old = repo.find_by_id(&sub.id).await.unwrap().unwrap();
        assert!(!old.is_active);

        let renewed = repo
            .find_active_by_owner(&sub.owner_id)
            .await
            .unwrap()
            .unwrap();
        assert_ne!(renewed.id, sub.id);
        assert!(renewed.is_renewal);
        assert_eq!(renewed.payment_type, PaymentType::Yearly);
        assert_eq!(renewed.next_renewal_date, renewed.start_date.add_years(1));
        assert_eq!(renewed.gateway_subscription_id.as_deref(), Some("sub_1"));
        assert_eq!(renewed.gateway_payment_id.as_deref(), Some("pay_9"));
    }

    #[tokio::test]
    async fn charge_for_unknown_subscription_creates_nothing() {
        let repo = Arc::new(InMemorySubscriptionRepository::new());
        let handler = SubscriptionChargedHandler::new(repo.clone());

        let err = handler
            .handle(&GatewayEvent::SubscriptionCharged {
                subscription_id: "sub_unknown".to_string(),
                payment_id: None,
            })
            .await
            .unwrap_err();

        assert_eq!(err, WebhookError::SubscriptionNotFound("sub_unknown".to_string()));
        assert!(repo.is_empty().await);
    }

    #[tokio::test]
    async fn same_charge_twice_renews_once() {
        let sub = new_subscription("user-1", PaymentType::Monthly).with_gateway_subscription("sub_1");
        let repo = seeded(sub).await;
        let handler = SubscriptionChargedHandler::new(repo.clone());
        let event = GatewayEvent::SubscriptionCharged {
            subscription_id: "sub_1".to_string(),
            payment_id: Some("pay_1".to_string()),
        };

        handler.handle(&event).await.unwrap();
        handler.handle(&event).await.unwrap();

        assert_eq!(repo.len().await, 2);
    }

    // ════════════════════════════════════════════════════════════════════════════
    // subscription.cancelled
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn cancellation_deactivates_latest_record() {
        let sub = new_subscription("user-1", PaymentType::Monthly).with_gateway_subscription("sub_1");
        let repo = seeded(sub.clone()).await;
        let handler = SubscriptionCancelledHandler::new(repo.clone());

        handler
            .handle(&GatewayEvent::SubscriptionCancelled {
                subscription_id: "sub_1".to_string(),
            })
            .await
            .unwrap();

        assert!(repo.find_active_by_owner(&sub.owner_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn cancelling_inactive_record_succeeds() {
        let sub = new_subscription("user-1", PaymentType::Monthly).with_gateway_subscription("sub_1");
        let repo = seeded(sub.clone()).await;
        repo.deactivate(&sub.id).await.unwrap();
        let handler = SubscriptionCancelledHandler::new(repo);

        let result = handler
            .handle(&GatewayEvent::SubscriptionCancelled {
                subscription_id: "sub_1".to_string(),
            })
            .await;

        assert!(result.is_ok());
    }

    // ════════════════════════════════════════════════════════════════════════════
    // payment.failed
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn failed_payment_changes_nothing() {
        let sub = new_subscription("user-1", PaymentType::Monthly).with_gateway_order("order_1");
        let repo = seeded(sub.clone()).await;

        PaymentFailedHandler
            .handle(&GatewayEvent::PaymentFailed {
                payment_id: Some("pay_1".to_string()),
                order_id: Some("order_1".to_string()),
                subscription_id: None,
            })
            .await
            .unwrap();

        let stored = repo.find_by_id(&sub.id).await.unwrap().unwrap();
        assert_eq!(stored, sub);
    }

    #[tokio::test]
    async fn handler_rejects_event_of_another_type() {
        let repo = Arc::new(InMemorySubscriptionRepository::new());
        let handler = PaymentAuthorizedHandler::new(repo);

        let err = handler
            .handle(&GatewayEvent::Unrecognized {
                name: "refund.created".to_string(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, WebhookError::Ignored(_)));
    }
}

//! Application layer - Commands, Queries, and Handlers.
//!
//! This layer orchestrates domain operations and coordinates between ports.
//! Following CQRS, it separates command handlers (write) from query handlers (read).
//!
//! [`BillingHandlers`] wires every handler from one set of ports for the
//! composition root.

pub mod handlers;

use std::sync::Arc;

use crate::config::AppConfig;
use crate::ports::{
    CardRepository, PaymentGateway, PlanCatalog, SubscriptionRepository, WebhookEventRepository,
};

pub use handlers::*;

/// Ports shared by every handler.
#[derive(Clone)]
pub struct BillingPorts {
    pub cards: Arc<dyn CardRepository>,
    pub subscriptions: Arc<dyn SubscriptionRepository>,
    pub catalog: Arc<dyn PlanCatalog>,
    pub gateway: Arc<dyn PaymentGateway>,
    pub webhook_events: Arc<dyn WebhookEventRepository>,
}

/// All command and query handlers, built once at startup.
pub struct BillingHandlers {
    // Cards
    pub register_card: RegisterCardHandler,
    pub update_card: UpdateCardHandler,
    pub set_default_card: SetDefaultCardHandler,
    pub delete_card: DeleteCardHandler,
    pub delete_all_cards: DeleteAllCardsHandler,
    pub get_card: GetCardHandler,
    pub list_cards: ListCardsHandler,

    // Subscriptions
    pub create_subscription: CreateSubscriptionHandler,
    pub renew_subscription: RenewSubscriptionHandler,
    pub stop_subscription: StopSubscriptionHandler,
    pub get_active_subscription: GetActiveSubscriptionHandler,
    pub get_subscription_history: GetSubscriptionHistoryHandler,
    pub get_subscription: GetSubscriptionHandler,
    pub list_plans: ListPlansHandler,
    pub list_products: ListProductsHandler,
    pub get_product: GetProductHandler,

    // Webhooks
    pub handle_webhook: HandleGatewayWebhookHandler,
    pub purge_webhook_events: PurgeWebhookEventsHandler,
}

impl BillingHandlers {
    /// Builds every handler from explicit settings.
    pub fn new(
        ports: BillingPorts,
        gateway_settings: GatewayCallSettings,
        webhook_settings: WebhookSettings,
        webhook_retention: chrono::Duration,
    ) -> Self {
        let BillingPorts {
            cards,
            subscriptions,
            catalog,
            gateway,
            webhook_events,
        } = ports;

        Self {
            register_card: RegisterCardHandler::new(cards.clone()),
            update_card: UpdateCardHandler::new(cards.clone()),
            set_default_card: SetDefaultCardHandler::new(cards.clone()),
            delete_card: DeleteCardHandler::new(cards.clone()),
            delete_all_cards: DeleteAllCardsHandler::new(cards.clone()),
            get_card: GetCardHandler::new(cards.clone()),
            list_cards: ListCardsHandler::new(cards.clone()),

            create_subscription: CreateSubscriptionHandler::new(
                subscriptions.clone(),
                cards.clone(),
                catalog.clone(),
                gateway.clone(),
                gateway_settings.clone(),
            ),
            renew_subscription: RenewSubscriptionHandler::new(
                subscriptions.clone(),
                cards.clone(),
                catalog.clone(),
            ),
            stop_subscription: StopSubscriptionHandler::new(
                subscriptions.clone(),
                gateway.clone(),
                gateway_settings,
            ),
            get_active_subscription: GetActiveSubscriptionHandler::new(
                subscriptions.clone(),
                cards.clone(),
                catalog.clone(),
            ),
            get_subscription_history: GetSubscriptionHistoryHandler::new(
                subscriptions.clone(),
                cards.clone(),
                catalog.clone(),
            ),
            get_subscription: GetSubscriptionHandler::new(
                subscriptions.clone(),
                cards,
                catalog.clone(),
            ),
            list_plans: ListPlansHandler::new(catalog.clone()),
            list_products: ListProductsHandler::new(catalog.clone()),
            get_product: GetProductHandler::new(catalog),

            handle_webhook: HandleGatewayWebhookHandler::new(
                gateway,
                subscriptions,
                webhook_events.clone(),
                webhook_settings,
            ),
            purge_webhook_events: PurgeWebhookEventsHandler::new(webhook_events, webhook_retention),
        }
    }

    /// Builds every handler with settings taken from the loaded configuration.
    pub fn from_config(ports: BillingPorts, config: &AppConfig) -> Self {
        Self::new(
            ports,
            GatewayCallSettings::from_config(&config.gateway),
            WebhookSettings::from_config(&config.webhook),
            config.webhook.retention(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{
        InMemoryCardRepository, InMemoryPlanCatalog, InMemorySubscriptionRepository,
        InMemoryWebhookEventRepository,
    };
    use crate::adapters::razorpay::MockPaymentGateway;
    use crate::domain::foundation::UserId;

    fn ports() -> BillingPorts {
        BillingPorts {
            cards: Arc::new(InMemoryCardRepository::new()),
            subscriptions: Arc::new(InMemorySubscriptionRepository::new()),
            catalog: Arc::new(InMemoryPlanCatalog::new()),
            gateway: Arc::new(MockPaymentGateway::new()),
            webhook_events: Arc::new(InMemoryWebhookEventRepository::new()),
        }
    }

    #[tokio::test]
    async fn handlers_share_the_same_ports() {
        let handlers = BillingHandlers::new(
            ports(),
            GatewayCallSettings::default(),
            WebhookSettings::default(),
            chrono::Duration::days(30),
        );
        let owner = UserId::new("user-1").unwrap();

        let registered = handlers
            .register_card
            .handle(RegisterCardCommand {
                owner_id: owner.clone(),
                card_number: "4532015112830366".to_string(),
                holder_name: "Asha Rao".to_string(),
                expiry_month: 12,
                expiry_year: crate::domain::foundation::Timestamp::now().year_month().0 + 1,
            })
            .await
            .unwrap();

        let listed = handlers
            .list_cards
            .handle(ListCardsQuery { owner_id: owner })
            .await
            .unwrap();

        assert_eq!(listed, vec![registered.card]);
    }
}

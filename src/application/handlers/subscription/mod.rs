//! Subscription handlers.
//!
//! ## Commands
//! - Creating a subscription (one-time order or gateway-side recurring)
//! - Renewing a subscription locally
//! - Stopping a subscription (gateway cancellation first)
//!
//! ## Queries
//! - Active subscription, history, lookup by id
//! - Plan listing and product lookup

mod create_subscription;
mod get_subscriptions;
mod list_plans;
mod renew_subscription;
mod stop_subscription;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::config::GatewayConfig;
use crate::domain::billing::{Subscription, SubscriptionDetails, SubscriptionError};
use crate::ports::{CardRepository, GatewayError, PlanCatalog};

// Commands
pub use create_subscription::{
    CreateSubscriptionCommand, CreateSubscriptionHandler, CreateSubscriptionResult,
};
pub use renew_subscription::{
    RenewSubscriptionCommand, RenewSubscriptionHandler, RenewSubscriptionResult,
};
pub use stop_subscription::{
    StopSubscriptionCommand, StopSubscriptionHandler, StopSubscriptionResult,
};

// Queries
pub use get_subscriptions::{
    GetActiveSubscriptionHandler, GetActiveSubscriptionQuery, GetSubscriptionHandler,
    GetSubscriptionHistoryHandler, GetSubscriptionHistoryQuery, GetSubscriptionQuery,
};
pub use list_plans::{
    GetProductHandler, GetProductQuery, ListPlansHandler, ListPlansQuery, ListProductsHandler,
};

/// How subscription handlers talk to the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayCallSettings {
    /// Currency for one-time orders.
    pub currency: String,

    /// Deadline for a single gateway call.
    pub timeout: Duration,
}

impl GatewayCallSettings {
    pub fn from_config(config: &GatewayConfig) -> Self {
        Self {
            currency: config.currency.clone(),
            timeout: config.request_timeout(),
        }
    }
}

impl Default for GatewayCallSettings {
    fn default() -> Self {
        Self {
            currency: "INR".to_string(),
            timeout: Duration::from_secs(15),
        }
    }
}

/// Runs a gateway call under a deadline. Timing out counts as unavailable.
async fn call_gateway<T, F>(
    timeout: Duration,
    operation: &'static str,
    call: F,
) -> Result<T, SubscriptionError>
where
    F: Future<Output = Result<T, GatewayError>>,
{
    match tokio::time::timeout(timeout, call).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => {
            tracing::error!(operation, error = %err, "gateway call failed");
            Err(err.into())
        }
        Err(_) => {
            tracing::error!(operation, timeout_ms = timeout.as_millis() as u64, "gateway call timed out");
            Err(SubscriptionError::GatewayUnavailable(format!(
                "{} timed out after {:?}",
                operation, timeout
            )))
        }
    }
}

/// Attaches plan name, product name and card suffix for display.
///
/// Missing catalog entries or deleted cards leave the field empty.
async fn enrich(
    subscription: Subscription,
    catalog: &Arc<dyn PlanCatalog>,
    cards: &Arc<dyn CardRepository>,
) -> Result<SubscriptionDetails, SubscriptionError> {
    let (plan_name, product_name, card_last_four) =
        display_fields(&subscription, catalog, cards).await?;

    Ok(SubscriptionDetails {
        subscription,
        plan_name,
        product_name,
        card_last_four,
    })
}

/// Like [`enrich`], for a record that is already persisted.
///
/// The write has happened, so a failed lookup leaves the display fields
/// empty instead of failing the command.
async fn enrich_persisted(
    subscription: Subscription,
    catalog: &Arc<dyn PlanCatalog>,
    cards: &Arc<dyn CardRepository>,
) -> SubscriptionDetails {
    let (plan_name, product_name, card_last_four) =
        match display_fields(&subscription, catalog, cards).await {
            Ok(fields) => fields,
            Err(err) => {
                tracing::warn!(
                    subscription_id = %subscription.id,
                    error = %err,
                    "display lookup failed after persisting subscription"
                );
                (None, None, None)
            }
        };

    SubscriptionDetails {
        subscription,
        plan_name,
        product_name,
        card_last_four,
    }
}

async fn display_fields(
    subscription: &Subscription,
    catalog: &Arc<dyn PlanCatalog>,
    cards: &Arc<dyn CardRepository>,
) -> Result<(Option<String>, Option<String>, Option<String>), SubscriptionError> {
    let plan_name = catalog
        .find_plan(&subscription.plan_id)
        .await?
        .map(|plan| plan.name);
    let product_name = catalog
        .find_product(&subscription.product_id)
        .await?
        .map(|product| product.name);
    let card_last_four = cards
        .find_by_id(&subscription.card_id)
        .await?
        .map(|card| card.last_four_digits);

    Ok((plan_name, product_name, card_last_four))
}

#[cfg(test)]
pub(crate) mod test_support {
    //! Shared fixtures for subscription handler tests.

    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;

    use crate::adapters::memory::{
        InMemoryCardRepository, InMemoryPlanCatalog, InMemorySubscriptionRepository,
    };
    use crate::adapters::razorpay::MockPaymentGateway;
    use crate::domain::billing::{Plan, PlanAttribute, Product};
    use crate::domain::card::{Card, CardBrand, CardFacts};
    use crate::domain::foundation::{DomainError, PlanId, ProductId, Timestamp, UserId};
    use crate::ports::{CardRepository, GatewayPlanIds, OwnerProfile, PlanCatalog, PlanMapping};

    pub const MONTHLY_GATEWAY_PLAN: &str = "plan_QIbEUICtejuBUQ";
    pub const YEARLY_GATEWAY_PLAN: &str = "plan_QIbFBU9kxYoEhg";

    pub fn owner(id: &str) -> UserId {
        UserId::new(id).unwrap()
    }

    pub fn profile(id: &str) -> OwnerProfile {
        OwnerProfile {
            owner_id: owner(id),
            name: "Asha Rao".to_string(),
            email: format!("{}@example.com", id),
            phone: Some("+919800000000".to_string()),
            gateway_customer_id: None,
        }
    }

    pub fn product() -> Product {
        Product {
            id: ProductId::new("prod-1").unwrap(),
            name: "Clinic Suite".to_string(),
            description: None,
        }
    }

    pub fn plan() -> Plan {
        Plan {
            id: PlanId::new("plan-001").unwrap(),
            product_id: ProductId::new("prod-1").unwrap(),
            name: "Starter".to_string(),
            price_monthly: 49_900,
            price_yearly: 499_900,
            attributes: vec![PlanAttribute {
                name: "seats".to_string(),
                value: "3".to_string(),
            }],
        }
    }

    pub fn mapping() -> PlanMapping {
        let mut plans = std::collections::HashMap::new();
        plans.insert(
            "plan-001".to_string(),
            GatewayPlanIds {
                monthly: MONTHLY_GATEWAY_PLAN.to_string(),
                yearly: YEARLY_GATEWAY_PLAN.to_string(),
            },
        );
        PlanMapping::new(plans)
    }

    /// Catalog whose `find_plan` starts failing after `healthy_lookups` calls.
    pub struct FailingPlanLookups {
        inner: InMemoryPlanCatalog,
        healthy_lookups: usize,
        calls: AtomicUsize,
    }

    impl FailingPlanLookups {
        pub fn after(healthy_lookups: usize) -> Self {
            Self {
                inner: InMemoryPlanCatalog::new()
                    .with_product(product())
                    .with_plan(plan()),
                healthy_lookups,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl PlanCatalog for FailingPlanLookups {
        async fn list_plans(&self, product_id: Option<&ProductId>) -> Result<Vec<Plan>, DomainError> {
            self.inner.list_plans(product_id).await
        }

        async fn find_plan(&self, plan_id: &PlanId) -> Result<Option<Plan>, DomainError> {
            if self.calls.fetch_add(1, Ordering::SeqCst) >= self.healthy_lookups {
                return Err(DomainError::database("catalog connection reset"));
            }
            self.inner.find_plan(plan_id).await
        }

        async fn find_product(&self, product_id: &ProductId) -> Result<Option<Product>, DomainError> {
            self.inner.find_product(product_id).await
        }

        async fn list_products(&self) -> Result<Vec<Product>, DomainError> {
            self.inner.list_products().await
        }
    }

    pub struct Fixture {
        pub cards: Arc<InMemoryCardRepository>,
        pub subscriptions: Arc<InMemorySubscriptionRepository>,
        pub catalog: Arc<InMemoryPlanCatalog>,
        pub gateway: MockPaymentGateway,
    }

    impl Fixture {
        pub fn new() -> Self {
            Self {
                cards: Arc::new(InMemoryCardRepository::new()),
                subscriptions: Arc::new(InMemorySubscriptionRepository::new()),
                catalog: Arc::new(
                    InMemoryPlanCatalog::new()
                        .with_product(product())
                        .with_plan(plan()),
                ),
                gateway: MockPaymentGateway::new().with_plans(mapping()),
            }
        }

        pub async fn card_for(&self, owner_id: &str) -> Card {
            let card = Card::register(
                owner(owner_id),
                CardFacts {
                    brand: CardBrand::Visa,
                    last_four: "1111".to_string(),
                },
                "Asha Rao",
                6,
                Timestamp::now().year_month().0 + 2,
            );
            self.cards.insert(&card).await.unwrap();
            card
        }
    }
}

//! In-memory adapters.
//!
//! Same atomic contracts as the PostgreSQL adapters, used by tests and for
//! running the engine without a database.

mod card_repository;
mod plan_catalog;
mod subscription_repository;
mod webhook_event_repository;

pub use card_repository::InMemoryCardRepository;
pub use plan_catalog::InMemoryPlanCatalog;
pub use subscription_repository::InMemorySubscriptionRepository;
pub use webhook_event_repository::InMemoryWebhookEventRepository;

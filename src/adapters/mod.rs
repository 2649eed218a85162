//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `postgres` - sqlx repositories and plan catalog
//! - `razorpay` - Payment gateway client and a recording mock
//! - `memory` - In-memory repositories for tests and local runs

pub mod memory;
pub mod postgres;
pub mod razorpay;

pub use memory::{
    InMemoryCardRepository, InMemoryPlanCatalog, InMemorySubscriptionRepository,
    InMemoryWebhookEventRepository,
};
pub use postgres::{
    PostgresCardRepository, PostgresPlanCatalog, PostgresSubscriptionRepository,
    PostgresWebhookEventRepository,
};
pub use razorpay::{MockPaymentGateway, RazorpayGateway};

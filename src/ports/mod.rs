//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Persistence Ports
//!
//! - `CardRepository` - Stored cards, with atomic default switching
//! - `SubscriptionRepository` - Subscription records, with superseding insert
//!   and conditional deactivation
//! - `PlanCatalog` - Read-only plans and products
//! - `WebhookEventRepository` - Webhook delivery idempotency tracking
//!
//! ## External Service Ports
//!
//! - `PaymentGateway` - Orders, customers and recurring subscriptions

mod card_repository;
mod payment_gateway;
mod plan_catalog;
mod subscription_repository;
mod webhook_event_repository;

pub use card_repository::CardRepository;
pub use payment_gateway::{
    CreateGatewaySubscriptionRequest, CreateOrderRequest, GatewayCustomer, GatewayError,
    GatewayErrorKind, GatewayOrder, GatewayPlanIds, GatewaySubscription, OwnerProfile,
    PaymentGateway, PlanMapping,
};
pub use plan_catalog::PlanCatalog;
pub use subscription_repository::SubscriptionRepository;
pub use webhook_event_repository::{
    ClaimResult, WebhookEventRecord, WebhookEventRepository, WebhookEventStatus, WebhookResult,
};

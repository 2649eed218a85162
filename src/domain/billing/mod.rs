//! Billing domain - Subscriptions, catalog data and gateway webhooks.
//!
//! # Subscription state machine
//!
//! ```text
//! Created ──> Active ──renew / subscription.charged──> superseded (inactive)
//!                │                                        + new Active record
//!                └──stop / subscription.cancelled──> Inactive
//! ```
//!
//! Superseding and deactivation are persistence-level atomic operations
//! (see `SubscriptionRepository`).

mod errors;
mod gateway_event;
mod payment_type;
mod plan;
mod subscription;
mod webhook_errors;
mod webhook_processor;
mod webhook_verifier;

pub use errors::SubscriptionError;
pub use gateway_event::{GatewayEvent, GatewayEventType, WebhookDelivery};
pub use payment_type::{InvalidPaymentType, PaymentType};
pub use plan::{Plan, PlanAttribute, Product};
pub use subscription::{NewSubscription, Subscription, SubscriptionDetails, MANUAL_RENEWAL_TERM};
pub use webhook_errors::WebhookError;
pub use webhook_processor::{
    HandlerRegistry, IdempotentWebhookProcessor, WebhookDispatcher, WebhookEventHandler,
};
pub use webhook_verifier::WebhookSignatureVerifier;

#[cfg(test)]
pub use webhook_verifier::sign_for_test;

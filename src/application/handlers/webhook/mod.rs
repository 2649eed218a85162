//! Webhook handlers.
//!
//! `HandleGatewayWebhookHandler` is the entry point for every gateway
//! callback. The per-event handlers are registered with its processor and
//! are exported for composition and testing.

mod event_handlers;
mod handle_gateway_webhook;
mod purge_webhook_events;

pub use event_handlers::{
    PaymentAuthorizedHandler, PaymentFailedHandler, SubscriptionCancelledHandler,
    SubscriptionChargedHandler,
};
pub use handle_gateway_webhook::{
    HandleGatewayWebhookCommand, HandleGatewayWebhookHandler, HandleGatewayWebhookResult,
    WebhookSettings,
};
pub use purge_webhook_events::{PurgeWebhookEventsHandler, PurgeWebhookEventsResult};

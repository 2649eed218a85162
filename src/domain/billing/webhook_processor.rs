//! Webhook processor - Orchestrates idempotent webhook event handling.
//!
//! ## Design
//!
//! 1. Claim the delivery by idempotency key (skip if already processed)
//! 2. Dispatch to the handler for the event type
//! 3. Complete the claim on success or ignore, release it on failure
//!
//! Releasing on failure lets the gateway's redelivery retry the event.
//! A finished record makes every later redelivery a no-op.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::domain::foundation::Timestamp;
use crate::ports::{ClaimResult, WebhookEventRepository, WebhookEventStatus, WebhookResult};

use super::{GatewayEvent, GatewayEventType, WebhookDelivery, WebhookError};

/// Handler for specific gateway event types.
///
/// Returns `Err(WebhookError::Ignored(_))` for events that should be
/// acknowledged without changes.
#[async_trait]
pub trait WebhookEventHandler: Send + Sync {
    /// Returns the event type(s) this handler processes.
    fn handles(&self) -> Vec<GatewayEventType>;

    /// Handles the event.
    async fn handle(&self, event: &GatewayEvent) -> Result<(), WebhookError>;
}

/// Routes events to handlers.
#[async_trait]
pub trait WebhookDispatcher: Send + Sync {
    /// Find a handler for the given event type.
    fn get_handler(&self, event_type: GatewayEventType) -> Option<&dyn WebhookEventHandler>;

    /// Dispatch an event to its handler.
    ///
    /// Returns `Err(WebhookError::Ignored)` if no handler is registered.
    async fn dispatch(&self, event: &GatewayEvent) -> Result<(), WebhookError> {
        match self.get_handler(event.event_type()) {
            Some(handler) => handler.handle(event).await,
            None => Err(WebhookError::Ignored(format!(
                "no handler for event type '{}'",
                event.name()
            ))),
        }
    }
}

/// Default dispatcher: a list of handlers searched in order.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: Vec<Box<dyn WebhookEventHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a handler. Earlier registrations win on overlap.
    pub fn register(mut self, handler: impl WebhookEventHandler + 'static) -> Self {
        self.handlers.push(Box::new(handler));
        self
    }
}

impl WebhookDispatcher for HandlerRegistry {
    fn get_handler(&self, event_type: GatewayEventType) -> Option<&dyn WebhookEventHandler> {
        self.handlers
            .iter()
            .find(|h| h.handles().contains(&event_type))
            .map(|h| h.as_ref())
    }
}

/// Processes deliveries with idempotency guarantees.
pub struct IdempotentWebhookProcessor<D: WebhookDispatcher> {
    repository: Arc<dyn WebhookEventRepository>,
    dispatcher: D,
    claim_timeout: Duration,
}

impl<D: WebhookDispatcher> IdempotentWebhookProcessor<D> {
    /// Creates a new processor. Claims older than `claim_timeout` are
    /// treated as abandoned.
    pub fn new(
        repository: Arc<dyn WebhookEventRepository>,
        dispatcher: D,
        claim_timeout: Duration,
    ) -> Self {
        Self {
            repository,
            dispatcher,
            claim_timeout,
        }
    }

    /// Process a delivery at most once per idempotency key.
    ///
    /// # Returns
    ///
    /// - `Ok(Processed)` - Event was applied
    /// - `Ok(Ignored)` - Event was acknowledged without changes
    /// - `Ok(AlreadyProcessed)` - Redelivery of a finished event
    /// - `Err(InFlight)` - Another worker is processing it right now
    /// - `Err(_)` - Processing failed; the claim was released
    pub async fn process(&self, delivery: &WebhookDelivery) -> Result<WebhookResult, WebhookError> {
        let key = delivery.idempotency_key.as_str();
        let event_name = delivery.event.name();

        let stale_before = Timestamp::now().minus(
            chrono::Duration::from_std(self.claim_timeout)
                .unwrap_or_else(|_| chrono::Duration::minutes(5)),
        );

        match self.repository.try_claim(key, event_name, stale_before).await? {
            ClaimResult::Claimed => {}
            ClaimResult::AlreadyProcessed => {
                tracing::info!(event_id = key, event_type = event_name, "duplicate webhook delivery skipped");
                return Ok(WebhookResult::AlreadyProcessed);
            }
            ClaimResult::InFlight => return Err(WebhookError::InFlight(key.to_string())),
        }

        match self.dispatcher.dispatch(&delivery.event).await {
            Ok(()) => {
                self.repository
                    .complete(key, WebhookEventStatus::Succeeded, None)
                    .await?;
                Ok(WebhookResult::Processed)
            }
            Err(WebhookError::Ignored(reason)) => {
                tracing::debug!(event_id = key, event_type = event_name, %reason, "webhook ignored");
                self.repository
                    .complete(key, WebhookEventStatus::Ignored, Some(&reason))
                    .await?;
                Ok(WebhookResult::Ignored)
            }
            Err(err) => {
                if let Err(release_err) = self.repository.release(key, &err.to_string()).await {
                    tracing::error!(
                        event_id = key,
                        error = %release_err,
                        "failed to release webhook claim; redelivery waits for claim timeout"
                    );
                }
                Err(err)
            }
        }
    }
}

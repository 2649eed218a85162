//! HandleGatewayWebhookHandler - Entry point for gateway callbacks.
//!
//! 1. Verify the signature (unless an allowed test-mode bypass applies)
//! 2. Decode the event
//! 3. Process it at most once per delivery key

use std::sync::Arc;
use std::time::Duration;

use crate::config::WebhookConfig;
use crate::domain::billing::{
    GatewayEvent, HandlerRegistry, IdempotentWebhookProcessor, WebhookDelivery, WebhookError,
};
use crate::ports::{PaymentGateway, SubscriptionRepository, WebhookEventRepository, WebhookResult};

use super::event_handlers::{
    PaymentAuthorizedHandler, PaymentFailedHandler, SubscriptionCancelledHandler,
    SubscriptionChargedHandler,
};

/// Command carrying one raw delivery.
#[derive(Debug, Clone)]
pub struct HandleGatewayWebhookCommand {
    /// Raw request body, exactly as received.
    pub payload: Vec<u8>,
    /// Signature header value.
    pub signature: Option<String>,
    /// Gateway event id header, used as the idempotency key when present.
    pub event_id: Option<String>,
    /// Caller asks to skip signature verification.
    pub test_mode: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandleGatewayWebhookResult {
    pub event_type: String,
    pub outcome: WebhookResult,
}

/// Reconciler settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookSettings {
    /// Honour `test_mode` requests. Never enabled in production.
    pub allow_test_mode: bool,
    /// Age after which an unfinished claim is treated as abandoned.
    pub claim_timeout: Duration,
}

impl WebhookSettings {
    pub fn from_config(config: &WebhookConfig) -> Self {
        Self {
            allow_test_mode: config.allow_test_mode,
            claim_timeout: config.claim_timeout(),
        }
    }
}

impl Default for WebhookSettings {
    fn default() -> Self {
        Self {
            allow_test_mode: false,
            claim_timeout: Duration::from_secs(300),
        }
    }
}

pub struct HandleGatewayWebhookHandler {
    gateway: Arc<dyn PaymentGateway>,
    processor: IdempotentWebhookProcessor<HandlerRegistry>,
    allow_test_mode: bool,
}

impl HandleGatewayWebhookHandler {
    pub fn new(
        gateway: Arc<dyn PaymentGateway>,
        subscriptions: Arc<dyn SubscriptionRepository>,
        events: Arc<dyn WebhookEventRepository>,
        settings: WebhookSettings,
    ) -> Self {
        let registry = HandlerRegistry::new()
            .register(PaymentAuthorizedHandler::new(subscriptions.clone()))
            .register(SubscriptionChargedHandler::new(subscriptions.clone()))
            .register(SubscriptionCancelledHandler::new(subscriptions))
            .register(PaymentFailedHandler);

        Self {
            gateway,
            processor: IdempotentWebhookProcessor::new(events, registry, settings.claim_timeout),
            allow_test_mode: settings.allow_test_mode,
        }
    }

    pub async fn handle(
        &self,
        cmd: HandleGatewayWebhookCommand,
    ) -> Result<HandleGatewayWebhookResult, WebhookError> {
        // 1. Authenticity
        self.verify(&cmd)?;

        // 2. Decode
        let event = GatewayEvent::decode(&cmd.payload).map_err(|err| {
            tracing::warn!(error = %err, "undecodable webhook payload");
            err
        })?;
        let event_type = event.name().to_string();

        // 3. Idempotent processing
        let delivery = WebhookDelivery::new(event, cmd.event_id.as_deref(), &cmd.payload);
        let outcome = match self.processor.process(&delivery).await {
            Ok(outcome) => outcome,
            Err(err) => {
                tracing::error!(
                    event_id = %delivery.idempotency_key,
                    event_type = %event_type,
                    error = %err,
                    retryable = err.is_retryable(),
                    "webhook processing failed"
                );
                return Err(err);
            }
        };

        tracing::info!(
            event_id = %delivery.idempotency_key,
            event_type = %event_type,
            outcome = ?outcome,
            "webhook handled"
        );

        Ok(HandleGatewayWebhookResult {
            event_type,
            outcome,
        })
    }

    fn verify(&self, cmd: &HandleGatewayWebhookCommand) -> Result<(), WebhookError> {
        if cmd.test_mode {
            if self.allow_test_mode {
                tracing::debug!("webhook signature check skipped in test mode");
                return Ok(());
            }
            tracing::warn!("test-mode bypass requested but not allowed; verifying signature");
        }

        let signature = cmd.signature.as_deref().unwrap_or_default();
        if !self.gateway.verify_signature(&cmd.payload, signature) {
            tracing::warn!(
                event_id = cmd.event_id.as_deref().unwrap_or("-"),
                has_signature = cmd.signature.is_some(),
                "webhook signature verification failed"
            );
            return Err(WebhookError::InvalidSignature);
        }
        Ok(())
    }
}

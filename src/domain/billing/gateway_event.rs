//! Gateway webhook events.
//!
//! Deliveries arrive as `{"event": "<name>", "payload": {...}}`. The name is
//! read first; the payload is then decoded into the typed shape for that
//! event, so a missing required field is a decode error instead of an empty
//! string further down.

use serde::Deserialize;
use sha2::{Digest, Sha256};

use super::WebhookError;

/// Event names the reconciler acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GatewayEventType {
    PaymentAuthorized,
    PaymentFailed,
    SubscriptionCharged,
    SubscriptionCancelled,
    /// Anything else. Accepted and ignored.
    Unknown,
}

impl GatewayEventType {
    /// Parse event type from the gateway's event name.
    pub fn parse(name: &str) -> Self {
        match name {
            "payment.authorized" => Self::PaymentAuthorized,
            "payment.failed" => Self::PaymentFailed,
            "subscription.charged" => Self::SubscriptionCharged,
            "subscription.cancelled" => Self::SubscriptionCancelled,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PaymentAuthorized => "payment.authorized",
            Self::PaymentFailed => "payment.failed",
            Self::SubscriptionCharged => "subscription.charged",
            Self::SubscriptionCancelled => "subscription.cancelled",
            Self::Unknown => "unknown",
        }
    }
}

/// A decoded gateway event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GatewayEvent {
    PaymentAuthorized {
        payment_id: String,
        order_id: String,
    },
    PaymentFailed {
        payment_id: Option<String>,
        order_id: Option<String>,
        subscription_id: Option<String>,
    },
    SubscriptionCharged {
        subscription_id: String,
        payment_id: Option<String>,
    },
    SubscriptionCancelled {
        subscription_id: String,
    },
    Unrecognized {
        name: String,
    },
}

// ─────────────────────────────────────────────────────────────────────────────
// Wire shapes
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct Envelope {
    event: Option<String>,
    #[serde(default)]
    payload: serde_json::Value,
}

#[derive(Deserialize)]
struct Entity<T> {
    entity: T,
}

#[derive(Deserialize)]
struct AuthorizedPayload {
    payment: Entity<AuthorizedPayment>,
}

#[derive(Deserialize)]
struct AuthorizedPayment {
    id: Option<String>,
    order_id: Option<String>,
}

#[derive(Deserialize)]
struct SubscriptionPayload {
    subscription: Entity<SubscriptionEntity>,
    #[serde(default)]
    payment: Option<Entity<PaymentRefs>>,
}

#[derive(Deserialize)]
struct SubscriptionEntity {
    id: Option<String>,
}

#[derive(Deserialize, Default)]
struct FailedPayload {
    #[serde(default)]
    payment: Option<Entity<PaymentRefs>>,
}

#[derive(Deserialize, Default)]
struct PaymentRefs {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    order_id: Option<String>,
    #[serde(default)]
    subscription_id: Option<String>,
}

fn required(value: Option<String>, field: &'static str) -> Result<String, WebhookError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(WebhookError::MissingField(field)),
    }
}

fn optional(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl GatewayEvent {
    /// Decodes a raw webhook body.
    ///
    /// # Errors
    ///
    /// - `MalformedPayload` if the body is not a JSON object or a payload
    ///   section has the wrong shape
    /// - `MissingField` if the event name or a required id is absent or empty
    pub fn decode(raw: &[u8]) -> Result<Self, WebhookError> {
        let envelope: Envelope = serde_json::from_slice(raw)?;
        let name = required(envelope.event, "event")?;

        let event = match GatewayEventType::parse(&name) {
            GatewayEventType::PaymentAuthorized => {
                let payload: AuthorizedPayload = serde_json::from_value(envelope.payload)?;
                GatewayEvent::PaymentAuthorized {
                    payment_id: required(payload.payment.entity.id, "payload.payment.entity.id")?,
                    order_id: required(
                        payload.payment.entity.order_id,
                        "payload.payment.entity.order_id",
                    )?,
                }
            }
            GatewayEventType::SubscriptionCharged => {
                let payload: SubscriptionPayload = serde_json::from_value(envelope.payload)?;
                GatewayEvent::SubscriptionCharged {
                    subscription_id: required(
                        payload.subscription.entity.id,
                        "payload.subscription.entity.id",
                    )?,
                    payment_id: payload.payment.and_then(|p| optional(p.entity.id)),
                }
            }
            GatewayEventType::SubscriptionCancelled => {
                let payload: SubscriptionPayload = serde_json::from_value(envelope.payload)?;
                GatewayEvent::SubscriptionCancelled {
                    subscription_id: required(
                        payload.subscription.entity.id,
                        "payload.subscription.entity.id",
                    )?,
                }
            }
            GatewayEventType::PaymentFailed => {
                // Diagnostics only, so a sparse payload is still accepted.
                let payload: FailedPayload =
                    serde_json::from_value(envelope.payload).unwrap_or_default();
                let refs = payload.payment.map(|p| p.entity).unwrap_or_default();
                GatewayEvent::PaymentFailed {
                    payment_id: optional(refs.id),
                    order_id: optional(refs.order_id),
                    subscription_id: optional(refs.subscription_id),
                }
            }
            GatewayEventType::Unknown => GatewayEvent::Unrecognized { name },
        };

        Ok(event)
    }

    pub fn event_type(&self) -> GatewayEventType {
        match self {
            GatewayEvent::PaymentAuthorized { .. } => GatewayEventType::PaymentAuthorized,
            GatewayEvent::PaymentFailed { .. } => GatewayEventType::PaymentFailed,
            GatewayEvent::SubscriptionCharged { .. } => GatewayEventType::SubscriptionCharged,
            GatewayEvent::SubscriptionCancelled { .. } => GatewayEventType::SubscriptionCancelled,
            GatewayEvent::Unrecognized { .. } => GatewayEventType::Unknown,
        }
    }

    /// Event name as the gateway sent it.
    pub fn name(&self) -> &str {
        match self {
            GatewayEvent::Unrecognized { name } => name,
            other => other.event_type().as_str(),
        }
    }
}

/// A verified, decoded delivery ready for processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookDelivery {
    /// Deduplication key for redeliveries of the same event.
    pub idempotency_key: String,
    pub event: GatewayEvent,
}

impl WebhookDelivery {
    /// Builds a delivery keyed by the gateway event id, or by a SHA-256 of
    /// the raw body when the gateway did not send one.
    pub fn new(event: GatewayEvent, gateway_event_id: Option<&str>, raw: &[u8]) -> Self {
        let idempotency_key = match gateway_event_id.map(str::trim) {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => format!("sha256:{}", hex::encode(Sha256::digest(raw))),
        };
        Self {
            idempotency_key,
            event,
        }
    }
}

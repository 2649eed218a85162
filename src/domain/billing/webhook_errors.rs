//! Webhook error types for gateway callback handling.
//!
//! Every variant carries retry semantics: the gateway redelivers anything
//! the caller reports as a failure, so only transient conditions should be
//! reported as retryable.

use thiserror::Error;

use crate::domain::foundation::{DomainError, ErrorCode};

/// Errors that occur during webhook processing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WebhookError {
    /// Signature did not match the shared secret.
    #[error("Invalid signature")]
    InvalidSignature,

    /// Body is not JSON or does not match the event's expected shape.
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    /// A required field was absent or empty.
    #[error("Missing field: {0}")]
    MissingField(&'static str),

    /// No local subscription matches the gateway identifier.
    #[error("Subscription not found for {0}")]
    SubscriptionNotFound(String),

    /// Event was intentionally not acted on (not an error condition).
    #[error("Event ignored: {0}")]
    Ignored(String),

    /// Another worker holds the claim on this delivery.
    #[error("Delivery {0} is already being processed")]
    InFlight(String),

    /// Storage operation failed.
    #[error("Database error: {0}")]
    Database(String),
}

impl WebhookError {
    /// Returns the error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            WebhookError::InvalidSignature => ErrorCode::InvalidSignature,
            WebhookError::MalformedPayload(_) | WebhookError::MissingField(_) => {
                ErrorCode::MalformedPayload
            }
            WebhookError::SubscriptionNotFound(_) => ErrorCode::NotFound,
            WebhookError::Ignored(_) => ErrorCode::ValidationFailed,
            WebhookError::InFlight(_) => ErrorCode::Conflict,
            WebhookError::Database(_) => ErrorCode::DatabaseError,
        }
    }

    /// Returns true if the gateway should redeliver this webhook.
    ///
    /// A missing subscription is retryable: the callback can arrive before
    /// the creating request has committed its record.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            WebhookError::Database(_)
                | WebhookError::InFlight(_)
                | WebhookError::SubscriptionNotFound(_)
        )
    }
}

impl From<DomainError> for WebhookError {
    fn from(err: DomainError) -> Self {
        WebhookError::Database(err.to_string())
    }
}

impl From<serde_json::Error> for WebhookError {
    fn from(err: serde_json::Error) -> Self {
        WebhookError::MalformedPayload(err.to_string())
    }
}

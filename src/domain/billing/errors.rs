//! Subscription lifecycle error types.

use thiserror::Error;

use crate::domain::foundation::{CardId, DomainError, ErrorCode, PlanId, SubscriptionId};

use super::PaymentType;

/// Errors raised by subscription creation, renewal and termination.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubscriptionError {
    #[error("Invalid payment type '{0}', expected 'monthly' or 'yearly'")]
    InvalidPaymentType(String),

    #[error("Card {0} does not exist or belongs to another user")]
    InvalidCard(CardId),

    #[error("Plan {0} does not exist")]
    InvalidPlan(PlanId),

    #[error("No gateway plan is configured for {plan_id} ({payment_type})")]
    UnknownPlan {
        plan_id: PlanId,
        payment_type: PaymentType,
    },

    #[error("Subscription not found: {0}")]
    NotFound(SubscriptionId),

    #[error("Subscription {0} belongs to another user")]
    Unauthorized(SubscriptionId),

    #[error("Subscription {0} is not active")]
    NotActive(SubscriptionId),

    #[error("Payment gateway unavailable: {0}")]
    GatewayUnavailable(String),

    #[error("Payment gateway rejected the request: {message}")]
    GatewayRejected {
        message: String,
        provider_code: Option<String>,
    },

    #[error("Error: {0}")]
    Infrastructure(String),
}

impl SubscriptionError {
    /// Returns the error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            SubscriptionError::InvalidPaymentType(_)
            | SubscriptionError::InvalidCard(_)
            | SubscriptionError::InvalidPlan(_)
            | SubscriptionError::UnknownPlan { .. } => ErrorCode::ValidationFailed,
            SubscriptionError::NotFound(_) => ErrorCode::NotFound,
            SubscriptionError::Unauthorized(_) => ErrorCode::Unauthorized,
            SubscriptionError::NotActive(_) => ErrorCode::Conflict,
            SubscriptionError::GatewayUnavailable(_) => ErrorCode::GatewayUnavailable,
            SubscriptionError::GatewayRejected { .. } => ErrorCode::GatewayRejected,
            SubscriptionError::Infrastructure(_) => ErrorCode::DatabaseError,
        }
    }

    /// Returns true if this error should trigger a retry.
    pub fn is_retryable(&self) -> bool {
        self.code().is_retryable()
    }
}

impl From<DomainError> for SubscriptionError {
    fn from(err: DomainError) -> Self {
        SubscriptionError::Infrastructure(err.to_string())
    }
}

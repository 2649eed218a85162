//! Payment gateway port - Outbound calls to the payment provider.
//!
//! Adapters are stateless apart from credentials and the plan mapping.
//! Every network failure (connect error, timeout, 5xx, 429) is reported as
//! `Unavailable` and every provider-side refusal (other 4xx) as `Rejected`,
//! so callers can retry the former and surface the latter.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::domain::billing::{PaymentType, SubscriptionError};
use crate::domain::foundation::{ErrorCode, PlanId, UserId};

/// Port for payment gateway operations.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create a one-time order for `amount` minor units.
    async fn create_order(&self, request: CreateOrderRequest) -> Result<GatewayOrder, GatewayError>;

    /// Reuse the customer already linked to the owner, or create one.
    async fn get_or_create_customer(
        &self,
        owner: &OwnerProfile,
    ) -> Result<GatewayCustomer, GatewayError>;

    /// Map an internal plan and cadence to the gateway's plan id.
    ///
    /// # Errors
    ///
    /// - `UnknownPlan` if the pair is not configured
    fn resolve_plan(
        &self,
        plan_id: &PlanId,
        payment_type: PaymentType,
    ) -> Result<String, GatewayError>;

    /// Create a gateway-side recurring subscription.
    async fn create_subscription(
        &self,
        request: CreateGatewaySubscriptionRequest,
    ) -> Result<GatewaySubscription, GatewayError>;

    /// Cancel a recurring subscription immediately (not at cycle end).
    async fn cancel_subscription(&self, gateway_subscription_id: &str) -> Result<(), GatewayError>;

    /// Check a webhook signature over the raw body.
    fn verify_signature(&self, payload: &[u8], signature: &str) -> bool;
}

// ════════════════════════════════════════════════════════════════════════════
// Request/Response Types
// ════════════════════════════════════════════════════════════════════════════

/// Owner details used to find or create the gateway customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerProfile {
    pub owner_id: UserId,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,

    /// Customer id already linked to this owner, if any.
    pub gateway_customer_id: Option<String>,
}

/// Request to create a one-time order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateOrderRequest {
    /// Amount in minor units.
    pub amount: i64,
    pub currency: String,

    /// Merchant reference, the local subscription id.
    pub receipt: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GatewayOrder {
    pub id: String,
    pub amount: i64,
    pub currency: String,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GatewayCustomer {
    pub id: String,
}

/// Request to create a recurring subscription.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreateGatewaySubscriptionRequest {
    pub gateway_plan_id: String,
    pub customer_id: String,

    /// Number of billing cycles before the gateway stops charging.
    pub total_count: u32,
    pub notify_customer: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GatewaySubscription {
    pub id: String,
    pub status: String,
}

// ════════════════════════════════════════════════════════════════════════════
// Plan Mapping
// ════════════════════════════════════════════════════════════════════════════

/// Gateway plan ids for one internal plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayPlanIds {
    pub monthly: String,
    pub yearly: String,
}

/// Immutable `(plan, cadence) -> gateway plan id` table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlanMapping {
    plans: HashMap<String, GatewayPlanIds>,
}

impl PlanMapping {
    pub fn new(plans: HashMap<String, GatewayPlanIds>) -> Self {
        Self { plans }
    }

    /// Looks up the gateway plan id.
    pub fn resolve(
        &self,
        plan_id: &PlanId,
        payment_type: PaymentType,
    ) -> Result<String, GatewayError> {
        let ids = self
            .plans
            .get(plan_id.as_str())
            .ok_or_else(|| GatewayError::unknown_plan(plan_id, payment_type))?;

        let id = match payment_type {
            PaymentType::Monthly => &ids.monthly,
            PaymentType::Yearly => &ids.yearly,
        };

        if id.trim().is_empty() {
            return Err(GatewayError::unknown_plan(plan_id, payment_type));
        }
        Ok(id.clone())
    }

    pub fn len(&self) -> usize {
        self.plans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plans.is_empty()
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Error Types
// ════════════════════════════════════════════════════════════════════════════

/// Gateway error kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayErrorKind {
    /// Network failure, timeout, 5xx or rate limit. Safe to retry.
    Unavailable,

    /// The provider refused the request. Needs user action.
    Rejected,

    /// No gateway plan is configured for the requested pair.
    UnknownPlan,
}

/// Error from a gateway call, carrying the provider's raw message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayError {
    pub kind: GatewayErrorKind,

    /// Human-readable message (provider description when available).
    pub message: String,

    /// Provider's error code (if available).
    pub provider_code: Option<String>,
}

impl GatewayError {
    pub fn new(kind: GatewayErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            provider_code: None,
        }
    }

    /// Create with provider code.
    pub fn with_provider_code(mut self, code: impl Into<String>) -> Self {
        self.provider_code = Some(code.into());
        self
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorKind::Unavailable, message)
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorKind::Rejected, message)
    }

    pub fn unknown_plan(plan_id: &PlanId, payment_type: PaymentType) -> Self {
        Self::new(
            GatewayErrorKind::UnknownPlan,
            format!("no gateway plan for {} ({})", plan_id, payment_type),
        )
    }

    pub fn code(&self) -> ErrorCode {
        match self.kind {
            GatewayErrorKind::Unavailable => ErrorCode::GatewayUnavailable,
            GatewayErrorKind::Rejected => ErrorCode::GatewayRejected,
            GatewayErrorKind::UnknownPlan => ErrorCode::ValidationFailed,
        }
    }

    pub fn is_retryable(&self) -> bool {
        self.kind == GatewayErrorKind::Unavailable
    }
}

impl std::fmt::Display for GatewayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.provider_code {
            Some(code) => write!(f, "{} [{}]: {}", self.code(), code, self.message),
            None => write!(f, "{}: {}", self.code(), self.message),
        }
    }
}

impl std::error::Error for GatewayError {}

impl From<GatewayError> for SubscriptionError {
    fn from(err: GatewayError) -> Self {
        match err.kind {
            GatewayErrorKind::Unavailable => SubscriptionError::GatewayUnavailable(err.message),
            GatewayErrorKind::Rejected | GatewayErrorKind::UnknownPlan => {
                SubscriptionError::GatewayRejected {
                    message: err.message,
                    provider_code: err.provider_code,
                }
            }
        }
    }
}

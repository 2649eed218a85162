//! Payment gateway configuration

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

use crate::ports::{GatewayPlanIds, PlanMapping};

use super::error::ValidationError;

/// Payment gateway configuration (Razorpay)
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    /// API key id, used as the basic auth user
    pub key_id: SecretString,

    /// API key secret
    pub key_secret: SecretString,

    /// Webhook signing secret. Without one, deliveries are not verified.
    #[serde(default)]
    pub webhook_secret: Option<SecretString>,

    /// Base URL for the gateway API
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// ISO currency code for orders
    #[serde(default = "default_currency")]
    pub currency: String,

    /// Catalog plan id to gateway plan ids
    #[serde(default)]
    pub plans: HashMap<String, GatewayPlanIds>,
}

impl GatewayConfig {
    /// Creates a configuration with default endpoint, timeout and currency.
    pub fn new(key_id: impl Into<String>, key_secret: impl Into<String>) -> Self {
        Self {
            key_id: SecretString::new(key_id.into()),
            key_secret: SecretString::new(key_secret.into()),
            webhook_secret: None,
            api_base_url: default_api_base_url(),
            request_timeout_secs: default_request_timeout(),
            currency: default_currency(),
            plans: HashMap::new(),
        }
    }

    /// Get request timeout as Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Builds the immutable plan table handed to the gateway adapter.
    pub fn plan_mapping(&self) -> PlanMapping {
        PlanMapping::new(self.plans.clone())
    }

    /// Whether webhook signatures will actually be checked.
    pub fn verifies_signatures(&self) -> bool {
        self.webhook_secret
            .as_ref()
            .map(|s| !s.expose_secret().trim().is_empty())
            .unwrap_or(false)
    }

    /// Validate gateway configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.key_id.expose_secret().is_empty() {
            return Err(ValidationError::MissingRequired("GATEWAY__KEY_ID"));
        }
        if self.key_secret.expose_secret().is_empty() {
            return Err(ValidationError::MissingRequired("GATEWAY__KEY_SECRET"));
        }
        if !self.api_base_url.starts_with("https://") && !self.api_base_url.starts_with("http://")
        {
            return Err(ValidationError::InvalidApiBaseUrl);
        }
        if self.request_timeout_secs == 0 || self.request_timeout_secs > 120 {
            return Err(ValidationError::InvalidTimeout("gateway.request_timeout_secs"));
        }
        if self.currency.len() != 3 || !self.currency.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(ValidationError::InvalidCurrency(self.currency.clone()));
        }
        for (plan_id, ids) in &self.plans {
            if ids.monthly.trim().is_empty() && ids.yearly.trim().is_empty() {
                return Err(ValidationError::EmptyPlanMapping(plan_id.clone()));
            }
        }

        if !self.verifies_signatures() {
            tracing::warn!(
                "No gateway webhook secret configured: webhook signatures will NOT be verified"
            );
        }
        Ok(())
    }
}

fn default_api_base_url() -> String {
    "https://api.razorpay.com/v1".to_string()
}

fn default_request_timeout() -> u64 {
    15
}

fn default_currency() -> String {
    "INR".to_string()
}

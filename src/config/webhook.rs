//! Webhook processing configuration

use serde::Deserialize;
use std::time::Duration;

use super::environment::Environment;
use super::error::ValidationError;

/// Webhook processing configuration
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookConfig {
    /// Honour the caller's test-mode flag and skip signature checks.
    /// Never allowed in production.
    #[serde(default)]
    pub allow_test_mode: bool,

    /// Seconds after which an unfinished claim is considered abandoned
    #[serde(default = "default_claim_timeout")]
    pub claim_timeout_secs: u64,

    /// Days to keep finished idempotency records
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,
}

impl WebhookConfig {
    /// Get claim timeout as Duration
    pub fn claim_timeout(&self) -> Duration {
        Duration::from_secs(self.claim_timeout_secs)
    }

    /// Retention window for finished records.
    pub fn retention(&self) -> chrono::Duration {
        chrono::Duration::days(i64::from(self.retention_days))
    }

    /// Validate webhook configuration
    pub fn validate(&self, environment: Environment) -> Result<(), ValidationError> {
        if self.claim_timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout("webhook.claim_timeout_secs"));
        }
        if self.allow_test_mode && environment == Environment::Production {
            return Err(ValidationError::TestModeInProduction);
        }
        Ok(())
    }
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            allow_test_mode: false,
            claim_timeout_secs: default_claim_timeout(),
            retention_days: default_retention_days(),
        }
    }
}

fn default_claim_timeout() -> u64 {
    300
}

fn default_retention_days() -> u32 {
    30
}

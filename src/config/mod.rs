//! Application configuration module
//!
//! Type-safe configuration loading using the `config` and `dotenvy` crates.
//! Sources, later ones overriding earlier ones:
//!
//! 1. `.env` file if present (development)
//! 2. the TOML file named by `BILLING_CONFIG_FILE`, if set
//! 3. environment variables with the `BILLING` prefix, `__` between levels
//!
//! # Example
//!
//! ```no_run
//! use subscription_billing::config::{init_tracing, AppConfig};
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! init_tracing(&config.logging);
//! ```

mod database;
mod environment;
mod error;
mod gateway;
mod logging;
mod webhook;

pub use database::DatabaseConfig;
pub use environment::Environment;
pub use error::{ConfigError, ValidationError};
pub use gateway::GatewayConfig;
pub use logging::{init_tracing, LoggingConfig};
pub use webhook::WebhookConfig;

use serde::Deserialize;

/// Environment variable naming an optional TOML configuration file.
pub const CONFIG_FILE_ENV: &str = "BILLING_CONFIG_FILE";

/// Root application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Deployment environment
    #[serde(default)]
    pub environment: Environment,

    /// Database configuration (PostgreSQL connection)
    pub database: DatabaseConfig,

    /// Payment gateway credentials, currency and plan table
    pub gateway: GatewayConfig,

    /// Webhook processing
    #[serde(default)]
    pub webhook: WebhookConfig,

    /// Logging
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from the file and environment sources.
    ///
    /// # Environment Variable Format
    ///
    /// - `BILLING__GATEWAY__KEY_ID=rzp_...` -> `gateway.key_id`
    /// - `BILLING__GATEWAY__PLANS__PLAN-001__MONTHLY=plan_...` -> `gateway.plans["plan-001"].monthly`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required values are missing or cannot be
    /// parsed into the expected types.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let mut builder = config::Config::builder();
        if let Ok(path) = std::env::var(CONFIG_FILE_ENV) {
            builder = builder.add_source(config::File::with_name(&path).required(true));
        }

        let config = builder
            .add_source(
                config::Environment::default()
                    .prefix("BILLING")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Load and validate in one step.
    pub fn load_validated() -> Result<Self, ConfigError> {
        let config = Self::load()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.database.validate()?;
        self.gateway.validate()?;
        self.webhook.validate(self.environment)?;
        self.logging.validate()?;
        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.environment.is_production()
    }
}

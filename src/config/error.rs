//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid timeout for {0}")]
    InvalidTimeout(&'static str),

    #[error("Invalid database URL format")]
    InvalidDatabaseUrl,

    #[error("Pool min_connections exceeds max_connections")]
    InvalidPoolSize,

    #[error("Pool size exceeds maximum allowed (100)")]
    PoolSizeTooLarge,

    #[error("Invalid gateway API base URL")]
    InvalidApiBaseUrl,

    #[error("Currency must be a three-letter code, got '{0}'")]
    InvalidCurrency(String),

    #[error("Plan '{0}' has no gateway plan id for either cadence")]
    EmptyPlanMapping(String),

    #[error("Webhook test mode cannot be enabled in production")]
    TestModeInProduction,

    #[error("Invalid log level '{0}'")]
    InvalidLogLevel(String),
}

//! PostgreSQL adapters - Database implementations for repository ports.
//!
//! - `PostgresCardRepository` - Stored cards with transactional default switching
//! - `PostgresSubscriptionRepository` - Subscription records with superseding insert
//! - `PostgresPlanCatalog` - Read-only plans, attributes and products
//! - `PostgresWebhookEventRepository` - Webhook idempotency claims
//!
//! The schema lives in `migrations/` and is applied with [`run_migrations`].

mod card_repository;
mod plan_catalog;
mod subscription_repository;
mod webhook_event_repository;

pub use card_repository::PostgresCardRepository;
pub use plan_catalog::PostgresPlanCatalog;
pub use subscription_repository::PostgresSubscriptionRepository;
pub use webhook_event_repository::PostgresWebhookEventRepository;

use sqlx::PgPool;

use crate::domain::foundation::DomainError;

/// First key of the per-owner advisory lock taken by `set_default`.
const CARD_LOCK_NAMESPACE: i32 = 1;

/// First key of the per-owner advisory lock taken by `insert_superseding`.
const SUBSCRIPTION_LOCK_NAMESPACE: i32 = 2;

/// Applies the embedded schema migrations.
pub async fn run_migrations(pool: &PgPool) -> Result<(), DomainError> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to run migrations: {}", e)))
}

fn db_error(context: &str, err: sqlx::Error) -> DomainError {
    tracing::error!(error = %err, "{}", context);
    DomainError::database(format!("{}: {}", context, err))
}

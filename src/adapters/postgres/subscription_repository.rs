//! PostgreSQL implementation of SubscriptionRepository.
//!
//! `insert_superseding` deactivates and inserts in one transaction, under a
//! per-owner advisory lock so concurrent creations for one owner queue up
//! instead of tripping the `subscriptions_one_active_per_owner` index.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::billing::{PaymentType, Subscription};
use crate::domain::foundation::{
    CardId, DomainError, ErrorCode, PlanId, ProductId, SubscriptionId, Timestamp, UserId,
};
use crate::ports::SubscriptionRepository;

use super::{db_error, SUBSCRIPTION_LOCK_NAMESPACE};

/// PostgreSQL implementation of the SubscriptionRepository port.
pub struct PostgresSubscriptionRepository {
    pool: PgPool,
}

impl PostgresSubscriptionRepository {
    /// Creates a new PostgresSubscriptionRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of a subscription.
#[derive(Debug, sqlx::FromRow)]
struct SubscriptionRow {
    id: Uuid,
    owner_id: String,
    product_id: String,
    plan_id: String,
    card_id: Uuid,
    payment_type: String,
    amount: i64,
    is_renewal: bool,
    is_active: bool,
    auto_renewal: bool,
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
    next_renewal_date: DateTime<Utc>,
    gateway_order_id: Option<String>,
    gateway_payment_id: Option<String>,
    gateway_subscription_id: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

fn invalid_column(column: &str, err: impl std::fmt::Display) -> DomainError {
    DomainError::new(
        ErrorCode::DatabaseError,
        format!("Invalid {}: {}", column, err),
    )
}

impl TryFrom<SubscriptionRow> for Subscription {
    type Error = DomainError;

    fn try_from(row: SubscriptionRow) -> Result<Self, Self::Error> {
        let payment_type: PaymentType = row
            .payment_type
            .parse()
            .map_err(|e| invalid_column("payment_type", e))?;

        Ok(Subscription {
            id: SubscriptionId::from_uuid(row.id),
            owner_id: UserId::new(row.owner_id).map_err(|e| invalid_column("owner_id", e))?,
            product_id: ProductId::new(row.product_id)
                .map_err(|e| invalid_column("product_id", e))?,
            plan_id: PlanId::new(row.plan_id).map_err(|e| invalid_column("plan_id", e))?,
            card_id: CardId::from_uuid(row.card_id),
            payment_type,
            amount: row.amount,
            is_renewal: row.is_renewal,
            is_active: row.is_active,
            auto_renewal: row.auto_renewal,
            start_date: Timestamp::from_datetime(row.start_date),
            end_date: Timestamp::from_datetime(row.end_date),
            next_renewal_date: Timestamp::from_datetime(row.next_renewal_date),
            gateway_order_id: row.gateway_order_id,
            gateway_payment_id: row.gateway_payment_id,
            gateway_subscription_id: row.gateway_subscription_id,
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

const SELECT_SUBSCRIPTION: &str = r#"
    SELECT id, owner_id, product_id, plan_id, card_id, payment_type, amount,
           is_renewal, is_active, auto_renewal, start_date, end_date, next_renewal_date,
           gateway_order_id, gateway_payment_id, gateway_subscription_id,
           created_at, updated_at
    FROM subscriptions
"#;

impl PostgresSubscriptionRepository {
    async fn fetch_one(
        &self,
        clause: &str,
        value: &str,
    ) -> Result<Option<Subscription>, DomainError> {
        let row: Option<SubscriptionRow> =
            sqlx::query_as(&format!("{} {}", SELECT_SUBSCRIPTION, clause))
                .bind(value)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| db_error("Failed to fetch subscription", e))?;

        row.map(Subscription::try_from).transpose()
    }
}

#[async_trait]
impl SubscriptionRepository for PostgresSubscriptionRepository {
    async fn insert_superseding(&self, subscription: &Subscription) -> Result<u64, DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| db_error("Failed to start transaction", e))?;

        sqlx::query("SELECT pg_advisory_xact_lock($1, hashtext($2))")
            .bind(SUBSCRIPTION_LOCK_NAMESPACE)
            .bind(subscription.owner_id.as_str())
            .execute(&mut *tx)
            .await
            .map_err(|e| db_error("Failed to lock owner subscriptions", e))?;

        let superseded = sqlx::query(
            r#"
            UPDATE subscriptions SET is_active = FALSE, updated_at = $2
            WHERE owner_id = $1 AND is_active
            "#,
        )
        .bind(subscription.owner_id.as_str())
        .bind(subscription.created_at.as_datetime())
        .execute(&mut *tx)
        .await
        .map_err(|e| db_error("Failed to deactivate subscriptions", e))?
        .rows_affected();

        sqlx::query(
            r#"
            INSERT INTO subscriptions (
                id, owner_id, product_id, plan_id, card_id, payment_type, amount,
                is_renewal, is_active, auto_renewal, start_date, end_date, next_renewal_date,
                gateway_order_id, gateway_payment_id, gateway_subscription_id,
                created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
            "#,
        )
        .bind(subscription.id.as_uuid())
        .bind(subscription.owner_id.as_str())
        .bind(subscription.product_id.as_str())
        .bind(subscription.plan_id.as_str())
        .bind(subscription.card_id.as_uuid())
        .bind(subscription.payment_type.as_str())
        .bind(subscription.amount)
        .bind(subscription.is_renewal)
        .bind(subscription.is_active)
        .bind(subscription.auto_renewal)
        .bind(subscription.start_date.as_datetime())
        .bind(subscription.end_date.as_datetime())
        .bind(subscription.next_renewal_date.as_datetime())
        .bind(&subscription.gateway_order_id)
        .bind(&subscription.gateway_payment_id)
        .bind(&subscription.gateway_subscription_id)
        .bind(subscription.created_at.as_datetime())
        .bind(subscription.updated_at.as_datetime())
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.constraint() == Some("subscriptions_pkey") {
                    return DomainError::conflict(format!(
                        "Subscription already exists: {}",
                        subscription.id
                    ));
                }
            }
            db_error("Failed to insert subscription", e)
        })?;

        tx.commit()
            .await
            .map_err(|e| db_error("Failed to commit transaction", e))?;

        Ok(superseded)
    }

    async fn find_by_id(&self, id: &SubscriptionId) -> Result<Option<Subscription>, DomainError> {
        let row: Option<SubscriptionRow> =
            sqlx::query_as(&format!("{} WHERE id = $1", SELECT_SUBSCRIPTION))
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| db_error("Failed to fetch subscription", e))?;

        row.map(Subscription::try_from).transpose()
    }

    async fn find_active_by_owner(
        &self,
        owner_id: &UserId,
    ) -> Result<Option<Subscription>, DomainError> {
        self.fetch_one("WHERE owner_id = $1 AND is_active", owner_id.as_str())
            .await
    }

    async fn find_by_owner(&self, owner_id: &UserId) -> Result<Vec<Subscription>, DomainError> {
        let rows: Vec<SubscriptionRow> = sqlx::query_as(&format!(
            "{} WHERE owner_id = $1 ORDER BY created_at DESC",
            SELECT_SUBSCRIPTION
        ))
        .bind(owner_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to list subscriptions", e))?;

        rows.into_iter().map(Subscription::try_from).collect()
    }

    async fn find_by_gateway_order_id(
        &self,
        order_id: &str,
    ) -> Result<Option<Subscription>, DomainError> {
        self.fetch_one(
            "WHERE gateway_order_id = $1 ORDER BY created_at DESC LIMIT 1",
            order_id,
        )
        .await
    }

    async fn find_latest_by_gateway_subscription_id(
        &self,
        gateway_subscription_id: &str,
    ) -> Result<Option<Subscription>, DomainError> {
        self.fetch_one(
            "WHERE gateway_subscription_id = $1 ORDER BY created_at DESC LIMIT 1",
            gateway_subscription_id,
        )
        .await
    }

    async fn update_gateway_linkage(&self, subscription: &Subscription) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE subscriptions SET
                gateway_order_id = $2,
                gateway_payment_id = $3,
                gateway_subscription_id = $4,
                updated_at = $5
            WHERE id = $1
            "#,
        )
        .bind(subscription.id.as_uuid())
        .bind(&subscription.gateway_order_id)
        .bind(&subscription.gateway_payment_id)
        .bind(&subscription.gateway_subscription_id)
        .bind(subscription.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to update subscription linkage", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(
                ErrorCode::NotFound,
                format!("Subscription not found: {}", subscription.id),
            ));
        }
        Ok(())
    }

    async fn deactivate(&self, id: &SubscriptionId) -> Result<bool, DomainError> {
        let result = sqlx::query(
            "UPDATE subscriptions SET is_active = FALSE, updated_at = $2 WHERE id = $1 AND is_active",
        )
        .bind(id.as_uuid())
        .bind(Timestamp::now().as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to deactivate subscription", e))?;

        Ok(result.rows_affected() > 0)
    }
}

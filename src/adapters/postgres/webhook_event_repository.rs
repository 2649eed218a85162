//! PostgreSQL webhook idempotency store.
//!
//! Claiming is a single upsert: a new key inserts a `processing` row, and an
//! existing row is taken over only when it failed or its claim went stale.
//! Concurrent deliveries of one key therefore see exactly one `Claimed`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::foundation::{DomainError, ErrorCode, Timestamp};
use crate::ports::{ClaimResult, WebhookEventRecord, WebhookEventRepository, WebhookEventStatus};

use super::db_error;

pub struct PostgresWebhookEventRepository {
    pool: PgPool,
}

impl PostgresWebhookEventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct WebhookEventRow {
    event_id: String,
    event_type: String,
    status: String,
    claimed_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
    message: Option<String>,
}

impl TryFrom<WebhookEventRow> for WebhookEventRecord {
    type Error = DomainError;

    fn try_from(row: WebhookEventRow) -> Result<Self, Self::Error> {
        let status: WebhookEventStatus = row.status.parse().map_err(|e| {
            DomainError::new(ErrorCode::DatabaseError, format!("Invalid status: {}", e))
        })?;

        Ok(WebhookEventRecord {
            event_id: row.event_id,
            event_type: row.event_type,
            status,
            claimed_at: Timestamp::from_datetime(row.claimed_at),
            completed_at: row.completed_at.map(Timestamp::from_datetime),
            message: row.message,
        })
    }
}

fn not_claimed(event_id: &str) -> DomainError {
    DomainError::new(
        ErrorCode::NotFound,
        format!("Webhook event not claimed: {}", event_id),
    )
}

#[async_trait]
impl WebhookEventRepository for PostgresWebhookEventRepository {
    async fn try_claim(
        &self,
        event_id: &str,
        event_type: &str,
        stale_before: Timestamp,
    ) -> Result<ClaimResult, DomainError> {
        let claimed: Option<(String,)> = sqlx::query_as(
            r#"
            INSERT INTO webhook_events (event_id, event_type, status, claimed_at)
            VALUES ($1, $2, 'processing', $4)
            ON CONFLICT (event_id) DO UPDATE SET
                event_type = EXCLUDED.event_type,
                status = 'processing',
                claimed_at = EXCLUDED.claimed_at,
                completed_at = NULL,
                message = NULL
            WHERE webhook_events.status = 'failed'
               OR (webhook_events.status = 'processing' AND webhook_events.claimed_at < $3)
            RETURNING event_id
            "#,
        )
        .bind(event_id)
        .bind(event_type)
        .bind(stale_before.as_datetime())
        .bind(Timestamp::now().as_datetime())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to claim webhook event", e))?;

        if claimed.is_some() {
            return Ok(ClaimResult::Claimed);
        }

        // Lost the upsert: report what holds the key.
        match self.find_by_event_id(event_id).await? {
            Some(record) if record.status.is_final() => Ok(ClaimResult::AlreadyProcessed),
            _ => Ok(ClaimResult::InFlight),
        }
    }

    async fn complete(
        &self,
        event_id: &str,
        status: WebhookEventStatus,
        message: Option<&str>,
    ) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE webhook_events SET status = $2, completed_at = $3, message = $4
            WHERE event_id = $1
            "#,
        )
        .bind(event_id)
        .bind(status.as_str())
        .bind(Timestamp::now().as_datetime())
        .bind(message)
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to complete webhook event", e))?;

        if result.rows_affected() == 0 {
            return Err(not_claimed(event_id));
        }
        Ok(())
    }

    async fn release(&self, event_id: &str, error: &str) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE webhook_events SET status = 'failed', completed_at = $2, message = $3
            WHERE event_id = $1
            "#,
        )
        .bind(event_id)
        .bind(Timestamp::now().as_datetime())
        .bind(error)
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to release webhook event", e))?;

        if result.rows_affected() == 0 {
            return Err(not_claimed(event_id));
        }
        Ok(())
    }

    async fn find_by_event_id(
        &self,
        event_id: &str,
    ) -> Result<Option<WebhookEventRecord>, DomainError> {
        let row: Option<WebhookEventRow> = sqlx::query_as(
            r#"
            SELECT event_id, event_type, status, claimed_at, completed_at, message
            FROM webhook_events WHERE event_id = $1
            "#,
        )
        .bind(event_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to fetch webhook event", e))?;

        row.map(WebhookEventRecord::try_from).transpose()
    }

    async fn delete_before(&self, before: Timestamp) -> Result<u64, DomainError> {
        let result = sqlx::query(
            r#"
            DELETE FROM webhook_events
            WHERE claimed_at < $1 AND status IN ('succeeded', 'ignored')
            "#,
        )
        .bind(before.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to purge webhook events", e))?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_converts_to_record() {
        let record = WebhookEventRecord::try_from(WebhookEventRow {
            event_id: "evt_1".to_string(),
            event_type: "subscription.charged".to_string(),
            status: "ignored".to_string(),
            claimed_at: Utc::now(),
            completed_at: Some(Utc::now()),
            message: Some("no handler".to_string()),
        })
        .unwrap();

        assert_eq!(record.status, WebhookEventStatus::Ignored);
        assert!(record.completed_at.is_some());
    }

    #[test]
    fn unknown_status_is_database_error() {
        let err = WebhookEventRecord::try_from(WebhookEventRow {
            event_id: "evt_1".to_string(),
            event_type: "payment.failed".to_string(),
            status: "done".to_string(),
            claimed_at: Utc::now(),
            completed_at: None,
            message: None,
        })
        .unwrap_err();

        assert_eq!(err.code, ErrorCode::DatabaseError);
    }
}

//! PostgreSQL implementation of CardRepository.
//!
//! The single-default rule is enforced twice: `set_default` clears and sets
//! inside one transaction under a per-owner advisory lock, and the partial
//! unique index `cards_one_default_per_owner` rejects anything that slips by.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::card::{Card, CardBrand};
use crate::domain::foundation::{CardId, DomainError, ErrorCode, Timestamp, UserId};
use crate::ports::CardRepository;

use super::{db_error, CARD_LOCK_NAMESPACE};

/// PostgreSQL implementation of the CardRepository port.
pub struct PostgresCardRepository {
    pool: PgPool,
}

impl PostgresCardRepository {
    /// Creates a new PostgresCardRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of a card.
#[derive(Debug, sqlx::FromRow)]
struct CardRow {
    id: Uuid,
    owner_id: String,
    brand: String,
    last_four_digits: String,
    expiry_month: i32,
    expiry_year: i32,
    holder_name: String,
    is_default: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<CardRow> for Card {
    type Error = DomainError;

    fn try_from(row: CardRow) -> Result<Self, Self::Error> {
        let brand: CardBrand = row.brand.parse().map_err(|e| {
            DomainError::new(ErrorCode::DatabaseError, format!("Invalid brand: {}", e))
        })?;
        let expiry_month = u32::try_from(row.expiry_month).map_err(|_| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Invalid expiry month: {}", row.expiry_month),
            )
        })?;

        Ok(Card {
            id: CardId::from_uuid(row.id),
            owner_id: UserId::new(row.owner_id).map_err(|e| {
                DomainError::new(ErrorCode::DatabaseError, format!("Invalid owner_id: {}", e))
            })?,
            brand,
            last_four_digits: row.last_four_digits,
            expiry_month,
            expiry_year: row.expiry_year,
            holder_name: row.holder_name,
            is_default: row.is_default,
            created_at: Timestamp::from_datetime(row.created_at),
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

const SELECT_CARD: &str = r#"
    SELECT id, owner_id, brand, last_four_digits, expiry_month, expiry_year,
           holder_name, is_default, created_at, updated_at
    FROM cards
"#;

#[async_trait]
impl CardRepository for PostgresCardRepository {
    async fn insert(&self, card: &Card) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            INSERT INTO cards (
                id, owner_id, brand, last_four_digits, expiry_month, expiry_year,
                holder_name, is_default, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(card.id.as_uuid())
        .bind(card.owner_id.as_str())
        .bind(card.brand.as_str())
        .bind(&card.last_four_digits)
        .bind(card.expiry_month as i32)
        .bind(card.expiry_year)
        .bind(&card.holder_name)
        .bind(card.is_default)
        .bind(card.created_at.as_datetime())
        .bind(card.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.constraint() == Some("cards_owner_last_four_key") {
                    return DomainError::conflict("Card already registered for owner")
                        .with_detail("last_four", card.last_four_digits.clone());
                }
            }
            db_error("Failed to insert card", e)
        })?;

        Ok(())
    }

    async fn update(&self, card: &Card) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE cards SET
                holder_name = $2,
                expiry_month = $3,
                expiry_year = $4,
                updated_at = $5
            WHERE id = $1
            "#,
        )
        .bind(card.id.as_uuid())
        .bind(&card.holder_name)
        .bind(card.expiry_month as i32)
        .bind(card.expiry_year)
        .bind(card.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to update card", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(
                ErrorCode::NotFound,
                format!("Card not found: {}", card.id),
            ));
        }
        Ok(())
    }

    async fn find_by_id(&self, id: &CardId) -> Result<Option<Card>, DomainError> {
        let row: Option<CardRow> = sqlx::query_as(&format!("{} WHERE id = $1", SELECT_CARD))
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("Failed to fetch card", e))?;

        row.map(Card::try_from).transpose()
    }

    async fn find_by_owner(&self, owner_id: &UserId) -> Result<Vec<Card>, DomainError> {
        let rows: Vec<CardRow> = sqlx::query_as(&format!(
            "{} WHERE owner_id = $1 ORDER BY is_default DESC, created_at DESC",
            SELECT_CARD
        ))
        .bind(owner_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to list cards", e))?;

        rows.into_iter().map(Card::try_from).collect()
    }

    async fn set_default(&self, owner_id: &UserId, card_id: &CardId) -> Result<bool, DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| db_error("Failed to start transaction", e))?;

        sqlx::query("SELECT pg_advisory_xact_lock($1, hashtext($2))")
            .bind(CARD_LOCK_NAMESPACE)
            .bind(owner_id.as_str())
            .execute(&mut *tx)
            .await
            .map_err(|e| db_error("Failed to lock owner cards", e))?;

        let owned: Option<(Uuid,)> =
            sqlx::query_as("SELECT id FROM cards WHERE id = $1 AND owner_id = $2")
                .bind(card_id.as_uuid())
                .bind(owner_id.as_str())
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| db_error("Failed to fetch card", e))?;

        if owned.is_none() {
            return Ok(false);
        }

        let now = Timestamp::now();
        sqlx::query(
            r#"
            UPDATE cards SET is_default = FALSE, updated_at = $3
            WHERE owner_id = $1 AND is_default AND id <> $2
            "#,
        )
        .bind(owner_id.as_str())
        .bind(card_id.as_uuid())
        .bind(now.as_datetime())
        .execute(&mut *tx)
        .await
        .map_err(|e| db_error("Failed to clear default card", e))?;

        sqlx::query(
            "UPDATE cards SET is_default = TRUE, updated_at = $2 WHERE id = $1 AND NOT is_default",
        )
        .bind(card_id.as_uuid())
        .bind(now.as_datetime())
        .execute(&mut *tx)
        .await
        .map_err(|e| db_error("Failed to set default card", e))?;

        tx.commit()
            .await
            .map_err(|e| db_error("Failed to commit transaction", e))?;

        Ok(true)
    }

    async fn delete(&self, card_id: &CardId, owner_id: &UserId) -> Result<bool, DomainError> {
        let result = sqlx::query("DELETE FROM cards WHERE id = $1 AND owner_id = $2")
            .bind(card_id.as_uuid())
            .bind(owner_id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("Failed to delete card", e))?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_all_for_owner(&self, owner_id: &UserId) -> Result<u64, DomainError> {
        let result = sqlx::query("DELETE FROM cards WHERE owner_id = $1")
            .bind(owner_id.as_str())
            .execute(&self.pool)
            .await
            .map_err(|e| db_error("Failed to delete cards", e))?;

        Ok(result.rows_affected())
    }
}

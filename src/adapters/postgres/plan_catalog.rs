//! PostgreSQL implementation of PlanCatalog.

use async_trait::async_trait;
use sqlx::PgPool;
use std::collections::HashMap;

use crate::domain::billing::{Plan, PlanAttribute, Product};
use crate::domain::foundation::{DomainError, ErrorCode, PlanId, ProductId, ValidationError};
use crate::ports::PlanCatalog;

use super::db_error;

/// Read-only catalog queries.
pub struct PostgresPlanCatalog {
    pool: PgPool,
}

impl PostgresPlanCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Loads attributes for the given plans, grouped by plan id.
    async fn attributes_for(
        &self,
        plan_ids: &[String],
    ) -> Result<HashMap<String, Vec<PlanAttribute>>, DomainError> {
        let rows: Vec<AttributeRow> = sqlx::query_as(
            r#"
            SELECT plan_id, name, value FROM plan_attributes
            WHERE plan_id = ANY($1)
            ORDER BY plan_id, position
            "#,
        )
        .bind(plan_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to fetch plan attributes", e))?;

        let mut grouped: HashMap<String, Vec<PlanAttribute>> = HashMap::new();
        for row in rows {
            grouped.entry(row.plan_id).or_default().push(PlanAttribute {
                name: row.name,
                value: row.value,
            });
        }
        Ok(grouped)
    }

    async fn with_attributes(&self, rows: Vec<PlanRow>) -> Result<Vec<Plan>, DomainError> {
        let ids: Vec<String> = rows.iter().map(|r| r.id.clone()).collect();
        let mut attributes = self.attributes_for(&ids).await?;

        rows.into_iter()
            .map(|row| {
                let attrs = attributes.remove(&row.id).unwrap_or_default();
                row.into_plan(attrs)
            })
            .collect()
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PlanRow {
    id: String,
    product_id: String,
    name: String,
    price_monthly: i64,
    price_yearly: i64,
}

impl PlanRow {
    fn into_plan(self, attributes: Vec<PlanAttribute>) -> Result<Plan, DomainError> {
        let invalid = |e: ValidationError| {
            DomainError::new(ErrorCode::DatabaseError, format!("Invalid plan row: {}", e))
        };
        Ok(Plan {
            id: PlanId::new(self.id).map_err(invalid)?,
            product_id: ProductId::new(self.product_id).map_err(invalid)?,
            name: self.name,
            price_monthly: self.price_monthly,
            price_yearly: self.price_yearly,
            attributes,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct AttributeRow {
    plan_id: String,
    name: String,
    value: String,
}

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: String,
    name: String,
    description: Option<String>,
}

impl TryFrom<ProductRow> for Product {
    type Error = DomainError;

    fn try_from(row: ProductRow) -> Result<Self, Self::Error> {
        Ok(Product {
            id: ProductId::new(row.id).map_err(|e| {
                DomainError::new(ErrorCode::DatabaseError, format!("Invalid product id: {}", e))
            })?,
            name: row.name,
            description: row.description,
        })
    }
}

#[async_trait]
impl PlanCatalog for PostgresPlanCatalog {
    async fn list_plans(&self, product_id: Option<&ProductId>) -> Result<Vec<Plan>, DomainError> {
        let rows: Vec<PlanRow> = sqlx::query_as(
            r#"
            SELECT id, product_id, name, price_monthly, price_yearly FROM plans
            WHERE $1::TEXT IS NULL OR product_id = $1
            ORDER BY price_monthly, id
            "#,
        )
        .bind(product_id.map(|p| p.as_str()))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to list plans", e))?;

        self.with_attributes(rows).await
    }

    async fn find_plan(&self, plan_id: &PlanId) -> Result<Option<Plan>, DomainError> {
        let row: Option<PlanRow> = sqlx::query_as(
            "SELECT id, product_id, name, price_monthly, price_yearly FROM plans WHERE id = $1",
        )
        .bind(plan_id.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to fetch plan", e))?;

        match row {
            Some(row) => Ok(self.with_attributes(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn find_product(&self, product_id: &ProductId) -> Result<Option<Product>, DomainError> {
        let row: Option<ProductRow> =
            sqlx::query_as("SELECT id, name, description FROM products WHERE id = $1")
                .bind(product_id.as_str())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| db_error("Failed to fetch product", e))?;

        row.map(Product::try_from).transpose()
    }

    async fn list_products(&self) -> Result<Vec<Product>, DomainError> {
        let rows: Vec<ProductRow> =
            sqlx::query_as("SELECT id, name, description FROM products ORDER BY name")
                .fetch_all(&self.pool)
                .await
                .map_err(|e| db_error("Failed to list products", e))?;

        rows.into_iter().map(Product::try_from).collect()
    }
}

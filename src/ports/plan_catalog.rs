//! Plan catalog port (read-only).
//!
//! The catalog is owned elsewhere; the billing engine only reads it.

use async_trait::async_trait;

use crate::domain::billing::{Plan, Product};
use crate::domain::foundation::{DomainError, PlanId, ProductId};

#[async_trait]
pub trait PlanCatalog: Send + Sync {
    /// Plans with attributes, optionally limited to one product.
    async fn list_plans(&self, product_id: Option<&ProductId>) -> Result<Vec<Plan>, DomainError>;

    /// A plan with its attributes. Returns `None` if not found.
    async fn find_plan(&self, plan_id: &PlanId) -> Result<Option<Plan>, DomainError>;

    /// Returns `None` if not found.
    async fn find_product(&self, product_id: &ProductId) -> Result<Option<Product>, DomainError>;

    async fn list_products(&self) -> Result<Vec<Product>, DomainError>;
}

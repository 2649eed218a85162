//! Catalog queries.

use std::sync::Arc;

use crate::domain::billing::{Plan, Product, SubscriptionError};
use crate::domain::foundation::ProductId;
use crate::ports::PlanCatalog;

#[derive(Debug, Clone, Default)]
pub struct ListPlansQuery {
    /// Restrict to one product.
    pub product_id: Option<ProductId>,
}

/// Lists plans with their attributes.
pub struct ListPlansHandler {
    catalog: Arc<dyn PlanCatalog>,
}

impl ListPlansHandler {
    pub fn new(catalog: Arc<dyn PlanCatalog>) -> Self {
        Self { catalog }
    }

    pub async fn handle(&self, query: ListPlansQuery) -> Result<Vec<Plan>, SubscriptionError> {
        Ok(self.catalog.list_plans(query.product_id.as_ref()).await?)
    }
}

#[derive(Debug, Clone)]
pub struct GetProductQuery {
    pub product_id: ProductId,
}

pub struct GetProductHandler {
    catalog: Arc<dyn PlanCatalog>,
}

impl GetProductHandler {
    pub fn new(catalog: Arc<dyn PlanCatalog>) -> Self {
        Self { catalog }
    }

    pub async fn handle(&self, query: GetProductQuery) -> Result<Option<Product>, SubscriptionError> {
        Ok(self.catalog.find_product(&query.product_id).await?)
    }
}

pub struct ListProductsHandler {
    catalog: Arc<dyn PlanCatalog>,
}

impl ListProductsHandler {
    pub fn new(catalog: Arc<dyn PlanCatalog>) -> Self {
        Self { catalog }
    }

    pub async fn handle(&self) -> Result<Vec<Product>, SubscriptionError> {
        Ok(self.catalog.list_products().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryPlanCatalog;
    use crate::domain::foundation::PlanId;

    fn plan(id: &str, product: &str, monthly: i64) -> Plan {
        Plan {
            id: PlanId::new(id).unwrap(),
            product_id: ProductId::new(product).unwrap(),
            name: id.to_uppercase(),
            price_monthly: monthly,
            price_yearly: monthly * 10,
            attributes: Vec::new(),
        }
    }

    fn catalog() -> Arc<InMemoryPlanCatalog> {
        Arc::new(
            InMemoryPlanCatalog::new()
                .with_product(Product {
                    id: ProductId::new("prod-1").unwrap(),
                    name: "Clinic Suite".to_string(),
                    description: Some("Scheduling and billing".to_string()),
                })
                .with_plan(plan("plan-001", "prod-1", 49_900))
                .with_plan(plan("plan-002", "prod-1", 99_900))
                .with_plan(plan("plan-003", "prod-2", 19_900)),
        )
    }

    #[tokio::test]
    async fn lists_all_plans_without_filter() {
        let handler = ListPlansHandler::new(catalog());

        let plans = handler.handle(ListPlansQuery::default()).await.unwrap();

        assert_eq!(plans.len(), 3);
    }

    #[tokio::test]
    async fn filters_plans_by_product() {
        let handler = ListPlansHandler::new(catalog());

        let plans = handler
            .handle(ListPlansQuery {
                product_id: Some(ProductId::new("prod-1").unwrap()),
            })
            .await
            .unwrap();

        assert_eq!(plans.len(), 2);
        assert!(plans.iter().all(|p| p.product_id.as_str() == "prod-1"));
    }

    #[tokio::test]
    async fn gets_product_or_none() {
        let handler = GetProductHandler::new(catalog());

        let found = handler
            .handle(GetProductQuery {
                product_id: ProductId::new("prod-1").unwrap(),
            })
            .await
            .unwrap();
        assert_eq!(found.unwrap().name, "Clinic Suite");

        let missing = handler
            .handle(GetProductQuery {
                product_id: ProductId::new("prod-9").unwrap(),
            })
            .await
            .unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn lists_products() {
        let handler = ListProductsHandler::new(catalog());

        let products = handler.handle().await.unwrap();

        assert_eq!(products.len(), 1);
        assert_eq!(products[0].id.as_str(), "prod-1");
    }
}

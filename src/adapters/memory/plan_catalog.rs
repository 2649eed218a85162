//! In-memory plan catalog seeded at construction.

use async_trait::async_trait;

use crate::domain::billing::{Plan, Product};
use crate::domain::foundation::{DomainError, PlanId, ProductId};
use crate::ports::PlanCatalog;

/// Read-only catalog built with `with_product` / `with_plan`.
#[derive(Debug, Clone, Default)]
pub struct InMemoryPlanCatalog {
    products: Vec<Product>,
    plans: Vec<Plan>,
}

impl InMemoryPlanCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_product(mut self, product: Product) -> Self {
        self.products.push(product);
        self
    }

    pub fn with_plan(mut self, plan: Plan) -> Self {
        self.plans.push(plan);
        self
    }
}

#[async_trait]
impl PlanCatalog for InMemoryPlanCatalog {
    async fn list_plans(&self, product_id: Option<&ProductId>) -> Result<Vec<Plan>, DomainError> {
        Ok(self
            .plans
            .iter()
            .filter(|p| product_id.map_or(true, |id| &p.product_id == id))
            .cloned()
            .collect())
    }

    async fn find_plan(&self, plan_id: &PlanId) -> Result<Option<Plan>, DomainError> {
        Ok(self.plans.iter().find(|p| &p.id == plan_id).cloned())
    }

    async fn find_product(&self, product_id: &ProductId) -> Result<Option<Product>, DomainError> {
        Ok(self.products.iter().find(|p| &p.id == product_id).cloned())
    }

    async fn list_products(&self) -> Result<Vec<Product>, DomainError> {
        Ok(self.products.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::billing::PlanAttribute;

    fn plan(id: &str, product: &str) -> Plan {
        Plan {
            id: PlanId::new(id).unwrap(),
            product_id: ProductId::new(product).unwrap(),
            name: id.to_uppercase(),
            price_monthly: 100,
            price_yearly: 1_000,
            attributes: vec![PlanAttribute {
                name: "Seats".to_string(),
                value: "5".to_string(),
            }],
        }
    }

    #[tokio::test]
    async fn list_plans_filters_by_product() {
        let catalog = InMemoryPlanCatalog::new()
            .with_plan(plan("plan-001", "prod-1"))
            .with_plan(plan("plan-002", "prod-2"));

        assert_eq!(catalog.list_plans(None).await.unwrap().len(), 2);

        let filtered = catalog
            .list_plans(Some(&ProductId::new("prod-2").unwrap()))
            .await
            .unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].id.as_str(), "plan-002");
    }

    #[tokio::test]
    async fn find_plan_keeps_attributes() {
        let catalog = InMemoryPlanCatalog::new().with_plan(plan("plan-001", "prod-1"));
        let found = catalog
            .find_plan(&PlanId::new("plan-001").unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.attributes.len(), 1);
        assert!(catalog
            .find_plan(&PlanId::new("plan-404").unwrap())
            .await
            .unwrap()
            .is_none());
    }
}

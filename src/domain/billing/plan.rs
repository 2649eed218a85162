//! Read-only catalog reference data.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{PlanId, ProductId};

use super::PaymentType;

/// A feature line shown alongside a plan (e.g. "Seats" = "5").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanAttribute {
    pub name: String,
    pub value: String,
}

/// A purchasable plan. Prices are in minor currency units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Plan {
    pub id: PlanId,
    pub product_id: ProductId,
    pub name: String,
    pub price_monthly: i64,
    pub price_yearly: i64,
    pub attributes: Vec<PlanAttribute>,
}

impl Plan {
    /// Price charged for one period of the given cadence.
    pub fn price_for(&self, payment_type: PaymentType) -> i64 {
        match payment_type {
            PaymentType::Monthly => self.price_monthly,
            PaymentType::Yearly => self.price_yearly,
        }
    }
}

/// Product a plan belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: Option<String>,
}

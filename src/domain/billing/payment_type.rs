//! Billing cadence of a subscription.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::Timestamp;

/// How often a subscription is billed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentType {
    Monthly,
    Yearly,
}

impl PaymentType {
    /// End of a billing period that starts at `start`.
    pub fn period_end(&self, start: Timestamp) -> Timestamp {
        match self {
            PaymentType::Monthly => start.add_months(1),
            PaymentType::Yearly => start.add_years(1),
        }
    }

    /// Number of charges a gateway-side recurring subscription is created for.
    pub fn gateway_billing_cycles(&self) -> u32 {
        match self {
            PaymentType::Monthly => 12,
            PaymentType::Yearly => 1,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentType::Monthly => "monthly",
            PaymentType::Yearly => "yearly",
        }
    }
}

impl fmt::Display for PaymentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised for anything other than `monthly` or `yearly`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidPaymentType(pub String);

impl fmt::Display for InvalidPaymentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid payment type '{}'", self.0)
    }
}

impl std::error::Error for InvalidPaymentType {}

impl FromStr for PaymentType {
    type Err = InvalidPaymentType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "monthly" => Ok(PaymentType::Monthly),
            "yearly" => Ok(PaymentType::Yearly),
            other => Err(InvalidPaymentType(other.to_string())),
        }
    }
}

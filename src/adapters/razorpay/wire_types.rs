//! Razorpay REST request bodies and error envelope.
//!
//! Response bodies deserialize straight into the port types, which only
//! name the fields the engine reads.

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub(super) struct OrderBody<'a> {
    pub amount: i64,
    pub currency: &'a str,
    pub receipt: &'a str,
}

#[derive(Debug, Serialize)]
pub(super) struct CustomerBody<'a> {
    pub name: &'a str,
    pub email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact: Option<&'a str>,
    /// "0" returns the existing customer for a known email/contact
    /// instead of failing.
    pub fail_existing: &'static str,
}

#[derive(Debug, Serialize)]
pub(super) struct SubscriptionBody<'a> {
    pub plan_id: &'a str,
    pub customer_id: &'a str,
    pub total_count: u32,
    pub customer_notify: u8,
}

#[derive(Debug, Serialize)]
pub(super) struct CancelBody {
    pub cancel_at_cycle_end: u8,
}

/// `{"error": {"code": "...", "description": "..."}}`
#[derive(Debug, Deserialize)]
pub(super) struct ErrorEnvelope {
    pub error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
pub(super) struct ErrorDetail {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

//! Subscription aggregate entity.
//!
//! Each billing period is its own record. Renewing never extends a record in
//! place: it creates a new record (`is_renewal = true`) which supersedes the
//! owner's current active one.
//!
//! # Invariants
//!
//! - at most one record per owner has `is_active = true`
//! - `owner_id`, `plan_id` and `card_id` never change after creation
//! - `start_date <= end_date`, and `next_renewal_date == end_date` at creation
//!
//! `is_active` is only ever cleared through the repository's conditional
//! deactivation or the superseding insert, never by mutating a loaded copy.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{
    CardId, OwnedByUser, PlanId, ProductId, SubscriptionId, Timestamp, UserId,
};

use super::PaymentType;

/// Term used by an explicit renewal request.
///
/// Manual renewal always extends by one month, whatever cadence the
/// renewed record was billed at.
pub const MANUAL_RENEWAL_TERM: PaymentType = PaymentType::Monthly;

/// A subscription record for one billing period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: SubscriptionId,
    pub owner_id: UserId,
    pub product_id: ProductId,
    pub plan_id: PlanId,
    pub card_id: CardId,
    pub payment_type: PaymentType,

    /// Amount in minor currency units.
    pub amount: i64,

    pub is_renewal: bool,
    pub is_active: bool,
    pub auto_renewal: bool,
    pub start_date: Timestamp,
    pub end_date: Timestamp,
    pub next_renewal_date: Timestamp,

    pub gateway_order_id: Option<String>,
    pub gateway_payment_id: Option<String>,
    pub gateway_subscription_id: Option<String>,

    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Fields a caller chooses when starting a subscription.
#[derive(Debug, Clone)]
pub struct NewSubscription {
    pub owner_id: UserId,
    pub product_id: ProductId,
    pub plan_id: PlanId,
    pub card_id: CardId,
    pub payment_type: PaymentType,
    pub amount: i64,
    pub auto_renewal: bool,
}

impl Subscription {
    /// Starts a new active subscription whose first period begins at `now`.
    pub fn start(new: NewSubscription, now: Timestamp) -> Self {
        let end_date = new.payment_type.period_end(now);
        Self {
            id: SubscriptionId::new(),
            owner_id: new.owner_id,
            product_id: new.product_id,
            plan_id: new.plan_id,
            card_id: new.card_id,
            payment_type: new.payment_type,
            amount: new.amount,
            is_renewal: false,
            is_active: true,
            auto_renewal: new.auto_renewal,
            start_date: now,
            end_date,
            next_renewal_date: end_date,
            gateway_order_id: None,
            gateway_payment_id: None,
            gateway_subscription_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Links a one-time gateway order.
    pub fn with_gateway_order(mut self, order_id: impl Into<String>) -> Self {
        self.gateway_order_id = Some(order_id.into());
        self
    }

    /// Links a gateway-side recurring subscription.
    pub fn with_gateway_subscription(mut self, subscription_id: impl Into<String>) -> Self {
        self.gateway_subscription_id = Some(subscription_id.into());
        self
    }

    /// Renewal requested by the owner.
    ///
    /// A local continuation one month long. A gateway subscription link is
    /// carried over so stopping the new record still cancels gateway billing.
    pub fn manual_renewal(&self, now: Timestamp) -> Self {
        let mut next = self.renewal(MANUAL_RENEWAL_TERM.period_end(now), now);
        next.gateway_subscription_id = self.gateway_subscription_id.clone();
        next
    }

    /// Renewal reported by the gateway charging the recurring subscription.
    ///
    /// The new period follows this record's own cadence and keeps the
    /// gateway subscription link so later events still find it.
    pub fn gateway_renewal(&self, now: Timestamp) -> Self {
        let mut next = self.renewal(self.payment_type.period_end(now), now);
        next.gateway_subscription_id = self.gateway_subscription_id.clone();
        next
    }

    fn renewal(&self, end_date: Timestamp, now: Timestamp) -> Self {
        Self {
            id: SubscriptionId::new(),
            owner_id: self.owner_id.clone(),
            product_id: self.product_id.clone(),
            plan_id: self.plan_id.clone(),
            card_id: self.card_id,
            payment_type: self.payment_type,
            amount: self.amount,
            is_renewal: true,
            is_active: true,
            auto_renewal: self.auto_renewal,
            start_date: now,
            end_date,
            next_renewal_date: end_date,
            gateway_order_id: None,
            gateway_payment_id: None,
            gateway_subscription_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Records the gateway payment id.
    ///
    /// Returns false when the same payment was already attached.
    pub fn attach_payment(&mut self, payment_id: impl Into<String>) -> bool {
        let payment_id = payment_id.into();
        if self.gateway_payment_id.as_deref() == Some(payment_id.as_str()) {
            return false;
        }
        self.gateway_payment_id = Some(payment_id);
        self.updated_at = Timestamp::now();
        true
    }
}

impl OwnedByUser for Subscription {
    fn owner_id(&self) -> &UserId {
        &self.owner_id
    }
}

/// A subscription with display data from the catalog and card registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubscriptionDetails {
    #[serde(flatten)]
    pub subscription: Subscription,
    pub plan_name: Option<String>,
    pub product_name: Option<String>,
    pub card_last_four: Option<String>,
}

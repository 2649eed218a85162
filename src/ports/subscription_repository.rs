//! Subscription repository port.
//!
//! # Atomic operations
//!
//! - `insert_superseding` deactivates the owner's active record and inserts
//!   the new one in a single transaction
//! - `deactivate` is a conditional update (`WHERE id = $1 AND is_active`);
//!   when an API stop and a gateway cancellation race, exactly one of them
//!   reports `true` and the other is a silent no-op
//!
//! Linkage updates never touch `is_active`.

use async_trait::async_trait;

use crate::domain::billing::Subscription;
use crate::domain::foundation::{DomainError, SubscriptionId, UserId};

/// Repository port for subscription records.
#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// Insert an active record, deactivating the owner's current active one
    /// in the same transaction.
    ///
    /// Returns how many records were superseded (0 or 1).
    async fn insert_superseding(&self, subscription: &Subscription) -> Result<u64, DomainError>;

    /// Find a record by id. Returns `None` if not found.
    async fn find_by_id(&self, id: &SubscriptionId) -> Result<Option<Subscription>, DomainError>;

    /// The owner's active record, if any.
    async fn find_active_by_owner(
        &self,
        owner_id: &UserId,
    ) -> Result<Option<Subscription>, DomainError>;

    /// Every record of the owner, newest first.
    async fn find_by_owner(&self, owner_id: &UserId) -> Result<Vec<Subscription>, DomainError>;

    /// Record created with the given one-time gateway order.
    async fn find_by_gateway_order_id(
        &self,
        order_id: &str,
    ) -> Result<Option<Subscription>, DomainError>;

    /// Newest record linked to the given gateway subscription.
    ///
    /// Renewals copy the link, so several records can share it.
    async fn find_latest_by_gateway_subscription_id(
        &self,
        gateway_subscription_id: &str,
    ) -> Result<Option<Subscription>, DomainError>;

    /// Persist gateway ids and `next_renewal_date`.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the record does not exist
    async fn update_gateway_linkage(&self, subscription: &Subscription) -> Result<(), DomainError>;

    /// Set `is_active = false` if the record is currently active.
    ///
    /// Returns `false` if it was already inactive or does not exist.
    async fn deactivate(&self, id: &SubscriptionId) -> Result<bool, DomainError>;
}

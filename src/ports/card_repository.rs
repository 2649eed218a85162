//! Card repository port.
//!
//! # Atomic operations
//!
//! `set_default` clears every default flag of the owner and sets the target
//! in one transaction. Readers never observe zero or two defaults while it
//! runs. `insert` relies on a uniqueness guard on `(owner_id, last_four)` so
//! that two concurrent registrations of the same card cannot both succeed.

use async_trait::async_trait;

use crate::domain::card::Card;
use crate::domain::foundation::{CardId, DomainError, UserId};

/// Repository port for stored cards.
#[async_trait]
pub trait CardRepository: Send + Sync {
    /// Insert a new card.
    ///
    /// # Errors
    ///
    /// - `Conflict` if the owner already has a card with the same last four
    /// - `DatabaseError` on persistence failure
    async fn insert(&self, card: &Card) -> Result<(), DomainError>;

    /// Persist changed holder name and expiry.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the card no longer exists
    /// - `DatabaseError` on persistence failure
    async fn update(&self, card: &Card) -> Result<(), DomainError>;

    /// Find a card by id. Returns `None` if not found.
    async fn find_by_id(&self, id: &CardId) -> Result<Option<Card>, DomainError>;

    /// All cards of an owner, default first, then newest first.
    async fn find_by_owner(&self, owner_id: &UserId) -> Result<Vec<Card>, DomainError>;

    /// Make `card_id` the owner's only default card.
    ///
    /// Returns `false` (and changes nothing) if the card does not exist or
    /// belongs to someone else.
    async fn set_default(&self, owner_id: &UserId, card_id: &CardId) -> Result<bool, DomainError>;

    /// Delete one card of the owner. Returns `false` if nothing matched.
    async fn delete(&self, card_id: &CardId, owner_id: &UserId) -> Result<bool, DomainError>;

    /// Delete every card of the owner. Returns the number removed.
    async fn delete_all_for_owner(&self, owner_id: &UserId) -> Result<u64, DomainError>;
}

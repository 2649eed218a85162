//! In-memory implementation of CardRepository.
//!
//! Every compound operation runs under a single write lock, so readers never
//! observe an owner with two default cards or a half-applied default switch.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::card::Card;
use crate::domain::foundation::{CardId, DomainError, ErrorCode, Timestamp, UserId};
use crate::ports::CardRepository;

/// Card storage backed by a shared map.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCardRepository {
    cards: Arc<RwLock<HashMap<CardId, Card>>>,
}

impl InMemoryCardRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored cards across all owners.
    pub async fn len(&self) -> usize {
        self.cards.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.cards.read().await.is_empty()
    }
}

#[async_trait]
impl CardRepository for InMemoryCardRepository {
    async fn insert(&self, card: &Card) -> Result<(), DomainError> {
        let mut cards = self.cards.write().await;

        let duplicate = cards.values().any(|existing| {
            existing.owner_id == card.owner_id && existing.last_four_digits == card.last_four_digits
        });
        if duplicate || cards.contains_key(&card.id) {
            return Err(DomainError::conflict("Card already registered for owner")
                .with_detail("last_four", card.last_four_digits.clone()));
        }

        cards.insert(card.id, card.clone());
        Ok(())
    }

    async fn update(&self, card: &Card) -> Result<(), DomainError> {
        let mut cards = self.cards.write().await;
        match cards.get_mut(&card.id) {
            Some(stored) => {
                // Default flag only moves through set_default.
                let is_default = stored.is_default;
                *stored = card.clone();
                stored.is_default = is_default;
                Ok(())
            }
            None => Err(DomainError::new(
                ErrorCode::NotFound,
                format!("Card not found: {}", card.id),
            )),
        }
    }

    async fn find_by_id(&self, id: &CardId) -> Result<Option<Card>, DomainError> {
        Ok(self.cards.read().await.get(id).cloned())
    }

    async fn find_by_owner(&self, owner_id: &UserId) -> Result<Vec<Card>, DomainError> {
        let cards = self.cards.read().await;
        let mut owned: Vec<Card> = cards
            .values()
            .filter(|c| &c.owner_id == owner_id)
            .cloned()
            .collect();
        owned.sort_by(|a, b| {
            b.is_default
                .cmp(&a.is_default)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        Ok(owned)
    }

    async fn set_default(&self, owner_id: &UserId, card_id: &CardId) -> Result<bool, DomainError> {
        let mut cards = self.cards.write().await;

        let owns_target = cards
            .get(card_id)
            .map(|c| &c.owner_id == owner_id)
            .unwrap_or(false);
        if !owns_target {
            return Ok(false);
        }

        let now = Timestamp::now();
        for card in cards.values_mut().filter(|c| &c.owner_id == owner_id) {
            let should_be_default = &card.id == card_id;
            if card.is_default != should_be_default {
                card.is_default = should_be_default;
                card.updated_at = now;
            }
        }
        Ok(true)
    }

    async fn delete(&self, card_id: &CardId, owner_id: &UserId) -> Result<bool, DomainError> {
        let mut cards = self.cards.write().await;
        match cards.get(card_id) {
            Some(card) if &card.owner_id == owner_id => {
                cards.remove(card_id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete_all_for_owner(&self, owner_id: &UserId) -> Result<u64, DomainError> {
        let mut cards = self.cards.write().await;
        let before = cards.len();
        cards.retain(|_, c| &c.owner_id != owner_id);
        Ok((before - cards.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::card::{CardBrand, CardFacts};
    use proptest::prelude::*;

    fn user(id: &str) -> UserId {
        UserId::new(id).unwrap()
    }

    fn card(owner: &str, last_four: &str) -> Card {
        Card::register(
            user(owner),
            CardFacts {
                brand: CardBrand::Visa,
                last_four: last_four.to_string(),
            },
            "Asha Rao",
            12,
            2030,
        )
    }

    #[tokio::test]
    async fn insert_rejects_same_last_four_for_owner() {
        let repo = InMemoryCardRepository::new();
        repo.insert(&card("user-1", "1111")).await.unwrap();

        let err = repo.insert(&card("user-1", "1111")).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::Conflict);

        // Other owners may hold the same suffix.
        repo.insert(&card("user-2", "1111")).await.unwrap();
        assert_eq!(repo.len().await, 2);
    }

    #[tokio::test]
    async fn update_of_missing_card_is_not_found() {
        let repo = InMemoryCardRepository::new();
        let err = repo.update(&card("user-1", "1111")).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn set_default_moves_the_flag() {
        let repo = InMemoryCardRepository::new();
        let first = card("user-1", "1111");
        let second = card("user-1", "2222");
        repo.insert(&first).await.unwrap();
        repo.insert(&second).await.unwrap();

        assert!(repo.set_default(&user("user-1"), &first.id).await.unwrap());
        assert!(repo.set_default(&user("user-1"), &second.id).await.unwrap());

        let cards = repo.find_by_owner(&user("user-1")).await.unwrap();
        assert_eq!(cards[0].id, second.id);
        assert!(cards[0].is_default);
        assert!(!cards[1].is_default);
    }

    #[tokio::test]
    async fn set_default_ignores_foreign_card() {
        let repo = InMemoryCardRepository::new();
        let theirs = card("user-2", "1111");
        repo.insert(&theirs).await.unwrap();

        assert!(!repo.set_default(&user("user-1"), &theirs.id).await.unwrap());
        assert!(!repo.find_by_id(&theirs.id).await.unwrap().unwrap().is_default);
    }

    #[tokio::test]
    async fn update_does_not_touch_default_flag() {
        let repo = InMemoryCardRepository::new();
        let mut stored = card("user-1", "1111");
        repo.insert(&stored).await.unwrap();
        repo.set_default(&user("user-1"), &stored.id).await.unwrap();

        stored.update_details("New Name", 1, 2031);
        repo.update(&stored).await.unwrap();

        let reloaded = repo.find_by_id(&stored.id).await.unwrap().unwrap();
        assert!(reloaded.is_default);
        assert_eq!(reloaded.holder_name, "New Name");
    }

    #[tokio::test]
    async fn delete_requires_owner() {
        let repo = InMemoryCardRepository::new();
        let stored = card("user-1", "1111");
        repo.insert(&stored).await.unwrap();

        assert!(!repo.delete(&stored.id, &user("user-2")).await.unwrap());
        assert!(repo.delete(&stored.id, &user("user-1")).await.unwrap());
        assert!(repo.is_empty().await);
    }

    #[tokio::test]
    async fn delete_all_is_scoped_to_owner() {
        let repo = InMemoryCardRepository::new();
        repo.insert(&card("user-1", "1111")).await.unwrap();
        repo.insert(&card("user-1", "2222")).await.unwrap();
        repo.insert(&card("user-2", "3333")).await.unwrap();

        assert_eq!(repo.delete_all_for_owner(&user("user-1")).await.unwrap(), 2);
        assert_eq!(repo.len().await, 1);
    }

    proptest! {
        #[test]
        fn at_most_one_default_after_any_sequence(picks in prop::collection::vec(0usize..4, 1..20)) {
            let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
            rt.block_on(async {
                let repo = InMemoryCardRepository::new();
                let mut ids = Vec::new();
                for suffix in ["1111", "2222", "3333", "4444"] {
                    let c = card("user-1", suffix);
                    ids.push(c.id);
                    repo.insert(&c).await.unwrap();
                }

                for pick in picks {
                    repo.set_default(&user("user-1"), &ids[pick]).await.unwrap();
                    let defaults = repo
                        .find_by_owner(&user("user-1"))
                        .await
                        .unwrap()
                        .iter()
                        .filter(|c| c.is_default)
                        .count();
                    assert_eq!(defaults, 1);
                }
            });
        }
    }
}

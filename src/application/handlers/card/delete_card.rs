//! DeleteCardHandler and DeleteAllCardsHandler - Card removal.

use std::sync::Arc;

use crate::domain::card::CardError;
use crate::domain::foundation::{CardId, OwnedByUser, UserId};
use crate::ports::CardRepository;

/// Command to delete one card.
#[derive(Debug, Clone)]
pub struct DeleteCardCommand {
    pub card_id: CardId,
    pub owner_id: UserId,
}

pub struct DeleteCardHandler {
    cards: Arc<dyn CardRepository>,
}

impl DeleteCardHandler {
    pub fn new(cards: Arc<dyn CardRepository>) -> Self {
        Self { cards }
    }

    pub async fn handle(&self, cmd: DeleteCardCommand) -> Result<(), CardError> {
        let card = self
            .cards
            .find_by_id(&cmd.card_id)
            .await?
            .ok_or(CardError::NotFound(cmd.card_id))?;

        if !card.is_owner(&cmd.owner_id) {
            return Err(CardError::unauthorized(cmd.card_id));
        }

        if !self.cards.delete(&cmd.card_id, &cmd.owner_id).await? {
            return Err(CardError::not_found(cmd.card_id));
        }

        tracing::info!(owner_id = %cmd.owner_id, card_id = %cmd.card_id, "card deleted");
        Ok(())
    }
}

/// Command to delete every card an owner has.
#[derive(Debug, Clone)]
pub struct DeleteAllCardsCommand {
    pub owner_id: UserId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteAllCardsResult {
    pub deleted: u64,
}

/// Bulk delete scoped by owner. Needs no ownership check.
pub struct DeleteAllCardsHandler {
    cards: Arc<dyn CardRepository>,
}

impl DeleteAllCardsHandler {
    pub fn new(cards: Arc<dyn CardRepository>) -> Self {
        Self { cards }
    }

    pub async fn handle(
        &self,
        cmd: DeleteAllCardsCommand,
    ) -> Result<DeleteAllCardsResult, CardError> {
        let deleted = self.cards.delete_all_for_owner(&cmd.owner_id).await?;
        tracing::info!(owner_id = %cmd.owner_id, deleted, "all cards deleted");
        Ok(DeleteAllCardsResult { deleted })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemoryCardRepository;
    use crate::domain::card::{Card, CardBrand, CardFacts};
    use crate::domain::foundation::Timestamp;

    fn owner(id: &str) -> UserId {
        UserId::new(id).unwrap()
    }

    async fn stored_card(repo: &InMemoryCardRepository, owner_id: &str, last_four: &str) -> Card {
        let card = Card::register(
            owner(owner_id),
            CardFacts {
                brand: CardBrand::Amex,
                last_four: last_four.to_string(),
            },
            "Ravi Iyer",
            3,
            Timestamp::now().year_month().0 + 2,
        );
        repo.insert(&card).await.unwrap();
        card
    }

    // ════════════════════════════════════════════════════════════════════════════
    // DeleteCard
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn deletes_owned_card() {
        let repo = Arc::new(InMemoryCardRepository::new());
        let card = stored_card(&repo, "user-1", "0009").await;
        let handler = DeleteCardHandler::new(repo.clone());

        handler
            .handle(DeleteCardCommand {
                card_id: card.id,
                owner_id: owner("user-1"),
            })
            .await
            .unwrap();

        assert!(repo.find_by_id(&card.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn refuses_to_delete_foreign_card() {
        let repo = Arc::new(InMemoryCardRepository::new());
        let card = stored_card(&repo, "user-2", "0009").await;
        let handler = DeleteCardHandler::new(repo.clone());

        let err = handler
            .handle(DeleteCardCommand {
                card_id: card.id,
                owner_id: owner("user-1"),
            })
            .await
            .unwrap_err();

        assert_eq!(err, CardError::Unauthorized(card.id));
        assert!(repo.find_by_id(&card.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn deleting_missing_card_is_not_found() {
        let handler = DeleteCardHandler::new(Arc::new(InMemoryCardRepository::new()));
        let missing = CardId::new();

        let err = handler
            .handle(DeleteCardCommand {
                card_id: missing,
                owner_id: owner("user-1"),
            })
            .await
            .unwrap_err();

        assert_eq!(err, CardError::NotFound(missing));
    }

    // ════════════════════════════════════════════════════════════════════════════
    // DeleteAllCards
    // ════════════════════════════════════════════════════════════════════════════

    #[tokio::test]
    async fn deletes_only_the_owners_cards() {
        let repo = Arc::new(InMemoryCardRepository::new());
        stored_card(&repo, "user-1", "0009").await;
        stored_card(&repo, "user-1", "1234").await;
        let other = stored_card(&repo, "user-2", "0009").await;
        let handler = DeleteAllCardsHandler::new(repo.clone());

        let result = handler
            .handle(DeleteAllCardsCommand {
                owner_id: owner("user-1"),
            })
            .await
            .unwrap();

        assert_eq!(result.deleted, 2);
        assert_eq!(repo.len().await, 1);
        assert!(repo.find_by_id(&other.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn deleting_all_with_no_cards_reports_zero() {
        let handler = DeleteAllCardsHandler::new(Arc::new(InMemoryCardRepository::new()));

        let result = handler
            .handle(DeleteAllCardsCommand {
                owner_id: owner("user-1"),
            })
            .await
            .unwrap();

        assert_eq!(result.deleted, 0);
    }
}

//! Card queries. Results only ever carry masked numbers.

use std::sync::Arc;

use crate::domain::card::{CardError, CardView};
use crate::domain::foundation::{CardId, OwnedByUser, UserId};
use crate::ports::CardRepository;

#[derive(Debug, Clone)]
pub struct GetCardQuery {
    pub card_id: CardId,
    pub owner_id: UserId,
}

pub struct GetCardHandler {
    cards: Arc<dyn CardRepository>,
}

impl GetCardHandler {
    pub fn new(cards: Arc<dyn CardRepository>) -> Self {
        Self { cards }
    }

    pub async fn handle(&self, query: GetCardQuery) -> Result<CardView, CardError> {
        let card = self
            .cards
            .find_by_id(&query.card_id)
            .await?
            .ok_or(CardError::NotFound(query.card_id))?;

        if !card.is_owner(&query.owner_id) {
            return Err(CardError::unauthorized(query.card_id));
        }

        Ok(CardView::from(&card))
    }
}

#[derive(Debug, Clone)]
pub struct ListCardsQuery {
    pub owner_id: UserId,
}

/// Lists an owner's cards, default first and then newest first.
pub struct ListCardsHandler {
    cards: Arc<dyn CardRepository>,
}

impl ListCardsHandler {
    pub fn new(cards: Arc<dyn CardRepository>) -> Self {
        Self { cards }
    }

    pub async fn handle(&self, query: ListCardsQuery) -> Result<Vec<CardView>, CardError> {
        let cards = self.cards.find_by_owner(&query.owner_id).await?;
        Ok(cards.iter().map(CardView::from).collect())
    }
}

//! UpdateCardHandler - Command handler for changing a card's holder name and expiry.

use std::sync::Arc;

use crate::domain::card::{validator, CardError, CardView};
use crate::domain::foundation::{CardId, OwnedByUser, Timestamp, UserId};
use crate::ports::CardRepository;

/// Command to update a stored card. Number and brand cannot change.
#[derive(Debug, Clone)]
pub struct UpdateCardCommand {
    pub card_id: CardId,
    pub owner_id: UserId,
    pub holder_name: String,
    pub expiry_month: u32,
    pub expiry_year: i32,
}

#[derive(Debug, Clone)]
pub struct UpdateCardResult {
    pub card: CardView,
}

pub struct UpdateCardHandler {
    cards: Arc<dyn CardRepository>,
}

impl UpdateCardHandler {
    pub fn new(cards: Arc<dyn CardRepository>) -> Self {
        Self { cards }
    }

    pub async fn handle(&self, cmd: UpdateCardCommand) -> Result<UpdateCardResult, CardError> {
        // 1. Find the card and check ownership
        let mut card = self
            .cards
            .find_by_id(&cmd.card_id)
            .await?
            .ok_or(CardError::NotFound(cmd.card_id))?;

        if !card.is_owner(&cmd.owner_id) {
            return Err(CardError::unauthorized(cmd.card_id));
        }

        // 2. Re-validate the mutable fields
        validator::validate_details(
            &cmd.holder_name,
            cmd.expiry_month,
            cmd.expiry_year,
            Timestamp::now(),
        )?;

        // 3. Apply and persist
        card.update_details(cmd.holder_name, cmd.expiry_month, cmd.expiry_year);
        self.cards.update(&card).await?;

        tracing::info!(owner_id = %card.owner_id, card_id = %card.id, "card updated");

        Ok(UpdateCardResult {
            card: CardView::from(&card),
        })
    }
}

//! SetDefaultCardHandler - Makes one card the owner's default.

use std::sync::Arc;

use crate::domain::card::CardError;
use crate::domain::foundation::{CardId, OwnedByUser, UserId};
use crate::ports::CardRepository;

#[derive(Debug, Clone)]
pub struct SetDefaultCardCommand {
    pub owner_id: UserId,
    pub card_id: CardId,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetDefaultCardResult {
    pub card_id: CardId,
}

/// Handler for switching the default card.
///
/// The clear-then-set pair runs inside the repository as one atomic
/// operation, so readers never see zero or two defaults.
pub struct SetDefaultCardHandler {
    cards: Arc<dyn CardRepository>,
}

impl SetDefaultCardHandler {
    pub fn new(cards: Arc<dyn CardRepository>) -> Self {
        Self { cards }
    }

    pub async fn handle(
        &self,
        cmd: SetDefaultCardCommand,
    ) -> Result<SetDefaultCardResult, CardError> {
        // 1. Check existence and ownership up front for precise errors
        let card = self
            .cards
            .find_by_id(&cmd.card_id)
            .await?
            .ok_or(CardError::NotFound(cmd.card_id))?;

        if !card.is_owner(&cmd.owner_id) {
            return Err(CardError::unauthorized(cmd.card_id));
        }

        // 2. Atomic switch. False means the card vanished in between.
        if !self.cards.set_default(&cmd.owner_id, &cmd.card_id).await? {
            return Err(CardError::not_found(cmd.card_id));
        }

        tracing::info!(owner_id = %cmd.owner_id, card_id = %cmd.card_id, "default card changed");

        Ok(SetDefaultCardResult {
            card_id: cmd.card_id,
        })
    }
}

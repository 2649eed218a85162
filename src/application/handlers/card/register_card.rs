//! RegisterCardHandler - Command handler for adding a card to an owner's registry.

use std::sync::Arc;

use crate::domain::card::{validator, Card, CardError, CardView};
use crate::domain::foundation::{ErrorCode, UserId};
use crate::ports::CardRepository;

/// Command to register a new card.
#[derive(Debug, Clone)]
pub struct RegisterCardCommand {
    pub owner_id: UserId,
    /// Full card number as entered. Never stored.
    pub card_number: String,
    pub holder_name: String,
    pub expiry_month: u32,
    pub expiry_year: i32,
}

/// Result of a successful registration.
#[derive(Debug, Clone)]
pub struct RegisterCardResult {
    pub card: CardView,
}

/// Handler for registering cards.
///
/// Registration never makes a card the default; that is always an explicit
/// `SetDefaultCard` call.
pub struct RegisterCardHandler {
    cards: Arc<dyn CardRepository>,
}

impl RegisterCardHandler {
    pub fn new(cards: Arc<dyn CardRepository>) -> Self {
        Self { cards }
    }

    pub async fn handle(&self, cmd: RegisterCardCommand) -> Result<RegisterCardResult, CardError> {
        // 1. Validate number, expiry and holder name
        let facts = validator::validate(
            &cmd.card_number,
            &cmd.holder_name,
            cmd.expiry_month,
            cmd.expiry_year,
        )?;

        // 2. Reject a second card with the same last four digits
        let existing = self.cards.find_by_owner(&cmd.owner_id).await?;
        if existing
            .iter()
            .any(|c| c.last_four_digits == facts.last_four)
        {
            return Err(CardError::duplicate(facts.last_four));
        }

        // 3. Persist. A concurrent duplicate surfaces as a storage conflict.
        let card = Card::register(
            cmd.owner_id,
            facts,
            cmd.holder_name,
            cmd.expiry_month,
            cmd.expiry_year,
        );
        self.cards.insert(&card).await.map_err(|e| {
            if e.code == ErrorCode::Conflict {
                CardError::duplicate(card.last_four_digits.clone())
            } else {
                CardError::from(e)
            }
        })?;

        tracing::info!(
            owner_id = %card.owner_id,
            card_id = %card.id,
            brand = card.brand.as_str(),
            "card registered"
        );

        Ok(RegisterCardResult {
            card: CardView::from(&card),
        })
    }
}

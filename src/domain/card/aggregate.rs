//! Card aggregate entity.
//!
//! A stored card keeps only derived facts. The full number is seen once,
//! during registration, and is dropped after validation.
//!
//! # Invariants
//!
//! - `last_four_digits` is unique per owner
//! - at most one card per owner has `is_default = true`
//! - `brand` and `last_four_digits` never change after creation

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{CardId, OwnedByUser, Timestamp, UserId};

use super::{CardBrand, CardFacts};

/// A payment card registered by a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    pub owner_id: UserId,
    pub brand: CardBrand,
    pub last_four_digits: String,
    pub expiry_month: u32,
    pub expiry_year: i32,
    pub holder_name: String,
    pub is_default: bool,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Card {
    /// Creates a new non-default card from validated facts.
    pub fn register(
        owner_id: UserId,
        facts: CardFacts,
        holder_name: impl Into<String>,
        expiry_month: u32,
        expiry_year: i32,
    ) -> Self {
        let now = Timestamp::now();
        Self {
            id: CardId::new(),
            owner_id,
            brand: facts.brand,
            last_four_digits: facts.last_four,
            expiry_month,
            expiry_year,
            holder_name: holder_name.into().trim().to_string(),
            is_default: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Replaces the mutable details. Number and brand stay as they are.
    pub fn update_details(&mut self, holder_name: impl Into<String>, expiry_month: u32, expiry_year: i32) {
        self.holder_name = holder_name.into().trim().to_string();
        self.expiry_month = expiry_month;
        self.expiry_year = expiry_year;
        self.updated_at = Timestamp::now();
    }

    /// Masked display form, e.g. `****-****-****-1111`.
    pub fn masked_number(&self) -> String {
        format!("****-****-****-{}", self.last_four_digits)
    }
}

impl OwnedByUser for Card {
    fn owner_id(&self) -> &UserId {
        &self.owner_id
    }
}

/// Read model handed to callers outside the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CardView {
    pub id: CardId,
    pub brand: CardBrand,
    pub masked_number: String,
    pub expiry_month: u32,
    pub expiry_year: i32,
    pub holder_name: String,
    pub is_default: bool,
    pub created_at: Timestamp,
}

impl From<&Card> for CardView {
    fn from(card: &Card) -> Self {
        Self {
            id: card.id,
            brand: card.brand,
            masked_number: card.masked_number(),
            expiry_month: card.expiry_month,
            expiry_year: card.expiry_year,
            holder_name: card.holder_name.clone(),
            is_default: card.is_default,
            created_at: card.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_card() -> Card {
        Card::register(
            UserId::new("user-1").unwrap(),
            CardFacts {
                brand: CardBrand::Visa,
                last_four: "1111".to_string(),
            },
            "  Asha Rao ",
            8,
            2028,
        )
    }

    #[test]
    fn register_starts_non_default() {
        let card = test_card();
        assert!(!card.is_default);
        assert_eq!(card.holder_name, "Asha Rao");
        assert_eq!(card.created_at, card.updated_at);
    }

    #[test]
    fn masked_number_shows_only_last_four() {
        assert_eq!(test_card().masked_number(), "****-****-****-1111");
    }

    #[test]
    fn update_details_keeps_number_and_brand() {
        let mut card = test_card();
        card.update_details("A. Rao", 1, 2030);

        assert_eq!(card.holder_name, "A. Rao");
        assert_eq!((card.expiry_month, card.expiry_year), (1, 2030));
        assert_eq!(card.last_four_digits, "1111");
        assert_eq!(card.brand, CardBrand::Visa);
    }

    #[test]
    fn view_never_contains_raw_digits_field() {
        let card = test_card();
        let json = serde_json::to_value(CardView::from(&card)).unwrap();
        assert_eq!(json["masked_number"], "****-****-****-1111");
        assert!(json.get("last_four_digits").is_none());
    }
}

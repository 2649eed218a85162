//! Card handlers.
//!
//! ## Commands
//! - Registering a card (validated, deduplicated by last four digits)
//! - Updating holder name and expiry
//! - Switching the default card
//! - Deleting one card or all of an owner's cards
//!
//! ## Queries
//! - Get one card, list an owner's cards (masked)

mod delete_card;
mod get_cards;
mod register_card;
mod set_default_card;
mod update_card;

// Commands
pub use delete_card::{
    DeleteAllCardsCommand, DeleteAllCardsHandler, DeleteAllCardsResult, DeleteCardCommand,
    DeleteCardHandler,
};
pub use register_card::{RegisterCardCommand, RegisterCardHandler, RegisterCardResult};
pub use set_default_card::{SetDefaultCardCommand, SetDefaultCardHandler, SetDefaultCardResult};
pub use update_card::{UpdateCardCommand, UpdateCardHandler, UpdateCardResult};

// Queries
pub use get_cards::{GetCardHandler, GetCardQuery, ListCardsHandler, ListCardsQuery};

//! Card domain - validation rules and the stored card aggregate.

mod aggregate;
mod brand;
mod errors;
pub mod validator;

pub use aggregate::{Card, CardView};
pub use brand::CardBrand;
pub use errors::CardError;
pub use validator::{is_valid_card_number, CardFacts};

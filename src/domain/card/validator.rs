//! Pure card validation: Luhn checksum, expiry window and holder name.
//!
//! The full card number never leaves this module. Callers receive only the
//! derived [`CardFacts`] (brand and last four digits).

use crate::domain::foundation::Timestamp;

use super::{CardBrand, CardError};

/// Shortest accepted card number.
pub const MIN_CARD_NUMBER_LENGTH: usize = 13;

/// Longest accepted card number.
pub const MAX_CARD_NUMBER_LENGTH: usize = 19;

/// How many years ahead an expiry date may lie.
pub const MAX_EXPIRY_YEARS_AHEAD: i32 = 10;

/// What the registry is allowed to keep about a card number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardFacts {
    pub brand: CardBrand,
    pub last_four: String,
}

/// Validates a card against the current date.
pub fn validate(
    number: &str,
    holder_name: &str,
    expiry_month: u32,
    expiry_year: i32,
) -> Result<CardFacts, CardError> {
    validate_at(number, holder_name, expiry_month, expiry_year, Timestamp::now())
}

/// Validates a card against an explicit "today".
pub fn validate_at(
    number: &str,
    holder_name: &str,
    expiry_month: u32,
    expiry_year: i32,
    today: Timestamp,
) -> Result<CardFacts, CardError> {
    let digits = normalize_number(number).ok_or(CardError::InvalidCardNumber)?;
    if !luhn_checksum_valid(&digits) {
        return Err(CardError::InvalidCardNumber);
    }

    validate_expiry_at(expiry_month, expiry_year, today)?;
    validate_holder_name(holder_name)?;

    let last_four = digits[digits.len() - 4..].to_string();
    Ok(CardFacts {
        brand: CardBrand::classify(&digits),
        last_four,
    })
}

/// Validates the mutable part of a card (used on update).
pub fn validate_details(
    holder_name: &str,
    expiry_month: u32,
    expiry_year: i32,
    today: Timestamp,
) -> Result<(), CardError> {
    validate_expiry_at(expiry_month, expiry_year, today)?;
    validate_holder_name(holder_name)
}

/// Returns true if the number is 13-19 digits (after stripping spaces and
/// hyphens) and passes the Luhn checksum.
pub fn is_valid_card_number(number: &str) -> bool {
    normalize_number(number)
        .map(|digits| luhn_checksum_valid(&digits))
        .unwrap_or(false)
}

/// Strips whitespace and hyphens; `None` if anything else is left over or
/// the length is out of range.
pub fn normalize_number(number: &str) -> Option<String> {
    let digits: String = number
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect();

    if digits.len() < MIN_CARD_NUMBER_LENGTH || digits.len() > MAX_CARD_NUMBER_LENGTH {
        return None;
    }
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(digits)
}

fn luhn_checksum_valid(digits: &str) -> bool {
    let sum: u32 = digits
        .bytes()
        .rev()
        .enumerate()
        .map(|(i, b)| {
            let d = u32::from(b - b'0');
            if i % 2 == 1 {
                let doubled = d * 2;
                if doubled > 9 {
                    doubled - 9
                } else {
                    doubled
                }
            } else {
                d
            }
        })
        .sum();
    sum % 10 == 0
}

/// Month must be 1-12, not before the current month, and at most ten years out.
pub fn validate_expiry_at(month: u32, year: i32, today: Timestamp) -> Result<(), CardError> {
    let (current_year, current_month) = today.year_month();

    let valid = (1..=12).contains(&month)
        && year >= current_year
        && !(year == current_year && month < current_month)
        && year <= current_year + MAX_EXPIRY_YEARS_AHEAD;

    if valid {
        Ok(())
    } else {
        Err(CardError::invalid_expiry(month, year))
    }
}

fn validate_holder_name(holder_name: &str) -> Result<(), CardError> {
    if holder_name.trim().is_empty() {
        return Err(CardError::InvalidCardHolderName);
    }
    Ok(())
}

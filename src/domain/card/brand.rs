//! Card network classification by number prefix.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::ValidationError;

/// Card network inferred from the number prefix and length.
///
/// Classification never rejects a card: anything unmatched is `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CardBrand {
    Visa,
    Mastercard,
    Amex,
    Discover,
    Unknown,
}

impl CardBrand {
    /// Classifies a normalized (digits only) card number.
    ///
    /// - `4` followed by 12 or 15 digits is VISA
    /// - `51`-`55` followed by 14 digits is MASTERCARD
    /// - `34` or `37` followed by 13 digits is AMEX
    /// - `6011` or `65xx` followed by 12 digits is DISCOVER
    pub fn classify(digits: &str) -> Self {
        let len = digits.len();
        if !digits.bytes().all(|b| b.is_ascii_digit()) {
            return CardBrand::Unknown;
        }

        if digits.starts_with('4') && (len == 13 || len == 16) {
            return CardBrand::Visa;
        }

        if len == 16 && matches!(digits.get(..2), Some("51" | "52" | "53" | "54" | "55")) {
            return CardBrand::Mastercard;
        }

        if len == 15 && matches!(digits.get(..2), Some("34" | "37")) {
            return CardBrand::Amex;
        }

        if len == 16 && (digits.starts_with("6011") || digits.starts_with("65")) {
            return CardBrand::Discover;
        }

        CardBrand::Unknown
    }

    /// Stable storage representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            CardBrand::Visa => "VISA",
            CardBrand::Mastercard => "MASTERCARD",
            CardBrand::Amex => "AMEX",
            CardBrand::Discover => "DISCOVER",
            CardBrand::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for CardBrand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CardBrand {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "VISA" => Ok(CardBrand::Visa),
            "MASTERCARD" => Ok(CardBrand::Mastercard),
            "AMEX" => Ok(CardBrand::Amex),
            "DISCOVER" => Ok(CardBrand::Discover),
            "UNKNOWN" => Ok(CardBrand::Unknown),
            other => Err(ValidationError::invalid_format(
                "brand",
                format!("unknown card brand '{}'", other),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_reference_numbers() {
        assert_eq!(CardBrand::classify("4111111111111111"), CardBrand::Visa);
        assert_eq!(CardBrand::classify("5500000000000004"), CardBrand::Mastercard);
        assert_eq!(CardBrand::classify("340000000000009"), CardBrand::Amex);
        assert_eq!(CardBrand::classify("6011000000000004"), CardBrand::Discover);
        assert_eq!(CardBrand::classify("9999999999999999"), CardBrand::Unknown);
    }

    #[test]
    fn visa_accepts_thirteen_digits() {
        assert_eq!(CardBrand::classify("4222222222222"), CardBrand::Visa);
    }

    #[test]
    fn visa_rejects_other_lengths() {
        assert_eq!(CardBrand::classify("41111111111111"), CardBrand::Unknown);
    }

    #[test]
    fn mastercard_range_is_51_to_55() {
        assert_eq!(CardBrand::classify("5100000000000008"), CardBrand::Mastercard);
        assert_eq!(CardBrand::classify("5600000000000003"), CardBrand::Unknown);
    }

    #[test]
    fn amex_requires_fifteen_digits() {
        assert_eq!(CardBrand::classify("378282246310005"), CardBrand::Amex);
        assert_eq!(CardBrand::classify("3782822463100050"), CardBrand::Unknown);
    }

    #[test]
    fn discover_accepts_65_prefix() {
        assert_eq!(CardBrand::classify("6500000000000002"), CardBrand::Discover);
    }

    #[test]
    fn brand_round_trips_through_storage_string() {
        for brand in [
            CardBrand::Visa,
            CardBrand::Mastercard,
            CardBrand::Amex,
            CardBrand::Discover,
            CardBrand::Unknown,
        ] {
            assert_eq!(brand.as_str().parse::<CardBrand>().unwrap(), brand);
        }
        assert!("JCB".parse::<CardBrand>().is_err());
    }
}

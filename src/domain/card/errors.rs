//! Card registry error types.

use crate::domain::foundation::{CardId, DomainError, ErrorCode};

/// Errors raised while validating or managing stored cards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CardError {
    /// Number is not 13-19 digits or fails the Luhn checksum.
    InvalidCardNumber,

    /// Month outside 1-12, already expired, or more than ten years out.
    InvalidExpiryDate { month: u32, year: i32 },

    /// Holder name is blank.
    InvalidCardHolderName,

    /// The owner already has a card ending in these digits.
    DuplicateCard { last_four: String },

    /// Card does not exist.
    NotFound(CardId),

    /// Card exists but belongs to someone else.
    Unauthorized(CardId),

    /// Storage failure.
    Infrastructure(String),
}

impl CardError {
    pub fn invalid_expiry(month: u32, year: i32) -> Self {
        CardError::InvalidExpiryDate { month, year }
    }

    pub fn duplicate(last_four: impl Into<String>) -> Self {
        CardError::DuplicateCard {
            last_four: last_four.into(),
        }
    }

    pub fn not_found(id: CardId) -> Self {
        CardError::NotFound(id)
    }

    pub fn unauthorized(id: CardId) -> Self {
        CardError::Unauthorized(id)
    }

    pub fn infrastructure(message: impl Into<String>) -> Self {
        CardError::Infrastructure(message.into())
    }

    /// Returns the error code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            CardError::InvalidCardNumber
            | CardError::InvalidExpiryDate { .. }
            | CardError::InvalidCardHolderName => ErrorCode::ValidationFailed,
            CardError::DuplicateCard { .. } => ErrorCode::Conflict,
            CardError::NotFound(_) => ErrorCode::NotFound,
            CardError::Unauthorized(_) => ErrorCode::Unauthorized,
            CardError::Infrastructure(_) => ErrorCode::DatabaseError,
        }
    }

    /// Returns a user-facing error message.
    pub fn message(&self) -> String {
        match self {
            CardError::InvalidCardNumber => "Invalid card number".to_string(),
            CardError::InvalidExpiryDate { month, year } => {
                format!("Invalid expiry date: {:02}/{}", month, year)
            }
            CardError::InvalidCardHolderName => "Card holder name is required".to_string(),
            CardError::DuplicateCard { last_four } => {
                format!("A card ending in {} is already registered", last_four)
            }
            CardError::NotFound(id) => format!("Card not found: {}", id),
            CardError::Unauthorized(id) => format!("Card {} belongs to another user", id),
            CardError::Infrastructure(msg) => format!("Error: {}", msg),
        }
    }

    /// Returns true if this error should trigger a retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, CardError::Infrastructure(_))
    }
}

impl std::fmt::Display for CardError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for CardError {}

impl From<DomainError> for CardError {
    fn from(err: DomainError) -> Self {
        CardError::Infrastructure(err.to_string())
    }
}

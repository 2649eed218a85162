//! Foundation module - Shared domain primitives.
//!
//! Contains identifiers, timestamps, and error types that form the
//! vocabulary of the billing domain.

mod errors;
mod ids;
mod ownership;
mod timestamp;

pub use errors::{DomainError, ErrorCode, ValidationError};
pub use ids::{CardId, PlanId, ProductId, SubscriptionId, UserId};
pub use ownership::OwnedByUser;
pub use timestamp::Timestamp;

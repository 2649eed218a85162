//! Domain layer - Pure business rules with no I/O.
//!
//! - `foundation` - Identifiers, timestamps, shared errors
//! - `card` - Card validation and the stored card aggregate
//! - `billing` - Subscriptions, plans and gateway webhook events

pub mod billing;
pub mod card;
pub mod foundation;

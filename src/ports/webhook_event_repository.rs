//! WebhookEventRepository port - Tracks gateway webhook deliveries.
//!
//! Gateways redeliver on timeouts and non-2xx responses, and may send the
//! same event twice even after a 2xx. A delivery is claimed before any state
//! changes, so two concurrent copies of one event cannot both apply it.
//!
//! ## Claim lifecycle
//!
//! ```text
//! (none) ──claim──> processing ──complete──> succeeded | ignored
//!                       │
//!                       └──release──> failed ──claim──> processing
//! ```
//!
//! A `processing` claim older than the stale cutoff is treated as abandoned
//! (the worker died) and may be claimed again.

use async_trait::async_trait;
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::{DomainError, Timestamp, ValidationError};

/// Processing state of a delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WebhookEventStatus {
    Processing,
    Succeeded,
    Ignored,
    Failed,
}

impl WebhookEventStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WebhookEventStatus::Processing => "processing",
            WebhookEventStatus::Succeeded => "succeeded",
            WebhookEventStatus::Ignored => "ignored",
            WebhookEventStatus::Failed => "failed",
        }
    }

    /// True once the delivery needs no further attempts.
    pub fn is_final(&self) -> bool {
        matches!(self, WebhookEventStatus::Succeeded | WebhookEventStatus::Ignored)
    }
}

impl fmt::Display for WebhookEventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WebhookEventStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "processing" => Ok(WebhookEventStatus::Processing),
            "succeeded" => Ok(WebhookEventStatus::Succeeded),
            "ignored" => Ok(WebhookEventStatus::Ignored),
            "failed" => Ok(WebhookEventStatus::Failed),
            other => Err(ValidationError::invalid_format(
                "webhook_event_status",
                format!("unknown status '{}'", other),
            )),
        }
    }
}

/// Record of a webhook delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookEventRecord {
    /// Idempotency key (gateway event id or body hash).
    pub event_id: String,

    /// Gateway event name (e.g. "subscription.charged").
    pub event_type: String,

    pub status: WebhookEventStatus,

    /// When the current claim was taken.
    pub claimed_at: Timestamp,

    /// When processing finished, for final states.
    pub completed_at: Option<Timestamp>,

    /// Ignore reason or last failure message.
    pub message: Option<String>,
}

impl WebhookEventRecord {
    /// Creates a fresh claim.
    pub fn claim(event_id: impl Into<String>, event_type: impl Into<String>) -> Self {
        Self {
            event_id: event_id.into(),
            event_type: event_type.into(),
            status: WebhookEventStatus::Processing,
            claimed_at: Timestamp::now(),
            completed_at: None,
            message: None,
        }
    }

    /// Decides what a new claim attempt on this existing record yields.
    pub fn claim_outcome(&self, stale_before: Timestamp) -> ClaimResult {
        match self.status {
            WebhookEventStatus::Succeeded | WebhookEventStatus::Ignored => {
                ClaimResult::AlreadyProcessed
            }
            WebhookEventStatus::Failed => ClaimResult::Claimed,
            WebhookEventStatus::Processing if self.claimed_at.is_before(&stale_before) => {
                ClaimResult::Claimed
            }
            WebhookEventStatus::Processing => ClaimResult::InFlight,
        }
    }
}

/// Result of attempting to claim a delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClaimResult {
    /// This worker owns the delivery and must complete or release it.
    Claimed,
    /// A previous delivery of this event already finished.
    AlreadyProcessed,
    /// Another worker holds a live claim.
    InFlight,
}

/// Port for storing webhook delivery state.
///
/// Implementations must make `try_claim` atomic per `event_id` (a primary key
/// plus conditional upsert in SQL, a single lock in memory).
#[async_trait]
pub trait WebhookEventRepository: Send + Sync {
    /// Attempts to claim a delivery for processing.
    ///
    /// Claims older than `stale_before` are considered abandoned.
    async fn try_claim(
        &self,
        event_id: &str,
        event_type: &str,
        stale_before: Timestamp,
    ) -> Result<ClaimResult, DomainError>;

    /// Marks a claimed delivery as finished (`Succeeded` or `Ignored`).
    async fn complete(
        &self,
        event_id: &str,
        status: WebhookEventStatus,
        message: Option<&str>,
    ) -> Result<(), DomainError>;

    /// Releases a claim after a failed attempt so a redelivery can retry.
    async fn release(&self, event_id: &str, error: &str) -> Result<(), DomainError>;

    /// Find a delivery record by its key.
    async fn find_by_event_id(
        &self,
        event_id: &str,
    ) -> Result<Option<WebhookEventRecord>, DomainError>;

    /// Delete records claimed before the given time. Returns the count.
    async fn delete_before(&self, before: Timestamp) -> Result<u64, DomainError>;
}

/// Result of webhook processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookResult {
    /// Event was applied.
    Processed,
    /// Event was acknowledged without changes.
    Ignored,
    /// Event was already processed (idempotent skip).
    AlreadyProcessed,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn record(status: WebhookEventStatus) -> WebhookEventRecord {
        WebhookEventRecord {
            status,
            ..WebhookEventRecord::claim("evt_1", "subscription.charged")
        }
    }

    #[test]
    fn new_claim_is_processing() {
        let record = WebhookEventRecord::claim("evt_1", "payment.authorized");
        assert_eq!(record.status, WebhookEventStatus::Processing);
        assert!(record.completed_at.is_none());
    }

    #[test]
    fn final_records_are_already_processed() {
        let cutoff = Timestamp::now().minus(Duration::minutes(5));
        assert_eq!(
            record(WebhookEventStatus::Succeeded).claim_outcome(cutoff),
            ClaimResult::AlreadyProcessed
        );
        assert_eq!(
            record(WebhookEventStatus::Ignored).claim_outcome(cutoff),
            ClaimResult::AlreadyProcessed
        );
    }

    #[test]
    fn failed_records_can_be_reclaimed() {
        let cutoff = Timestamp::now().minus(Duration::minutes(5));
        assert_eq!(
            record(WebhookEventStatus::Failed).claim_outcome(cutoff),
            ClaimResult::Claimed
        );
    }

    #[test]
    fn live_claim_is_in_flight() {
        let cutoff = Timestamp::now().minus(Duration::minutes(5));
        assert_eq!(
            record(WebhookEventStatus::Processing).claim_outcome(cutoff),
            ClaimResult::InFlight
        );
    }

    #[test]
    fn stale_claim_can_be_taken_over() {
        let mut stale = record(WebhookEventStatus::Processing);
        stale.claimed_at = Timestamp::now().minus(Duration::minutes(30));
        let cutoff = Timestamp::now().minus(Duration::minutes(5));

        assert_eq!(stale.claim_outcome(cutoff), ClaimResult::Claimed);
    }

    #[test]
    fn status_round_trips_through_storage_string() {
        for status in [
            WebhookEventStatus::Processing,
            WebhookEventStatus::Succeeded,
            WebhookEventStatus::Ignored,
            WebhookEventStatus::Failed,
        ] {
            assert_eq!(status.as_str().parse::<WebhookEventStatus>().unwrap(), status);
        }
        assert!("done".parse::<WebhookEventStatus>().is_err());
    }
}

//! PurgeWebhookEventsHandler - Drops finished delivery records past retention.

use std::sync::Arc;

use crate::domain::billing::WebhookError;
use crate::domain::foundation::Timestamp;
use crate::ports::WebhookEventRepository;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurgeWebhookEventsResult {
    pub deleted: u64,
    pub cutoff: Timestamp,
}

/// Deletes finished records claimed longer ago than the retention window.
///
/// Unfinished and failed records are kept so redeliveries still find them.
pub struct PurgeWebhookEventsHandler {
    events: Arc<dyn WebhookEventRepository>,
    retention: chrono::Duration,
}

impl PurgeWebhookEventsHandler {
    pub fn new(events: Arc<dyn WebhookEventRepository>, retention: chrono::Duration) -> Self {
        Self { events, retention }
    }

    pub async fn handle(&self) -> Result<PurgeWebhookEventsResult, WebhookError> {
        let cutoff = Timestamp::now().minus(self.retention);
        let deleted = self.events.delete_before(cutoff).await?;
        tracing::info!(deleted, cutoff = %cutoff.as_datetime(), "purged webhook event records");
        Ok(PurgeWebhookEventsResult { deleted, cutoff })
    }
}

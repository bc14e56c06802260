#![allow(async_fn_in_trait)]

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::types::{Email, Outcome, PendingEvent};
use crate::error::MailerError;

/// Read and settle rows of the `outbox_events` table.
pub trait OutboxRepository: Send + Sync {
    /// Unsettled events whose `next_attempt_at` has passed, oldest first.
    async fn fetch_due(
        &self,
        now: DateTime<Utc>,
        limit: u64,
    ) -> Result<Vec<PendingEvent>, MailerError>;

    async fn record(
        &self,
        id: Uuid,
        outcome: &Outcome,
        now: DateTime<Utc>,
    ) -> Result<(), MailerError>;
}

pub trait EmailSender: Send + Sync {
    async fn send(&self, email: &Email) -> Result<(), MailerError>;
}

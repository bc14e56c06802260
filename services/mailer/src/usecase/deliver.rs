use chrono::{DateTime, Duration, Utc};

use crate::domain::message::compose;
use crate::domain::repository::{EmailSender, OutboxRepository};
use crate::domain::types::{Outcome, PendingEvent};
use crate::error::MailerError;

pub const MAX_RETRY_DELAY_SECS: i64 = 300;

/// `2^attempts` seconds, capped at [`MAX_RETRY_DELAY_SECS`].
pub fn retry_delay(attempts: i32) -> Duration {
    let secs = u32::try_from(attempts)
        .ok()
        .and_then(|n| 2i64.checked_pow(n))
        .map_or(MAX_RETRY_DELAY_SECS, |s| s.min(MAX_RETRY_DELAY_SECS));
    Duration::seconds(secs)
}

// ── DeliverEvent ─────────────────────────────────────────────────────────────

pub struct DeliverEventUseCase<S: EmailSender> {
    pub sender: S,
    pub from_email: String,
    pub max_attempts: i32,
}

impl<S: EmailSender> DeliverEventUseCase<S> {
    /// One delivery attempt. Never fails; the error goes into the outcome.
    pub async fn execute(&self, event: &PendingEvent, now: DateTime<Utc>) -> Outcome {
        let result = match compose(event, &self.from_email) {
            Ok(email) => self.sender.send(&email).await,
            Err(e) => Err(e),
        };
        let Err(e) = result else {
            return Outcome::Sent;
        };

        let attempts = event.attempts + 1;
        let error = e.to_string();
        if e.is_permanent() || attempts >= self.max_attempts {
            tracing::error!(event_id = %event.id, kind = %event.kind, attempts, error = %e, "outbox event failed");
            Outcome::Failed { attempts, error }
        } else {
            let next_attempt_at = now + retry_delay(attempts);
            tracing::warn!(
                event_id = %event.id,
                attempts,
                %next_attempt_at,
                error = %e,
                "outbox event delivery failed, will retry"
            );
            Outcome::Retry {
                attempts,
                error,
                next_attempt_at,
            }
        }
    }
}

// ── DrainOutbox ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainReport {
    pub sent: usize,
    pub retried: usize,
    pub failed: usize,
}

impl DrainReport {
    pub fn total(&self) -> usize {
        self.sent + self.retried + self.failed
    }
}

pub struct DrainOutboxUseCase<R: OutboxRepository, S: EmailSender> {
    pub repo: R,
    pub deliver: DeliverEventUseCase<S>,
    pub batch_size: u64,
}

impl<R: OutboxRepository, S: EmailSender> DrainOutboxUseCase<R, S> {
    /// Attempt every due event in one batch and record each outcome.
    pub async fn execute(&self, now: DateTime<Utc>) -> Result<DrainReport, MailerError> {
        let events = self.repo.fetch_due(now, self.batch_size).await?;
        let mut report = DrainReport::default();
        for event in &events {
            let outcome = self.deliver.execute(event, now).await;
            match outcome {
                Outcome::Sent => {
                    tracing::info!(event_id = %event.id, kind = %event.kind, "outbox event delivered");
                    report.sent += 1;
                }
                Outcome::Retry { .. } => report.retried += 1,
                Outcome::Failed { .. } => report.failed += 1,
            }
            self.repo.record(event.id, &outcome, now).await?;
        }
        Ok(report)
    }
}

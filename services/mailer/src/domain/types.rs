use chrono::{DateTime, Utc};
use uuid::Uuid;

/// An outbox row that is due for delivery.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingEvent {
    pub id: Uuid,
    pub kind: String,
    pub payload: serde_json::Value,
    pub attempts: i32,
    pub created_at: DateTime<Utc>,
}

/// A plain-text email ready to hand to a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// What to record after one delivery attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Sent,
    Retry {
        attempts: i32,
        error: String,
        next_attempt_at: DateTime<Utc>,
    },
    Failed {
        attempts: i32,
        error: String,
    },
}

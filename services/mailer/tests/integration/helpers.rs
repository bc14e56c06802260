#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use shop_mailer::domain::repository::{EmailSender, OutboxRepository};
use shop_mailer::domain::types::{Email, Outcome, PendingEvent};
use shop_mailer::error::MailerError;
use shop_mailer::usecase::deliver::{DeliverEventUseCase, DrainOutboxUseCase};

pub const FROM: &str = "shop@example.com";

pub fn confirmation(email: &str, attempts: i32) -> PendingEvent {
    PendingEvent {
        id: Uuid::now_v7(),
        kind: "order_confirmation".to_owned(),
        payload: serde_json::json!({
            "order_id": Uuid::new_v4().to_string(),
            "email": email,
        }),
        attempts,
        created_at: Utc::now(),
    }
}

// ── MockOutboxRepo ───────────────────────────────────────────────────────────

/// Serves `events` once each; a recorded event is no longer due.
#[derive(Clone, Default)]
pub struct MockOutboxRepo {
    pub events: Arc<Mutex<Vec<PendingEvent>>>,
    pub outcomes: Arc<Mutex<Vec<(Uuid, Outcome)>>>,
}

impl MockOutboxRepo {
    pub fn new(events: Vec<PendingEvent>) -> Self {
        Self {
            events: Arc::new(Mutex::new(events)),
            outcomes: Arc::default(),
        }
    }

    pub fn outcomes_handle(&self) -> Arc<Mutex<Vec<(Uuid, Outcome)>>> {
        Arc::clone(&self.outcomes)
    }
}

impl OutboxRepository for MockOutboxRepo {
    async fn fetch_due(
        &self,
        _now: DateTime<Utc>,
        limit: u64,
    ) -> Result<Vec<PendingEvent>, MailerError> {
        let recorded: Vec<Uuid> = self.outcomes.lock().unwrap().iter().map(|(id, _)| *id).collect();
        Ok(self
            .events
            .lock()
            .unwrap()
            .iter()
            .filter(|e| !recorded.contains(&e.id))
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn record(
        &self,
        id: Uuid,
        outcome: &Outcome,
        _now: DateTime<Utc>,
    ) -> Result<(), MailerError> {
        self.outcomes.lock().unwrap().push((id, outcome.clone()));
        Ok(())
    }
}

// ── MockSender ───────────────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct MockSender {
    pub sent: Arc<Mutex<Vec<Email>>>,
    /// When set, every send fails with a transport error carrying this text.
    pub failure: Option<String>,
}

impl MockSender {
    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_owned()),
            ..Default::default()
        }
    }

    pub fn sent_handle(&self) -> Arc<Mutex<Vec<Email>>> {
        Arc::clone(&self.sent)
    }
}

impl EmailSender for MockSender {
    async fn send(&self, email: &Email) -> Result<(), MailerError> {
        if let Some(message) = &self.failure {
            return Err(MailerError::Transport(message.clone()));
        }
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}

pub fn drain<R: OutboxRepository>(
    repo: R,
    sender: MockSender,
    batch_size: u64,
) -> DrainOutboxUseCase<R, MockSender> {
    DrainOutboxUseCase {
        repo,
        deliver: DeliverEventUseCase {
            sender,
            from_email: FROM.to_owned(),
            max_attempts: 5,
        },
        batch_size,
    }
}

//! Polling loop around [`DrainOutboxUseCase`].

use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;

use crate::domain::repository::{EmailSender, OutboxRepository};
use crate::usecase::deliver::DrainOutboxUseCase;

pub struct Worker<R: OutboxRepository, S: EmailSender> {
    pub drain: DrainOutboxUseCase<R, S>,
    pub poll_interval: Duration,
}

impl<R: OutboxRepository, S: EmailSender> Worker<R, S> {
    /// Drain the outbox until `shutdown` turns `true` or its sender is dropped.
    /// A full batch is followed immediately by the next one.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        tracing::info!(
            poll_interval_ms = self.poll_interval.as_millis() as u64,
            batch_size = self.drain.batch_size,
            "mailer worker started"
        );
        loop {
            if *shutdown.borrow() {
                break;
            }

            let busy = match self.drain.execute(Utc::now()).await {
                Ok(report) => {
                    if report.total() > 0 {
                        tracing::debug!(
                            sent = report.sent,
                            retried = report.retried,
                            failed = report.failed,
                            "outbox batch drained"
                        );
                    }
                    report.total() as u64 >= self.drain.batch_size
                }
                Err(e) => {
                    tracing::error!(error = ?e, "outbox drain failed");
                    false
                }
            };
            if busy {
                continue;
            }

            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                () = tokio::time::sleep(self.poll_interval) => {}
            }
        }
        tracing::info!("mailer worker stopped");
    }
}

use anyhow::Context as _;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, QuerySelect};
use uuid::Uuid;

use shop_schema::outbox_events;

use crate::domain::repository::OutboxRepository;
use crate::domain::types::{Outcome, PendingEvent};
use crate::error::MailerError;

#[derive(Clone)]
pub struct DbOutboxRepository {
    pub db: DatabaseConnection,
}

impl OutboxRepository for DbOutboxRepository {
    async fn fetch_due(
        &self,
        now: DateTime<Utc>,
        limit: u64,
    ) -> Result<Vec<PendingEvent>, MailerError> {
        let models = outbox_events::Entity::find()
            .filter(outbox_events::Column::ProcessedAt.is_null())
            .filter(outbox_events::Column::FailedAt.is_null())
            .filter(outbox_events::Column::NextAttemptAt.lte(now))
            .order_by_asc(outbox_events::Column::CreatedAt)
            .order_by_asc(outbox_events::Column::Id)
            .limit(limit)
            .all(&self.db)
            .await
            .context("fetch due outbox events")?;
        Ok(models.into_iter().map(event_from_model).collect())
    }

    async fn record(
        &self,
        id: Uuid,
        outcome: &Outcome,
        now: DateTime<Utc>,
    ) -> Result<(), MailerError> {
        let update = outbox_events::Entity::update_many().filter(outbox_events::Column::Id.eq(id));
        let update = match outcome {
            Outcome::Sent => update
                .col_expr(outbox_events::Column::ProcessedAt, Expr::value(now))
                .col_expr(
                    outbox_events::Column::LastError,
                    Expr::value(Option::<String>::None),
                ),
            Outcome::Retry {
                attempts,
                error,
                next_attempt_at,
            } => update
                .col_expr(outbox_events::Column::Attempts, Expr::value(*attempts))
                .col_expr(
                    outbox_events::Column::LastError,
                    Expr::value(Some(error.clone())),
                )
                .col_expr(
                    outbox_events::Column::NextAttemptAt,
                    Expr::value(*next_attempt_at),
                ),
            Outcome::Failed { attempts, error } => update
                .col_expr(outbox_events::Column::Attempts, Expr::value(*attempts))
                .col_expr(
                    outbox_events::Column::LastError,
                    Expr::value(Some(error.clone())),
                )
                .col_expr(outbox_events::Column::FailedAt, Expr::value(now)),
        };
        let result = update
            .exec(&self.db)
            .await
            .with_context(|| format!("record outcome of outbox event {id}"))?;
        if result.rows_affected == 0 {
            tracing::warn!(event_id = %id, "outbox event vanished before its outcome was recorded");
        }
        Ok(())
    }
}

fn event_from_model(m: outbox_events::Model) -> PendingEvent {
    PendingEvent {
        id: m.id,
        kind: m.kind,
        payload: m.payload,
        attempts: m.attempts,
        created_at: m.created_at,
    }
}

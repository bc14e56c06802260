use std::time::Duration;

use anyhow::Context as _;
use sea_orm::Database;
use tokio::sync::watch;

use shop_core::config::Config;
use shop_core::shutdown::shutdown_signal;
use shop_core::tracing::init_tracing;
use shop_mailer::config::{EmailBackend, MailerConfig};
use shop_mailer::infra::db::DbOutboxRepository;
use shop_mailer::infra::sender::{ConsoleSender, SmtpSender, Transport};
use shop_mailer::usecase::deliver::{DeliverEventUseCase, DrainOutboxUseCase};
use shop_mailer::worker::Worker;

fn transport(config: &MailerConfig) -> anyhow::Result<Transport> {
    match config.email_backend {
        EmailBackend::Console => Ok(Transport::Console(ConsoleSender)),
        EmailBackend::Smtp => {
            let host = config
                .smtp_host
                .as_deref()
                .context("SMTP_HOST is required with EMAIL_BACKEND=smtp")?;
            let sender = SmtpSender::new(
                host,
                config.smtp_port,
                config.smtp_username.clone(),
                config.smtp_password.clone(),
            )?;
            Ok(Transport::Smtp(sender))
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing("info,sqlx=warn");

    let config = MailerConfig::from_env().context("read configuration from environment")?;
    let db = Database::connect(&config.database_url)
        .await
        .context("connect to database")?;

    let worker = Worker {
        drain: DrainOutboxUseCase {
            repo: DbOutboxRepository { db },
            deliver: DeliverEventUseCase {
                sender: transport(&config)?,
                from_email: config.default_from_email.clone(),
                max_attempts: config.mailer_max_attempts.max(1),
            },
            batch_size: config.mailer_batch_size.max(1),
        },
        poll_interval: Duration::from_millis(config.mailer_poll_interval_ms),
    };

    let (tx, rx) = watch::channel(false);
    tokio::spawn(async move {
        shutdown_signal().await;
        let _ = tx.send(true);
    });

    worker.run(rx).await;
    Ok(())
}
